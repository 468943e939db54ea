use std::ops::ControlFlow;

use aprskiss_aprsis::AprsIsClient;

use crate::cmd::{install_ctrlc_handler, IsListenArgs};
use crate::exit::{aprsis_error, CliResult, SUCCESS};
use crate::output::{print_line, OutputFormat};

pub fn run(args: IsListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.is.client_config();
    let server = format!("{}:{}", config.server, config.port);
    let mut client = AprsIsClient::new(config);
    client
        .connect(None, None, args.filter.as_deref())
        .map_err(|err| aprsis_error("connect failed", err))?;
    install_ctrlc_handler(client.stop_handle())?;

    let mut printed = 0usize;
    client
        .receive(|line| {
            print_line(line, &server, format);
            printed = printed.saturating_add(1);
            match args.count {
                Some(count) if printed >= count => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        })
        .map_err(|err| aprsis_error("receive failed", err))?;

    tracing::info!(lines = printed, "aprs-is listen finished");
    client
        .close()
        .map_err(|err| aprsis_error("close failed", err))?;
    Ok(SUCCESS)
}
