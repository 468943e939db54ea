use std::ops::ControlFlow;

use aprskiss_ax25::decode_frame;
use aprskiss_kiss::KissError;
use aprskiss_session::{SessionError, TncSession};

use crate::cmd::{install_ctrlc_handler, ListenArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_frame, print_payload, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let link = args.link.link_config()?;
    let config = args.link.session_config()?;
    let mut session =
        TncSession::open(&link, config).map_err(|err| session_error("open failed", err))?;
    install_ctrlc_handler(session.stop_handle())?;

    let endpoint = session.endpoint().to_string();
    let mut printed = 0usize;
    let result = session.run_payloads(|payload| {
        match decode_frame(&payload) {
            Some(frame) => print_frame(&frame, &endpoint, format),
            None if args.raw_kiss => print_payload(&payload, &endpoint, format),
            None => {
                tracing::debug!(len = payload.len(), "skipping undecodable payload");
                return ControlFlow::Continue(());
            }
        }
        printed = printed.saturating_add(1);
        match args.count {
            Some(count) if printed >= count => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    });

    match result {
        Ok(()) => session
            .close()
            .map_err(|err| session_error("close failed", err))?,
        Err(SessionError::Kiss(KissError::ConnectionClosed)) => {
            tracing::info!(endpoint = %endpoint, printed, "tnc closed the link");
        }
        Err(err) => return Err(session_error("receive failed", err)),
    }
    Ok(SUCCESS)
}
