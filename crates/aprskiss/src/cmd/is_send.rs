use aprskiss_aprsis::{AprsIsClient, Protocol};
use aprskiss_ax25::Frame;

use crate::cmd::IsSendArgs;
use crate::exit::{aprsis_error, ax25_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_submit, OutputFormat};

pub fn run(args: IsSendArgs, format: OutputFormat) -> CliResult<i32> {
    let protocol: Protocol = args
        .protocol
        .parse()
        .map_err(|err| aprsis_error("invalid --protocol", err))?;
    let frame = Frame::parse_tnc2(&args.frame).map_err(|err| ax25_error("invalid frame", err))?;

    let mut config = args.is.client_config();
    if let Some(port) = args.udp_port {
        config.udp_port = port;
    }
    if let Some(url) = &args.http_url {
        config.http_url = url.clone();
    }
    let mut client = AprsIsClient::new(config);

    if protocol == Protocol::Tcp {
        client
            .connect(None, None, None)
            .map_err(|err| aprsis_error("connect failed", err))?;
    }
    let accepted = client
        .send(&frame, protocol)
        .map_err(|err| aprsis_error("send failed", err))?;
    client
        .close()
        .map_err(|err| aprsis_error("close failed", err))?;

    print_submit(&protocol.to_string(), accepted, &frame.to_tnc2(), format);
    if accepted {
        Ok(SUCCESS)
    } else {
        tracing::warn!(%protocol, "submission was not accepted");
        Ok(FAILURE)
    }
}
