use aprskiss_ax25::Frame;
use aprskiss_session::TncSession;

use crate::cmd::SendArgs;
use crate::exit::{ax25_error, session_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: SendArgs, _format: OutputFormat) -> CliResult<i32> {
    let frame = Frame::parse_tnc2(&args.frame).map_err(|err| ax25_error("invalid frame", err))?;
    // Encode before opening so a bad frame never touches the TNC.
    let encoded = frame
        .encode()
        .map_err(|err| ax25_error("invalid frame", err))?;

    let link = args.link.link_config()?;
    let config = args.link.session_config()?;
    let session =
        TncSession::open(&link, config).map_err(|err| session_error("open failed", err))?;

    session
        .write_bytes(&encoded)
        .map_err(|err| session_error("send failed", err))?;
    tracing::info!(endpoint = %session.endpoint(), frame = %frame, "frame sent");

    session
        .close()
        .map_err(|err| session_error("close failed", err))?;
    Ok(SUCCESS)
}
