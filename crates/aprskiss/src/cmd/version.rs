use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("aprskiss {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: aprskiss");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", env!("APRSKISS_BUILD_TARGET"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "rustc: {}",
        option_env!("RUSTC_VERSION").unwrap_or("unknown")
    );
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "features: session={}, aprsis={}, http={}, cli=true",
        cfg!(feature = "session"),
        cfg!(feature = "aprsis"),
        cfg!(feature = "http")
    );
    println!("aprs_is_client_id: {}", aprskiss_aprsis::DEFAULT_CLIENT_ID);

    Ok(SUCCESS)
}
