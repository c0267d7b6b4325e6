use clap::Parser;
use ofc_bootstrap::commands::{BootstrapArgs, handle_bootstrap_command};
use std::process::ExitCode;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

fn main() -> ExitCode {
    // 🤓 clap exits with 2 on usage errors; this tool promises 1
    let args = match BootstrapArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = u8::from(err.use_stderr());
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    init_logging(args.verbose);

    match handle_bootstrap_command(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("❌ {err:#}");
            ExitCode::FAILURE
        }
    }
}
