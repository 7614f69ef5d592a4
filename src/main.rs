use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use fusenet::args::{ClientArgs, Cli, Mode, ServerArgs};
use fusenet::logging::{init_client_logging, init_logging};
use fusenet::runtime::{build_runtime, load_server_config, log_config, run_server};
use fusenet::types::MaxStringLength;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.mode {
        Mode::Server(args) => serve(&args),
        Mode::Client(args) => request(args),
    }
}

fn serve(args: &ServerArgs) -> Result<ExitCode> {
    let (config, source) = load_server_config(args)?;
    let _guard = init_logging(config.logging.file.as_deref());
    log_config(&config, source, &args.config);

    let rt = build_runtime()?;
    rt.block_on(run_server(config))?;
    info!("Exiting");
    Ok(ExitCode::SUCCESS)
}

fn request(args: ClientArgs) -> Result<ExitCode> {
    init_client_logging();

    let rt = build_runtime()?;
    let outcome = rt.block_on(fusenet::client::run(
        &args.host,
        args.port,
        args.operation.into_request(),
        MaxStringLength::DEFAULT,
    ))?;

    println!("{outcome}");
    if outcome.status().is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
