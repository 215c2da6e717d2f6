use clap::Parser;
use env_logger::Env;
use log::{error, info};
use miette::{IntoDiagnostic, Result};
use std::time::Duration;
use threatwatch_server::{Cli, Session, VERSION};
use tokio_graceful_shutdown::Toplevel;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(&args);

    info!("threatwatch {} starting", VERSION);

    let session = match Session::new(args) {
        Ok(session) => session,
        Err(e) => {
            error!("{}", e);
            return Err(e).into_diagnostic();
        }
    };

    Toplevel::new(|s| async move {
        if let Err(e) = session.start(&s) {
            error!("Failed to start: {}", e);
            s.request_shutdown();
        }
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_secs(5))
    .await
    .into_diagnostic()
}

/// `RUST_LOG` wins; otherwise `-v`/`-q` pick the level
fn init_logging(args: &Cli) {
    let mut builder = env_logger::Builder::from_env(Env::default());
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(args.verbose.log_level_filter());
    }
    builder.format_timestamp_millis().init();
}
