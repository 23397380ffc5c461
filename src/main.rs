use clap::Parser;
use console::style;
use metascope::app;
use metascope::cli::Args;
use metascope::config::Settings;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    let result = Settings::from_args(args)
        .map_err(anyhow::Error::from)
        .and_then(app::run);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error:#}", style("Error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(args: &Args) {
    let level = if args.debug {
        "metascope=debug"
    } else if args.verbose {
        "metascope=info"
    } else {
        "metascope=warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!args.no_color)
                .with_target(false),
        )
        .init();
}
