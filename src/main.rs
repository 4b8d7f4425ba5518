use color_eyre::Result;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobfeed::cli::{
    parse_args, print_usage, resolve_config, run_generation, version_line, CliCommand, RunArgs,
    EXIT_FAILED,
};
use jobfeed::client::GenerationClient;
use jobfeed::config::FeedConfig;

fn main() -> Result<()> {
    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            let _ = print_usage(std::io::stderr());
            std::process::exit(2);
        }
    };

    let args = match command {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        CliCommand::Help => {
            print_usage(std::io::stdout())?;
            return Ok(());
        }
        CliCommand::Run(args) => args,
    };

    color_eyre::install()?;
    init_tracing(args.verbose);

    let runtime = tokio::runtime::Runtime::new()?;
    let code = runtime.block_on(run(args))?;
    std::process::exit(code);
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: RunArgs) -> Result<i32> {
    let config = resolve_config(&args, FeedConfig::from_env());
    tracing::debug!(
        url = %config.stream_url(),
        idle_timeout = ?config.idle_timeout,
        "Resolved config"
    );

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())?;

    let client = match GenerationClient::new(config.clone()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            return Ok(EXIT_FAILED);
        }
    };

    match run_generation(&client, &args, &config, cancel, std::io::stdout()).await {
        Ok(code) => Ok(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            Ok(EXIT_FAILED)
        }
    }
}
