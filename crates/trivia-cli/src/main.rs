//! Console client for the trivia game server.
//!
//! Connects over WebSocket, performs the handshake, then sends one command
//! per menu selection and prints the server's response.

use std::process::ExitCode;

use pico_args::Arguments;
use tokio::io::BufReader;
use trivia_client::prelude::*;

mod console;
mod logging;

use console::{ConsoleSource, PrintSink};

const HELP: &str = "\
Play trivia from the terminal

USAGE:
  trivia [OPTIONS]

OPTIONS:
  --endpoint URL        Server URL  [env: TRIVIA_ENDPOINT] [default: ws://localhost:8080]
  --key KEY             Shared server key  [env: TRIVIA_KEY]

FLAGS:
  -h, --help            Print help information

ENVIRONMENT:
  TRIVIA_HANDSHAKE_TIMEOUT_SECS   Seconds to wait for the welcome  [default: 3]
  TRIVIA_RESPONSE_TIMEOUT_SECS    Seconds to wait for each response  [default: no limit]
  RUST_LOG                        Log filter  [default: info]
";

#[tokio::main]
async fn main() -> ExitCode {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return ExitCode::SUCCESS;
    }

    let overrides = match parse_overrides(&mut pargs) {
        Ok(overrides) => overrides,
        Err(e) => {
            eprintln!("error [ArgumentError]: {e}");
            eprintln!("run with --help for usage");
            return ExitCode::FAILURE;
        }
    };

    logging::init();

    let unused = pargs.finish();
    if !unused.is_empty() {
        tracing::warn!(?unused, "ignoring unrecognized arguments");
    }

    match play(overrides).await {
        Ok(summary) => {
            println!(
                "bye: {} exchanges, {} rejected, {} notices, {} dropped",
                summary.exchanges, summary.rejected, summary.notices, summary.dropped
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error [{}]: {e}", e.kind());
            ExitCode::FAILURE
        }
    }
}

fn parse_overrides(pargs: &mut Arguments) -> Result<Overrides, pico_args::Error> {
    Ok(Overrides {
        endpoint: pargs.opt_value_from_str("--endpoint")?,
        key: pargs.opt_value_from_str("--key")?,
    })
}

async fn play(overrides: Overrides) -> Result<DispatchSummary, ClientError> {
    let config = ClientConfig::from_env(overrides)?;
    tracing::debug!(?config, "configuration loaded");

    let session = connect(&config).await?;
    println!("connected to {}", config.endpoint);

    let mut source = ConsoleSource::new(BufReader::new(tokio::io::stdin()), std::io::stdout());
    let mut sink = PrintSink::new(std::io::stdout());
    run(session, &mut source, &mut sink).await
}
