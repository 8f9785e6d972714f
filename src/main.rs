use clap::Parser;
use eyre::Result;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod config;
mod errors;
mod graph;
mod request;
mod route_log;

use request::ConversionRequest;
use route_log::{RouteLogger, RouteRecord};

#[derive(Parser)]
#[command(name = "fx-router")]
#[command(about = "Best-rate currency conversion router", long_about = None)]
struct Cli {
    /// Path to the conversion request file (prompted for when omitted)
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let logger = RouteLogger::from_env();

    match cli.file {
        Some(path) => match process_request(&path, logger.as_ref()) {
            Ok(amount) => {
                println!("{}", amount);
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => run_interactive(logger.as_ref()),
    }
}

/// Read, parse and compute one request file, logging the winning route
/// when a route log is configured.
fn process_request(path: &Path, logger: Option<&RouteLogger>) -> errors::Result<i64> {
    let text = std::fs::read_to_string(path)?;
    let request = ConversionRequest::parse(&text)?;

    let source = request.source().to_string();
    let target = request.target().to_string();
    let amount_in = request.amount();

    let route = request.best_route()?;
    if let Some(logger) = logger {
        logger.log_route(&RouteRecord::new(&source, &target, amount_in, &route));
    }
    Ok(route.rounded)
}

/// Prompt-driven loop: ask for a request file, print the result or the
/// error, offer to go again.
fn run_interactive(logger: Option<&RouteLogger>) -> Result<()> {
    let stdin = io::stdin();
    loop {
        let Some(path) = prompt_for_path(&stdin)? else {
            break;
        };

        match process_request(&path, logger) {
            Ok(amount) => println!("{}", amount),
            Err(e) => eprintln!("{}", e),
        }

        println!("Press y to quit, or any other key to run another request.");
        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer)? == 0 || answer.trim().eq_ignore_ascii_case("y") {
            break;
        }
    }
    Ok(())
}

/// Ask for a file path until an existing file is named. Returns None on
/// end of input.
fn prompt_for_path(stdin: &io::Stdin) -> Result<Option<PathBuf>> {
    loop {
        print!("Path to the conversion request file: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let trimmed = line.trim();
        if !trimmed.is_empty() && Path::new(trimmed).is_file() {
            return Ok(Some(PathBuf::from(trimmed)));
        }
        eprintln!("The file path is not valid.");
    }
}
