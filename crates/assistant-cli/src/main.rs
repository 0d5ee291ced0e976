mod cli;
mod commands;
mod offline;

use cli::{CliError, Command};
use shared::config::load_dotenv;

#[tokio::main]
async fn main() {
    if let Err(err) = load_dotenv() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "assistant_cli=info,shared=warn".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(CliError::HelpRequested) => {
            print_usage();
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(err) = commands::run(command).await {
        eprintln!("assistant-cli failed: {err}");
        std::process::exit(1);
    }
}

fn print_usage() {
    eprintln!(
        "Usage: cargo run -p assistant-cli -- <command> [options]\n\
         \n\
         Commands:\n\
         - calc <kind> key=value...              Run a calculator and print results\n\
         - prompt <kind> key=value...            Print the explanation prompt\n\
         - explain <kind> key=value... [--offline]\n\
         \x20                                       Ask the assistant to explain results\n\
         - recommend --page <path> [--interest <text>]... [--offline]\n\
         \x20                                       Ask for next-step recommendations\n\
         \n\
         Calculators: content-speed, prompt-roi\n\
         \n\
         Options:\n\
         - --offline  Skip the completion endpoint and use fallback responses\n\
         - --help     Show this help text"
    );
}
