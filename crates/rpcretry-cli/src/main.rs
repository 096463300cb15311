mod cli;

use crate::cli::CliCommand;

fn main() {
    if let Some(msg) = cli::init_logging() {
        eprintln!("rpcretry warning: {}", msg);
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("rpcretry error: {:#}", err);
        std::process::exit(1);
    }
}
