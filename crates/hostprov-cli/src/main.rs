use hostprov_core::logging;

mod cli;

use crate::cli::{exit_code, CliCommand, EXIT_VERIFICATION_FAILED};

fn main() {
    // Initialize logging as early as possible; fall back to stderr if the state dir is unusable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args() {
        let code = exit_code(&err);
        if code == EXIT_VERIFICATION_FAILED {
            eprintln!("hostprov: verification failed: {:#}", err);
        } else {
            eprintln!("hostprov error: {:#}", err);
        }
        std::process::exit(code);
    }
}
