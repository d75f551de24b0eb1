use breakwatch::{commands::Cli, libs::logging, msg_error};
use std::process::ExitCode;

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    logging::init();

    match Cli::menu() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            msg_error!(e);
            ExitCode::FAILURE
        }
    }
}
