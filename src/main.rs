use std::process::ExitCode;

mod cli;
mod credentials;
mod deploy;
mod error;
mod feed;
mod logging;
mod manifest;
mod store;
#[cfg(test)]
mod testing;

fn main() -> ExitCode {
    if let Err(error) = logging::init().and_then(|()| cli::execute()) {
        eprintln!("Error: {error:?}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
