use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match wardkeep::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("wardkeep: {e}");
            ExitCode::FAILURE
        }
    }
}
