use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match carepoint_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("carepoint: {e}");
            ExitCode::FAILURE
        }
    }
}
