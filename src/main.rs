use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    trialmatch_lib::run().await
}
