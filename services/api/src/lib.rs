mod cli;
mod infra;
mod routes;
mod scenario;
mod server;

use beneficiary_fraud::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
