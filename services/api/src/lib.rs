mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use ride_match::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
