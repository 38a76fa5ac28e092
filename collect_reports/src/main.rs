use collect_reports::function_handler;
use lambda_runtime::{run, service_fn, Error};
use std::env;

const TRACING_DEBUG: &str = "TRACING_DEBUG";

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(match env::var(TRACING_DEBUG) {
            Ok(_) => tracing::Level::DEBUG,
            Err(_) => tracing::Level::INFO
        })
        // disable printing the name of the module in every log line.
        .with_target(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    run(service_fn(function_handler)).await
}
