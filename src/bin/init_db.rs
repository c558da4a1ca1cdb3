use dotenvy::dotenv;

use fusionfest::config::Config;
use fusionfest::database;
use fusionfest::services::schema_service::{self, ProvisionReport};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::load().expect("Environment misconfigured");
    let store = database::connect(&config)
        .await
        .expect("Could not set up registration storage");

    match schema_service::ensure_schema(store.as_ref()).await {
        Ok(ProvisionReport::Ready {
            registration_count, ..
        }) => {
            println!("event_registrations ready: {} registrations", registration_count);
        }
        Ok(ProvisionReport::NotInitialized {
            instructions, sql, ..
        }) => {
            eprintln!("event_registrations does not exist.");
            eprintln!("{}", instructions);
            eprintln!();
            println!("{}", sql);
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("schema provisioning failed: {}", e);
            std::process::exit(1);
        }
    }
}
