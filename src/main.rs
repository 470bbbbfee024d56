use std::sync::Arc;

use money_tracker_server::{AppState, auth, config::Config, database, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    let db = database::init_db(&config.data_path)
        .await
        .expect("Failed to initialize database");

    let verifier: Arc<dyn auth::IdentityVerifier> =
        Arc::new(auth::HmacVerifier::new(&config.auth_secret));
    let state = AppState { db, verifier };

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();
    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, router(state)).await.unwrap();
}
