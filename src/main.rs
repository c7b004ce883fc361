use std::net::SocketAddr;
use std::sync::Arc;

use commerce_mock_rust::config::CommerceConfig;
use commerce_mock_rust::dispatch::Dispatcher;
use commerce_mock_rust::router::create_app_router;
use commerce_mock_rust::store::seed::demo_store;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = CommerceConfig::from_env();
    tracing::info!(base_url = config.base_url(), "starting commerce engine");

    let dispatcher = Arc::new(Dispatcher::new(demo_store(), config));
    let app = create_app_router(dispatcher);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8000));
    tracing::info!("server running on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
