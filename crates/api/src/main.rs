#[tokio::main]
async fn main() {
    wareflow_observability::init();

    let bind = std::env::var("WAREFLOW_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = wareflow_api::app::build_app().await;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .expect("failed to bind listen address");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
