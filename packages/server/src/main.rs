use axum::http::{self, HeaderValue, Method};
use dotenvy::dotenv;
use onuw_server::{app, utils::config::CONFIG};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};

fn init_logger() {
    let level = CONFIG.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    init_logger();
    if let Err(e) = env_loaded {
        warn!("no .env file loaded: {}", e);
    }

    let cors = CorsLayer::new()
        .allow_origin(CONFIG.cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET])
        .allow_headers([http::header::CONTENT_TYPE]);

    let app = app::create_app(CONFIG.clone()).layer(cors).layer(
        TraceLayer::new_for_http().make_span_with(|request: &http::Request<_>| {
            tracing::info_span!(
                "HTTP request",
                method = %request.method(),
                uri = %request.uri(),
            )
        }),
    );

    let addr = format!("{}:{}", CONFIG.host, CONFIG.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
