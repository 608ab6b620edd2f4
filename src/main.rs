//! stockroom binary: loads configuration, installs logging, serves the
//! product API until SIGTERM or Ctrl-C.

use stockroom::config::LogFormat;
use stockroom::{AppState, Config, Server, Store, app};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), stockroom::Error> {
    // A missing .env file is normal.
    let dotenv = dotenvy::dotenv();

    let config = Config::load()?;
    init_tracing(config.log_format);

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }
    if config.api_key.is_none() {
        warn!("API_KEY is not set; every request will be rejected with 401");
    }

    let state = AppState::new(Store::seeded());
    let router = app::router(state, config.api_key.clone());

    let server = Server::bind(config.bind_addr()).await?.body_limit(config.max_body_bytes);
    info!("Server is running on http://{}", server.local_addr()?);
    server.serve(router).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
