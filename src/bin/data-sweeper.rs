/// Data Sweeper server
///
/// Serves the upload page and the JSON API. Settings come from the
/// environment; see `SweeperConfig::from_env`.

use datasweeper::config::SweeperConfig;
use datasweeper::server::run_server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = SweeperConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    run_server(config).await
}
