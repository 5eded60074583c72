mod api;
mod case;
mod config;
mod ident;
mod persistence;
mod projection;
mod run;
mod step;
mod timefmt;

use crate::api::build_api;
use crate::config::AppConfig;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {}", err);
            std::process::exit(1);
        }
    };
    let router = build_api(&config).await;
    let address = format!("0.0.0.0:{}", config.port);
    tracing::info!("listening on {}", address);
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap();
    axum::serve(listener, router).await.unwrap();
}
