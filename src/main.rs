use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::store::{MemoryStore, MongoStore, Store};

mod api;
mod auth;
mod balance;
mod config;
mod error;
mod exchange;
mod schemas;
mod store;
mod validation;

#[cfg(test)]
mod test_support;

/// Shared by every worker: the store and the session signer.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Authenticator,
}

fn to_io_error(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

async fn open_store(config: &Config) -> std::io::Result<Arc<dyn Store>> {
    match &config.database.mongodb_uri {
        Some(uri) => {
            let store = MongoStore::connect(uri, &config.database.name)
                .await
                .map_err(to_io_error)?;
            info!(database = %config.database.name, "connected to MongoDB");
            Ok(Arc::new(store))
        }
        None => {
            warn!("MONGODB_URI is not set, data will only live in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().map_err(to_io_error)?;
    let store = open_store(&config).await?;
    let state = web::Data::new(AppState {
        store,
        auth: Authenticator::new(config.auth.clone()),
    });

    let server = config.server.clone();
    info!(host = %server.host, port = server.port, "starting LocalSplit");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&server.allowed_origin)
            .allowed_methods(vec!["GET", "POST", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);
        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(api::configure)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
