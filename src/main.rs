use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use tasktrack::{configure, AppState, Config, Store};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        error!("{}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // A store that cannot be opened is fatal.
    let store = Store::open(&config).map_err(|e| {
        error!("failed to open task store: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let state = web::Data::new(AppState {
        store,
        bcrypt_cost: config.bcrypt_cost,
    });

    info!("Starting Actix Web server on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
