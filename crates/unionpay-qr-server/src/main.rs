use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unionpay_server::{routes, AppState, ServerConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let state = match AppState::from_config(&config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            tracing::error!("Failed to create gateway client: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("unionpay-server listening at http://0.0.0.0:{}", config.port);
    tracing::info!("Gateway: {}", config.unionpay.api_url());
    tracing::info!("Merchant: {} / terminal {}", config.unionpay.mid, config.unionpay.tid);
    tracing::info!("Rate limit: {} req/min per IP on /pay", config.rate_limit_rpm);

    let governor_conf = match GovernorConfigBuilder::default()
        .requests_per_minute(config.rate_limit_rpm)
        .finish()
    {
        Some(conf) => conf,
        None => {
            tracing::error!("Invalid rate limit: {}", config.rate_limit_rpm);
            std::process::exit(1);
        }
    };

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(65_536))
            .app_data(web::FormConfig::default().limit(65_536))
            .wrap(Logger::default())
            .configure(routes::configure_unlimited)
            .service(routes::pay_resource().wrap(Governor::new(&governor_conf)))
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
