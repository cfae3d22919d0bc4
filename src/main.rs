use dotenvy::dotenv;
use restaurant_orders::{build_server, create_pool, run_migrations, seed_admin, AppConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().expect("Invalid configuration");

    let pool = create_pool(&config.database_url);
    run_migrations(&pool);
    seed_admin(&pool, &config);

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(pool, config)?.await
}
