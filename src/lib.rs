pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel::prelude::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

/// Ensure the bootstrap admin account exists. No-op unless both ADMIN_EMAIL
/// and ADMIN_PASSWORD_HASH are configured; the existing row wins on conflict.
pub fn seed_admin(pool: &DbPool, config: &AppConfig) {
    let (Some(email), Some(password_hash)) = (&config.admin_email, &config.admin_password_hash)
    else {
        return;
    };

    let mut conn = pool.get().expect("Failed to get DB connection for admin seed");
    let inserted = diesel::insert_into(schema::users::table)
        .values(&models::user::NewUser {
            id: uuid::Uuid::new_v4(),
            email: email.clone(),
            password_hash: password_hash.clone(),
            name: "Admin".to_string(),
            phone: None,
            role: "admin".to_string(),
            email_verified: true,
        })
        .on_conflict(schema::users::email)
        .do_nothing()
        .execute(&mut conn)
        .expect("Failed to seed admin user");

    if inserted > 0 {
        log::info!("Seeded admin account {}", email);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::delete_all_orders,
        handlers::orders::update_order,
        handlers::orders::confirm_order,
        handlers::orders::delete_order_item,
        handlers::products::list_products,
        handlers::exports::export_orders,
        handlers::exports::export_earnings,
    ),
    components(schemas(
        handlers::orders::CartItemRequest,
        handlers::orders::CustomerInfoRequest,
        handlers::orders::CreateOrderRequest,
        handlers::orders::ItemPriceEntry,
        handlers::orders::UpdateOrderRequest,
        handlers::orders::OrderItemResponse,
        handlers::orders::UserSummaryResponse,
        handlers::orders::OrderResponse,
        handlers::products::ProductResponse,
    )),
    tags(
        (name = "orders", description = "Order lifecycle"),
        (name = "products", description = "Menu"),
        (name = "exports", description = "Admin spreadsheet exports"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to the configured host:port.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(pool: DbPool, config: AppConfig) -> std::io::Result<actix_web::dev::Server> {
    let bind_addr = (config.host.clone(), config.port);
    let notifier = notify::Notifier::new(&config);

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(notifier.clone()))
            .wrap(Logger::default())
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("", web::delete().to(handlers::orders::delete_all_orders))
                    .route("/export", web::get().to(handlers::exports::export_orders))
                    .route("/items", web::delete().to(handlers::orders::delete_order_item))
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route("/{id}", web::patch().to(handlers::orders::update_order))
                    .route("/{id}/confirm", web::post().to(handlers::orders::confirm_order)),
            )
            .service(
                web::scope("/products")
                    .route("", web::get().to(handlers::products::list_products))
                    .route(
                        "/earnings/export",
                        web::get().to(handlers::exports::export_earnings),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind(bind_addr)?
    .run())
}
