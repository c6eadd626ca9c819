use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use dotenvy::dotenv;
use std::env;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use faction_portal::database::{create_database_pool, Database};
use faction_portal::handlers;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    // Initialize database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let db = create_database_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    // Build the application router
    let app = create_router(db);

    // Get port from environment or use default
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Faction portal server starting on http://{}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn create_router(db: Database) -> Router {
    Router::new()
        // Auth
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))

        // Treasury: public read views
        .route("/api/treasury/items", get(handlers::treasury::items_list))
        .route("/api/treasury/activity", get(handlers::treasury::activity_feed))
        .route("/api/treasury/distribution", get(handlers::treasury::distribution))

        // Treasury: the single write path for stock
        .route("/api/treasury/transactions", post(handlers::treasury::create_transaction))

        // Treasury: item administration
        .route("/api/treasury/items", post(handlers::treasury::create_item))
        .route("/api/treasury/items/:id", put(handlers::treasury::update_item))
        .route("/api/treasury/items/:id", delete(handlers::treasury::delete_item))

        // Crafting knowledge base
        .route("/api/crafting/items", get(handlers::crafting::items_list))
        .route("/api/crafting/items/:id", get(handlers::crafting::item_detail))
        .route("/api/crafting/items/:id/requirements", get(handlers::crafting::item_requirements))
        .route("/api/crafting/materials", get(handlers::crafting::materials_list))
        .route("/api/crafting/items", post(handlers::crafting::create_blueprint))
        .route("/api/crafting/items/:id", put(handlers::crafting::update_blueprint))
        .route("/api/crafting/items/:id", delete(handlers::crafting::delete_blueprint))
        .route("/api/crafting/materials", post(handlers::crafting::create_material))
        .route("/api/crafting/materials/:id", put(handlers::crafting::update_material))
        .route("/api/crafting/materials/:id", delete(handlers::crafting::delete_material))

        // Map locations
        .route("/api/map/locations", get(handlers::content::locations_list))
        .route("/api/map/locations", post(handlers::content::create_location))
        .route("/api/map/locations/:id", put(handlers::content::update_location))
        .route("/api/map/locations/:id", delete(handlers::content::delete_location))

        // Roster
        .route("/api/roster", get(handlers::content::roster_list))
        .route("/api/roster", post(handlers::content::create_member))
        .route("/api/roster/:id", put(handlers::content::update_member))
        .route("/api/roster/:id", delete(handlers::content::delete_member))

        // Stories
        .route("/api/stories", get(handlers::content::stories_list))
        .route("/api/stories", post(handlers::content::create_story))
        .route("/api/stories/:id", put(handlers::content::update_story))
        .route("/api/stories/:id", delete(handlers::content::delete_story))

        // Gallery
        .route("/api/gallery", get(handlers::content::gallery_list))
        .route("/api/gallery", post(handlers::content::create_album))
        .route("/api/gallery/:id", put(handlers::content::update_album))
        .route("/api/gallery/:id", delete(handlers::content::delete_album))

        // Admin: member profiles
        .route("/api/admin/profiles", get(handlers::profiles::profiles_list))
        .route("/api/admin/profiles", post(handlers::profiles::create_profile))
        .route("/api/admin/profiles/:id", put(handlers::profiles::update_profile))
        .route("/api/admin/profiles/:id", delete(handlers::profiles::delete_profile))

        // Admin dashboard
        .route("/api/admin/dashboard", get(handlers::dashboard::dashboard))

        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(2 * 1024 * 1024)) // 2MB, images live elsewhere
        )
        .with_state(db)
}
