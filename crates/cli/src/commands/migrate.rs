//! Database migration command.
//!
//! Applies `crates/storefront/migrations/` and creates the session store
//! table. Migrations never run on server startup.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (or `DATABASE_URL`)

use tracing::info;

use dessert_shop_storefront::db;

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn storefront() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running storefront migrations...");
    db::run_migrations(&pool).await?;

    info!("Storefront migrations complete!");
    Ok(())
}
