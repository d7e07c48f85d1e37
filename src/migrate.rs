use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the `products` table if it does not exist yet.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // images_url holds a JSON array of strings
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY,
            name TEXT,
            url_key TEXT,
            price DECIMAL(15,2),
            description TEXT,
            images_url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// `init` phase: open the database, create the schema, close.
pub async fn run_init(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = run_migrations(&pool).await;
    pool.close().await;
    result
}
