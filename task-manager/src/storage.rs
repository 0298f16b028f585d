use sea_orm::{Database, DatabaseConnection, DbErr};

/// Opens a connection pool for `database_url` and verifies it with a ping.
#[tracing::instrument(skip(database_url))]
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;
    db.ping().await?;
    tracing::info!("Database connection established");
    Ok(db)
}
