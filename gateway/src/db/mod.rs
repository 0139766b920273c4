use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;

/// Open the gateway database, creating the file and parent directory on
/// first run, and apply pending migrations.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    // Accepts both "sqlite:./foo.db" and a bare filesystem path.
    let file_path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

    let abs_path = std::env::current_dir()?.join(file_path);
    if let Some(parent) = abs_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::new()
            .filename(&abs_path)
            .create_if_missing(true),
    )
    .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
