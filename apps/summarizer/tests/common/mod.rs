use sqlx::{postgres::PgPoolOptions, PgPool};

/// Connects to `TEST_DATABASE_URL`, applies migrations and empties the table.
/// Returns `None` when no test database is configured.
pub async fn setup_db() -> Option<PgPool> {
    let _ = dotenvy::dotenv();

    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping Postgres store test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations failed");

    sqlx::query("TRUNCATE TABLE cv_analysis_logs")
        .execute(&pool)
        .await
        .expect("truncate failed");

    Some(pool)
}
