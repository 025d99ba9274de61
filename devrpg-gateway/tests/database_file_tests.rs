//! File-backed database lifecycle

use devrpg_gateway::config::PoolSettings;
use devrpg_gateway::db::{self, users};
use std::time::Duration;
use tempfile::TempDir;

fn settings() -> PoolSettings {
    PoolSettings {
        min_connections: 1,
        max_connections: 2,
        acquire_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_database_file_created_and_reopened() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devrpg.db");
    let url = format!("sqlite://{}", path.display());

    let pool = db::init_database(&url, &settings()).await.unwrap();
    assert!(path.exists());
    assert!(db::ping(&pool).await);

    let user = users::create_user(
        &pool,
        &users::NewUser {
            username: "mira".to_string(),
            email: "mira@example.com".to_string(),
            password: "secret123".to_string(),
            display_name: Some("Mira".to_string()),
        },
    )
    .await
    .unwrap();
    pool.close().await;

    // Schema creation is idempotent and existing rows survive
    let reopened = db::init_database(&url, &settings()).await.unwrap();
    let stored = users::get_user(&reopened, &user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "mira");
    assert_eq!(stored.level, 1);
    reopened.close().await;
}

#[tokio::test]
async fn test_duplicate_username_is_unique_violation() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("dup.db").display());
    let pool = db::init_database(&url, &settings()).await.unwrap();

    let new_user = users::NewUser {
        username: "nora".to_string(),
        email: "nora@example.com".to_string(),
        password: "secret123".to_string(),
        display_name: None,
    };
    users::create_user(&pool, &new_user).await.unwrap();

    let err = users::create_user(&pool, &new_user).await.unwrap_err();
    assert!(db::is_unique_violation(&err));
    pool.close().await;
}
