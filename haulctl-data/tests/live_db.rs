//! End-to-end scenarios against a real MySQL instance.
//!
//! Run with: DATABASE_URL=mysql://... cargo test -p haulctl-data -- --ignored
//!
//! The tests create their own scratch tables and drop them afterwards, so
//! any empty database works.

use std::sync::Arc;

use haulctl_core::{ConstraintKind, DataError, DbConfig, Pagination};
use haulctl_data::{ConnectionManager, CrudEngine, FkResolution, FkResolver, SchemaCache};

fn live_config() -> DbConfig {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    DbConfig {
        host: String::new(),
        port: 3306,
        database: String::new(),
        user: String::new(),
        password: String::new(),
        pool_size: 5,
        database_url: Some(url),
    }
}

async fn engine() -> Arc<CrudEngine> {
    let manager = Arc::new(ConnectionManager::connect(live_config()).await);
    assert!(manager.pooled(), "pool must come up against a live database");
    let cache = Arc::new(SchemaCache::new(manager.clone()));
    Arc::new(CrudEngine::new(manager, cache))
}

async fn exec(sql: &str) {
    // Table setup/teardown goes through a raw connection; the engine
    // itself never issues DDL.
    let manager = ConnectionManager::connect(live_config()).await;
    let mut conn = manager.acquire().await.expect("acquire for DDL");
    sqlx::query(sql)
        .execute(conn.as_exec())
        .await
        .unwrap_or_else(|err| panic!("DDL failed ({sql}): {err}"));
    conn.release().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn insert_with_empty_identity_round_trips() {
    let engine = engine().await;
    exec(
        "CREATE TABLE IF NOT EXISTS Haulctl_Test_Driver (
            Driver_ID INT AUTO_INCREMENT PRIMARY KEY,
            First_Name VARCHAR(50) NOT NULL,
            Last_Name VARCHAR(50) NOT NULL
        )",
    )
    .await;

    engine
        .insert(
            "Haulctl_Test_Driver",
            &[
                "Driver_ID".to_string(),
                "First_Name".to_string(),
                "Last_Name".to_string(),
            ],
            vec![String::new(), "Jane".to_string(), "Doe".to_string()],
        )
        .await
        .expect("insert failed");

    let rows = engine
        .search("Haulctl_Test_Driver", "Last_Name", "Doe")
        .await
        .expect("search failed");
    let row = rows.last().expect("inserted row not found");
    assert!(!row[0].is_empty(), "identity must be server-assigned");
    assert_eq!(row[1], "Jane");

    let fetched = engine
        .fetch_by_id("Haulctl_Test_Driver", "Driver_ID", &row[0])
        .await
        .expect("fetch by id failed")
        .expect("row vanished");
    assert_eq!(fetched[1..], row[1..]);

    exec("DROP TABLE Haulctl_Test_Driver").await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn delete_of_referenced_row_reports_foreign_key_in_use() {
    let engine = engine().await;
    exec(
        "CREATE TABLE IF NOT EXISTS Haulctl_Test_Provider (
            Haulctl_Test_Provider_ID INT AUTO_INCREMENT PRIMARY KEY,
            Name VARCHAR(50) NOT NULL
        )",
    )
    .await;
    exec(
        "CREATE TABLE IF NOT EXISTS Haulctl_Test_Job (
            Job_ID INT AUTO_INCREMENT PRIMARY KEY,
            Haulctl_Test_Provider_ID INT NOT NULL,
            FOREIGN KEY (Haulctl_Test_Provider_ID)
                REFERENCES Haulctl_Test_Provider (Haulctl_Test_Provider_ID)
        )",
    )
    .await;
    exec("INSERT INTO Haulctl_Test_Provider (Name) VALUES ('Nordic Haulage')").await;
    exec(
        "INSERT INTO Haulctl_Test_Job (Haulctl_Test_Provider_ID)
         SELECT Haulctl_Test_Provider_ID FROM Haulctl_Test_Provider LIMIT 1",
    )
    .await;

    let rows = engine
        .fetch_page("Haulctl_Test_Provider", Pagination::default())
        .await
        .expect("fetch failed");
    let provider_id = rows.items[0][0].clone();

    let err = engine
        .delete("Haulctl_Test_Provider", "Haulctl_Test_Provider_ID", &provider_id)
        .await
        .expect_err("delete should hit the constraint");
    match err {
        DataError::Constraint { kind, .. } => {
            assert_eq!(kind, ConstraintKind::ForeignKeyInUse);
        }
        other => panic!("expected constraint violation, got {other:?}"),
    }
    assert!(err.to_string().contains("used by other records"));

    exec("DROP TABLE Haulctl_Test_Job").await;
    exec("DROP TABLE Haulctl_Test_Provider").await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn schema_cache_serves_second_lookup_without_io() {
    let engine = engine().await;
    exec(
        "CREATE TABLE IF NOT EXISTS Haulctl_Test_Cache (
            Cache_ID INT AUTO_INCREMENT PRIMARY KEY,
            Label VARCHAR(20)
        )",
    )
    .await;

    let first = engine.cache().schema("Haulctl_Test_Cache").await.unwrap();
    let second = engine.cache().schema("Haulctl_Test_Cache").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second), "second lookup must be a cache hit");
    assert_eq!(first.column_names(), vec!["Cache_ID", "Label"]);

    exec("DROP TABLE Haulctl_Test_Cache").await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn search_with_empty_criteria_matches_first_page() {
    let engine = engine().await;
    exec(
        "CREATE TABLE IF NOT EXISTS Haulctl_Test_Page (
            Page_ID INT AUTO_INCREMENT PRIMARY KEY,
            Label VARCHAR(20)
        )",
    )
    .await;
    for i in 0..3 {
        exec(&format!("INSERT INTO Haulctl_Test_Page (Label) VALUES ('row-{i}')")).await;
    }

    let via_search = engine
        .search_multi("Haulctl_Test_Page", &[])
        .await
        .expect("empty search failed");
    let via_page = engine
        .fetch_page("Haulctl_Test_Page", Pagination::default())
        .await
        .expect("fetch failed");
    assert_eq!(via_search, via_page.items);

    exec("DROP TABLE Haulctl_Test_Page").await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn fk_resolver_builds_invertible_choices() {
    let engine = engine().await;
    exec(
        "CREATE TABLE IF NOT EXISTS Haulctl_Test_Depot (
            Haulctl_Test_Depot_ID INT AUTO_INCREMENT PRIMARY KEY,
            Depot_Name VARCHAR(50) NOT NULL
        )",
    )
    .await;
    exec(
        "CREATE TABLE IF NOT EXISTS Haulctl_Test_Route (
            Route_ID INT AUTO_INCREMENT PRIMARY KEY,
            Haulctl_Test_Depot_ID INT NOT NULL
        )",
    )
    .await;
    exec("INSERT INTO Haulctl_Test_Depot (Depot_Name) VALUES ('North Yard'), ('South Yard')")
        .await;

    let resolver = FkResolver::new(engine.clone());
    match resolver
        .resolve("Haulctl_Test_Route", "Haulctl_Test_Depot_ID")
        .await
    {
        FkResolution::Resolved(choices) => {
            assert_eq!(choices.options.len(), 2);
            for option in &choices.options {
                let key = choices.reverse_key(option);
                assert!(option.starts_with(&format!("{key} - ")));
            }
        }
        other => panic!("expected Resolved, got {other:?}"),
    }

    exec("DROP TABLE Haulctl_Test_Route").await;
    exec("DROP TABLE Haulctl_Test_Depot").await;
}
