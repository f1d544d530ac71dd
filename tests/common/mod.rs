// tests/common/mod.rs
//
// Shared setup for the database-backed tests. They need a disposable Postgres
// database in TEST_DATABASE_URL and are ignored by default:
//
//     TEST_DATABASE_URL=postgres://... cargo test -- --ignored

#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use erp_backend::config::{AppState, Config};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("erp_backend=debug")
        .with_test_writer()
        .try_init();
}

pub async fn test_pool() -> PgPool {
    init_tracing();

    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for ignored tests");
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&url)
        .await
        .expect("connect to test database");

    sqlx::migrate!().run(&pool).await.expect("run migrations");
    pool
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "test-secret".into(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        max_connections: 5,
        jwt_ttl_days: 7,
        seed_admin: None,
    }
}

pub fn test_state(pool: PgPool) -> AppState {
    AppState::from_pool(pool, &test_config())
}

/// A business id no other test run uses, so tests never see each other's rows.
pub fn fresh_zid() -> i32 {
    100_000_000 + (Uuid::new_v4().as_u128() % 1_000_000_000) as i32
}

pub async fn cleanup(pool: &PgPool, zid: i32) {
    for table in [
        "gldetail", "glheader", "imtemptdt", "imtemptrn", "opodt", "opord", "imtrn", "pogdt", "pogrn", "poodt", "poord",
        "glmst", "xcodes", "caitem",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE zid = $1"))
            .bind(zid)
            .execute(pool)
            .await
            .expect("cleanup");
    }
}

pub struct SeedOrder<'a> {
    pub number: &'a str,
    pub sale_type: &'a str,
    pub bank: Option<&'a str>,
    pub total: Decimal,
    pub cash: Decimal,
    pub card: Decimal,
    pub discount: Decimal,
}

pub async fn seed_order(pool: &PgPool, zid: i32, date: NaiveDate, order: &SeedOrder<'_>) {
    sqlx::query(
        r#"
        INSERT INTO opord (zid, xordernum, xdate, xcus, xwh, xsltype, xsalescat, xtotamt, xcashamt, xdtcomm, xdiscf, xyear, xper)
        VALUES ($1, $2, $3, 'CUS-000001', 'Main', $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(zid)
    .bind(order.number)
    .bind(date)
    .bind(order.sale_type)
    .bind(order.bank)
    .bind(order.total)
    .bind(order.cash)
    .bind(order.card)
    .bind(order.discount)
    .bind(date.year())
    .bind(date.month() as i32)
    .execute(pool)
    .await
    .expect("seed order");
}

pub async fn seed_receipt(pool: &PgPool, zid: i32, number: &str, item: &str, warehouse: &str, qty: Decimal, value: Decimal) {
    let today = chrono::Utc::now().date_naive();
    seed_receipt_on(pool, zid, number, item, warehouse, qty, value, today).await;
}

#[allow(clippy::too_many_arguments)]
pub async fn seed_receipt_on(
    pool: &PgPool,
    zid: i32,
    number: &str,
    item: &str,
    warehouse: &str,
    qty: Decimal,
    value: Decimal,
    date: NaiveDate,
) {
    sqlx::query(
        r#"
        INSERT INTO imtrn (zid, ximtrnnum, xitem, xwh, xdate, xyear, xper, xqty, xval, xaction, xsign)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'Receipt', 1)
        "#,
    )
    .bind(zid)
    .bind(number)
    .bind(item)
    .bind(warehouse)
    .bind(date)
    .bind(date.year())
    .bind(date.month() as i32)
    .bind(qty)
    .bind(value)
    .execute(pool)
    .await
    .expect("seed receipt");
}

/// On-hand quantity of an item in one warehouse.
pub async fn on_hand(pool: &PgPool, zid: i32, item: &str, warehouse: &str) -> Decimal {
    sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(xqty * xsign), 0) FROM imtrn WHERE zid = $1 AND xitem = $2 AND xwh = $3",
    )
    .bind(zid)
    .bind(item)
    .bind(warehouse)
    .fetch_one(pool)
    .await
    .expect("on hand")
}

/// Stock movements that reference a source document.
pub async fn movements_for(pool: &PgPool, zid: i32, doc_number: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM imtrn WHERE zid = $1 AND xdocnum = $2")
        .bind(zid)
        .bind(doc_number)
        .fetch_one(pool)
        .await
        .expect("count movements")
}

pub async fn count(pool: &PgPool, table: &str, zid: i32) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table} WHERE zid = $1"))
        .bind(zid)
        .fetch_one(pool)
        .await
        .expect("count rows")
}

/// Installs a `BEFORE INSERT` trigger on `table` that raises for rows of `zid`
/// matching `condition` (a boolean expression over `NEW`).
pub async fn fail_inserts(pool: &PgPool, name: &str, table: &str, zid: i32, condition: &str) {
    sqlx::query(&format!(
        r#"
        CREATE OR REPLACE FUNCTION {name}() RETURNS trigger AS $$
        BEGIN
            IF NEW.zid = {zid} AND ({condition}) THEN
                RAISE EXCEPTION 'forced failure';
            END IF;
            RETURN NEW;
        END
        $$ LANGUAGE plpgsql
        "#
    ))
    .execute(pool)
    .await
    .expect("create trigger function");

    sqlx::query(&format!("DROP TRIGGER IF EXISTS {name} ON {table}"))
        .execute(pool)
        .await
        .expect("drop old trigger");
    sqlx::query(&format!("CREATE TRIGGER {name} BEFORE INSERT ON {table} FOR EACH ROW EXECUTE FUNCTION {name}()"))
        .execute(pool)
        .await
        .expect("create trigger");
}

pub async fn drop_failing_trigger(pool: &PgPool, name: &str, table: &str) {
    sqlx::query(&format!("DROP TRIGGER IF EXISTS {name} ON {table}"))
        .execute(pool)
        .await
        .expect("drop trigger");
    sqlx::query(&format!("DROP FUNCTION IF EXISTS {name}()"))
        .execute(pool)
        .await
        .expect("drop trigger function");
}
