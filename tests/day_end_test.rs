// tests/day_end_test.rs

mod common;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serial_test::serial;
use sqlx::PgPool;

use common::SeedOrder;
use erp_backend::{common::error::AppError, db::LedgerRepository, models::ledger::DayEndOutcome};

fn business_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
}

/// Cash, mapped card, unmapped card and credit sales with a fixed discount.
async fn seed_mixed_day(pool: &PgPool, zid: i32) {
    let date = business_day();
    let orders = [
        SeedOrder { number: "CO--000001", sale_type: "Cash Sale", bank: None, total: dec!(1000), cash: dec!(1000), card: dec!(0), discount: dec!(50) },
        SeedOrder { number: "CO--000002", sale_type: "Card Sale", bank: Some("DBBL"), total: dec!(500), cash: dec!(100), card: dec!(400), discount: dec!(0) },
        SeedOrder { number: "CO--000003", sale_type: "Card Sale", bank: Some("XYZ"), total: dec!(300), cash: dec!(0), card: dec!(300), discount: dec!(0) },
        SeedOrder { number: "CO--000004", sale_type: "Credit Sale", bank: None, total: dec!(200), cash: dec!(0), card: dec!(0), discount: dec!(0) },
    ];
    for order in &orders {
        common::seed_order(pool, zid, date, order).await;
    }
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn posts_a_balanced_journal_once() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    seed_mixed_day(&pool, zid).await;
    let service = common::test_state(pool.clone()).day_end_service;

    let first = service.process(zid, business_day(), "tester").await.unwrap();
    let DayEndOutcome::Posted { voucher, lines } = first else {
        panic!("expected a posted journal, got {first:?}");
    };
    assert_eq!(voucher, "SALE000001");
    assert_eq!(lines.len(), 5);

    let details = LedgerRepository::new(pool.clone()).list_details(zid, &voucher).await.unwrap();
    assert_eq!(details.len(), 5);
    assert_eq!(details.iter().map(|d| d.xprime).sum::<Decimal>(), Decimal::ZERO);

    let sales = details.iter().find(|d| d.xacc == "08010001").unwrap();
    assert_eq!(sales.xprime, dec!(-2050));
    let bank = details.iter().find(|d| d.xsub.as_deref() == Some("0102000102")).unwrap();
    assert_eq!(bank.xprime, dec!(400));
    // Unmapped bank plus credit sale.
    let receivable = details.iter().find(|d| d.xacc == "01030001").unwrap();
    assert_eq!(receivable.xprime, dec!(500));

    let second = service.process(zid, business_day(), "tester").await.unwrap();
    assert_eq!(second, DayEndOutcome::AlreadyProcessed { voucher: voucher.clone() });
    assert_eq!(common::count(&pool, "glheader", zid).await, 1);
    assert_eq!(common::count(&pool, "gldetail", zid).await, 5);

    common::cleanup(&pool, zid).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn concurrent_runs_post_exactly_once() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    seed_mixed_day(&pool, zid).await;
    let service = common::test_state(pool.clone()).day_end_service;

    let (a, b) = tokio::join!(
        service.process(zid, business_day(), "counter-1"),
        service.process(zid, business_day(), "counter-2"),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let posted = outcomes.iter().filter(|o| o.is_posted()).count();
    let already = outcomes
        .iter()
        .filter(|o| matches!(o, DayEndOutcome::AlreadyProcessed { .. }))
        .count();
    assert_eq!((posted, already), (1, 1));
    assert_eq!(common::count(&pool, "glheader", zid).await, 1);

    common::cleanup(&pool, zid).await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn a_day_without_sales_writes_nothing() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    let service = common::test_state(pool.clone()).day_end_service;

    let outcome = service.process(zid, business_day(), "tester").await.unwrap();

    assert_eq!(outcome, DayEndOutcome::NoSales);
    assert_eq!(common::count(&pool, "glheader", zid).await, 0);
    assert_eq!(common::count(&pool, "gldetail", zid).await, 0);
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn failure_mid_posting_leaves_no_rows() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    seed_mixed_day(&pool, zid).await;

    // The discount line is written after the header and the first details.
    sqlx::query(&format!(
        r#"
        CREATE OR REPLACE FUNCTION fail_discount_detail() RETURNS trigger AS $$
        BEGIN
            IF NEW.zid = {zid} AND NEW.xacctype = 'Expenditure' THEN
                RAISE EXCEPTION 'forced failure';
            END IF;
            RETURN NEW;
        END
        $$ LANGUAGE plpgsql
        "#
    ))
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("DROP TRIGGER IF EXISTS fail_discount_detail ON gldetail")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "CREATE TRIGGER fail_discount_detail BEFORE INSERT ON gldetail FOR EACH ROW EXECUTE FUNCTION fail_discount_detail()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let service = common::test_state(pool.clone()).day_end_service;
    let result = service.process(zid, business_day(), "tester").await;

    sqlx::query("DROP TRIGGER fail_discount_detail ON gldetail").execute(&pool).await.unwrap();
    sqlx::query("DROP FUNCTION fail_discount_detail()").execute(&pool).await.unwrap();

    assert!(matches!(result, Err(AppError::DatabaseError(_))));
    assert_eq!(common::count(&pool, "glheader", zid).await, 0);
    assert_eq!(common::count(&pool, "gldetail", zid).await, 0);

    // Nothing was left half-done, so the day can still be posted.
    let retry = service.process(zid, business_day(), "tester").await.unwrap();
    assert!(retry.is_posted());

    common::cleanup(&pool, zid).await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn reversal_removes_the_journal_and_allows_a_rerun() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    seed_mixed_day(&pool, zid).await;
    let service = common::test_state(pool.clone()).day_end_service;

    let posted = service.process(zid, business_day(), "tester").await.unwrap();
    assert!(posted.is_posted());

    let preview = service.preview(zid, business_day()).await.unwrap();
    assert_eq!(preview.processed_voucher.as_deref(), Some("SALE000001"));
    assert_eq!(preview.aggregate.order_count, 4);

    let reversal = service.reverse(zid, business_day()).await.unwrap();
    assert_eq!(reversal.details_deleted, 5);
    assert_eq!(reversal.headers_deleted, 1);
    assert_eq!(common::count(&pool, "glheader", zid).await, 0);

    let again = service.reverse(zid, business_day()).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));

    let rerun = service.process(zid, business_day(), "tester").await.unwrap();
    assert!(rerun.is_posted());
    assert_eq!(common::count(&pool, "glheader", zid).await, 1);

    common::cleanup(&pool, zid).await;
}
