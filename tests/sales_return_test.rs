// tests/sales_return_test.rs

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serial_test::serial;
use sqlx::PgPool;

use erp_backend::{
    common::error::AppError,
    config::AppState,
    models::{
        sales::{PaymentMethod, PosLinePayload, PosSalePayload},
        sales_return::{RefundMethod, SalesReturnLinePayload, SalesReturnPayload},
    },
};

/// Ten units of A at cost 100, four of them sold at 150 as CO--000001.
async fn sold_four(pool: &PgPool, zid: i32) -> AppState {
    common::seed_receipt(pool, zid, "RE--000001", "A", "Main", dec!(10), dec!(1000)).await;
    let state = common::test_state(pool.clone());

    let sale = PosSalePayload {
        customer: Some("CUS-000042".into()),
        warehouse: "Main".into(),
        payment_method: PaymentMethod::Cash,
        bank_name: None,
        card_number: None,
        card_amount: dec!(0),
        fixed_discount: dec!(0),
        percent_discount_amount: dec!(0),
        date: None,
        lines: vec![PosLinePayload { item: "A".into(), quantity: dec!(4), rate: dec!(150), vat: dec!(0) }],
    };
    let receipt = state.sales_service.complete_sale(zid, "counter01", &sale).await.unwrap();
    assert_eq!(receipt.order_number, "CO--000001");

    state
}

fn return_of(quantity: Decimal, refund: RefundMethod) -> SalesReturnPayload {
    SalesReturnPayload {
        order_number: Some("CO--000001".into()),
        customer: None,
        warehouse: "Main".into(),
        project: None,
        refund,
        notes: Some("damaged box".into()),
        date: None,
        lines: vec![SalesReturnLinePayload { item: "A".into(), quantity, rate: dec!(150) }],
    }
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn a_return_puts_stock_back_and_posts_a_balanced_journal() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    let service = sold_four(&pool, zid).await.sales_return_service;

    let receipt = service.process(zid, "counter01", &return_of(dec!(2), RefundMethod::Cash)).await.unwrap();

    assert_eq!(receipt.return_number, "SRE-000001");
    assert_eq!(receipt.voucher, "SALE000001");
    assert_eq!(receipt.refund_total, dec!(300));
    assert_eq!(receipt.inventory_value, dec!(200));
    assert_eq!(receipt.lines[0].unit_cost, dec!(100));
    assert_eq!(receipt.lines[0].movement_number, "SRE000001");
    assert_eq!(common::on_hand(&pool, zid, "A", "Main").await, dec!(8));

    let detail = service.detail(zid, "SRE-000001").await.unwrap();
    assert_eq!(detail.header.xordernum.as_deref(), Some("CO--000001"));
    assert_eq!(detail.header.xcus.as_deref(), Some("CUS-000042"));
    assert_eq!(detail.lines.len(), 1);
    assert_eq!(detail.journal.len(), 4);
    assert_eq!(detail.journal.iter().map(|d| d.xprime).sum::<Decimal>(), Decimal::ZERO);

    let code: String = sqlx::query_scalar("SELECT xtrngl FROM glheader WHERE zid = $1 AND xvoucher = 'SALE000001'")
        .bind(zid)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(code, "SRE");

    common::cleanup(&pool, zid).await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn failure_mid_return_leaves_no_rows() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    let service = sold_four(&pool, zid).await.sales_return_service;
    let movements_before = common::count(&pool, "imtrn", zid).await;

    // Cost of sales is the last journal line, written after everything else.
    common::fail_inserts(&pool, "fail_return_cost_line", "gldetail", zid, "NEW.xacctype = 'Expenditure'").await;
    let result = service.process(zid, "counter01", &return_of(dec!(2), RefundMethod::Cash)).await;
    common::drop_failing_trigger(&pool, "fail_return_cost_line", "gldetail").await;

    assert!(matches!(result, Err(AppError::DatabaseError(_))));
    for table in ["imtemptrn", "imtemptdt", "glheader", "gldetail"] {
        assert_eq!(common::count(&pool, table, zid).await, 0, "{table} kept rows");
    }
    assert_eq!(common::count(&pool, "imtrn", zid).await, movements_before);
    assert_eq!(common::on_hand(&pool, zid, "A", "Main").await, dec!(6));

    let retry = service.process(zid, "counter01", &return_of(dec!(2), RefundMethod::Cash)).await.unwrap();
    assert_eq!(retry.return_number, "SRE-000001");

    common::cleanup(&pool, zid).await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn deleting_a_return_takes_the_stock_back_out() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    let service = sold_four(&pool, zid).await.sales_return_service;
    service.process(zid, "counter01", &return_of(dec!(3), RefundMethod::Credit)).await.unwrap();
    assert_eq!(common::on_hand(&pool, zid, "A", "Main").await, dec!(9));

    let deletion = service.delete(zid, "SRE-000001").await.unwrap();

    assert_eq!(deletion.voucher.as_deref(), Some("SALE000001"));
    assert_eq!(deletion.movements_deleted, 1);
    assert_eq!(deletion.lines_deleted, 1);
    assert_eq!(deletion.details_deleted, 4);
    assert_eq!(deletion.headers_deleted, 1);
    assert_eq!(common::on_hand(&pool, zid, "A", "Main").await, dec!(6));
    for table in ["imtemptrn", "imtemptdt", "glheader", "gldetail"] {
        assert_eq!(common::count(&pool, table, zid).await, 0, "{table} kept rows");
    }

    let again = service.delete(zid, "SRE-000001").await;
    assert!(matches!(again, Err(AppError::NotFound(_))));

    common::cleanup(&pool, zid).await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn returns_cannot_exceed_what_the_order_sold() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    let service = sold_four(&pool, zid).await.sales_return_service;
    service.process(zid, "counter01", &return_of(dec!(2), RefundMethod::Cash)).await.unwrap();

    let result = service.process(zid, "counter01", &return_of(dec!(3), RefundMethod::Cash)).await;

    match result {
        Err(AppError::BusinessRule(msg)) => assert!(msg.contains("A (requested 3, returnable 2)"), "{msg}"),
        other => panic!("expected an over-return rejection, got {other:?}"),
    }
    assert_eq!(common::count(&pool, "imtemptrn", zid).await, 1);
    assert_eq!(common::on_hand(&pool, zid, "A", "Main").await, dec!(8));

    let mut unknown = return_of(dec!(1), RefundMethod::Cash);
    unknown.order_number = Some("CO--999999".into());
    assert!(matches!(service.process(zid, "counter01", &unknown).await, Err(AppError::NotFound(_))));

    common::cleanup(&pool, zid).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn concurrent_returns_against_one_order_respect_the_cap() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    let service = sold_four(&pool, zid).await.sales_return_service;

    let first = return_of(dec!(3), RefundMethod::Cash);
    let second = return_of(dec!(3), RefundMethod::Cash);
    let (a, b) = tokio::join!(
        service.process(zid, "counter01", &first),
        service.process(zid, "counter02", &second),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(common::on_hand(&pool, zid, "A", "Main").await, dec!(9));

    common::cleanup(&pool, zid).await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn credit_refunds_need_a_customer() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    let service = sold_four(&pool, zid).await.sales_return_service;

    let mut walk_in = return_of(dec!(1), RefundMethod::Credit);
    walk_in.order_number = None;
    let result = service.process(zid, "counter01", &walk_in).await;

    assert!(matches!(result, Err(AppError::BusinessRule(_))));
    assert_eq!(common::count(&pool, "imtemptrn", zid).await, 0);

    common::cleanup(&pool, zid).await;
}
