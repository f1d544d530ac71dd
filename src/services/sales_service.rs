// src/services/sales_service.rs

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use std::collections::BTreeMap;

use crate::{
    common::{db_utils::acquire_xact_lock, error::AppError},
    db::SalesRepository,
    models::{
        inventory::{NewStockMovement, StockDirection},
        sales::{
            NewSalesLine, NewSalesOrder, PaymentMethod, PosReceiptLine, PosSalePayload, PosSaleReceipt,
            SaleTotals, DEFAULT_CUSTOMER,
        },
        voucher::VoucherSeries,
    },
    services::{
        inventory_service::{describe_shortages, InventoryService},
        voucher_service::VoucherService,
    },
};

/// Rounds to the two decimals every money column stores, halves away from zero
/// as Postgres `NUMERIC(_, 2)` does.
pub fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn line_amount(quantity: Decimal, rate: Decimal) -> Decimal {
    money(quantity * rate)
}

/// Order totals and the cash/card split, or the reason the sale is invalid.
///
/// Every input amount is rounded to cents first, so the stored order, the
/// receipt and the day-end journal all see the same figures.
pub fn compute_totals(payload: &PosSalePayload) -> Result<SaleTotals, String> {
    let subtotal: Decimal = payload.lines.iter().map(|l| line_amount(l.quantity, l.rate)).sum();
    let tax: Decimal = payload.lines.iter().map(|l| money(l.vat)).sum();
    let discount = money(payload.fixed_discount) + money(payload.percent_discount_amount);

    if discount > subtotal + tax {
        return Err(format!("Discount {} exceeds the order value {}.", discount, subtotal + tax));
    }
    let total = subtotal + tax - discount;

    let card_amount = match payload.payment_method {
        PaymentMethod::Card => {
            if payload.bank_name.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err("Card sales need a bank name.".to_string());
            }
            let card_amount = money(payload.card_amount);
            if card_amount > total {
                return Err(format!("Card amount {} exceeds the order total {}.", card_amount, total));
            }
            if card_amount.is_zero() { total } else { card_amount }
        }
        _ if payload.card_amount > Decimal::ZERO => {
            return Err("Card amount is only allowed on card sales.".to_string());
        }
        _ => Decimal::ZERO,
    };

    let cash_amount = match payload.payment_method {
        PaymentMethod::Credit => Decimal::ZERO,
        _ => total - card_amount,
    };

    Ok(SaleTotals { subtotal, tax, discount, total, card_amount, cash_amount })
}

/// Completes point-of-sale orders: order header and lines plus the matching
/// inventory issues, all in one transaction.
#[derive(Clone)]
pub struct SalesService {
    pool: PgPool,
    sales_repo: SalesRepository,
    inventory_service: InventoryService,
    voucher_service: VoucherService,
}

impl SalesService {
    pub fn new(
        pool: PgPool,
        sales_repo: SalesRepository,
        inventory_service: InventoryService,
        voucher_service: VoucherService,
    ) -> Self {
        Self { pool, sales_repo, inventory_service, voucher_service }
    }

    pub async fn complete_sale(&self, zid: i32, member: &str, payload: &PosSalePayload) -> Result<PosSaleReceipt, AppError> {
        let totals = compute_totals(payload).map_err(AppError::BusinessRule)?;
        let date = payload.date.unwrap_or_else(|| Utc::now().date_naive());
        let warehouse = payload.warehouse.as_str();
        let customer = payload.customer.as_deref().unwrap_or(DEFAULT_CUSTOMER);

        let mut requested: BTreeMap<String, Decimal> = BTreeMap::new();
        for line in &payload.lines {
            *requested.entry(line.item.clone()).or_default() += line.quantity;
        }

        let mut tx = self.pool.begin().await?;

        // Concurrent sales from one warehouse must not both pass the stock check.
        acquire_xact_lock(&mut *tx, &format!("stock:{}:{}", zid, warehouse)).await?;

        let shortages = self
            .inventory_service
            .find_shortages(&mut *tx, zid, warehouse, &requested)
            .await?;
        if !shortages.is_empty() {
            return Err(AppError::BusinessRule(describe_shortages(&shortages)));
        }

        let order_number = self
            .voucher_service
            .next_in_series(&mut *tx, zid, VoucherSeries::SalesOrder, date)
            .await?;

        self.sales_repo
            .insert_order(
                &mut *tx,
                &NewSalesOrder {
                    zid,
                    order_number: &order_number,
                    date,
                    customer,
                    warehouse,
                    sale_type: payload.payment_method.sale_type(),
                    bank: payload.bank_name.as_deref().filter(|_| payload.payment_method == PaymentMethod::Card),
                    card_number: payload.card_number.as_deref(),
                    fixed_discount: money(payload.fixed_discount),
                    percent_discount_amount: money(payload.percent_discount_amount),
                    totals,
                    member,
                },
            )
            .await?;

        let mut receipt_lines = Vec::with_capacity(payload.lines.len());
        for (idx, line) in payload.lines.iter().enumerate() {
            let row = idx as i32 + 1;
            let issue_number = self
                .voucher_service
                .next_in_series(&mut *tx, zid, VoucherSeries::InventoryIssue, date)
                .await?;
            let unit_cost = self.inventory_service.average_cost(&mut *tx, zid, &line.item, date).await?;

            self.sales_repo
                .insert_line(
                    &mut *tx,
                    &NewSalesLine {
                        zid,
                        order_number: &order_number,
                        row,
                        item: &line.item,
                        warehouse,
                        quantity: line.quantity,
                        rate: line.rate,
                        line_amount: line_amount(line.quantity, line.rate),
                        vat: money(line.vat),
                        issue_number: &issue_number,
                        unit_cost,
                    },
                )
                .await?;

            self.inventory_service
                .repo()
                .record_movement(
                    &mut *tx,
                    &NewStockMovement {
                        zid,
                        number: &issue_number,
                        item: &line.item,
                        warehouse,
                        date,
                        quantity: line.quantity,
                        value: (line.quantity * unit_cost).round_dp(6),
                        rate: line.rate,
                        doc_type: "IS--",
                        doc_number: &order_number,
                        doc_row: row,
                        note: None,
                        supplier: None,
                        customer: Some(customer),
                        project: None,
                        direction: StockDirection::Issue,
                        member,
                    },
                )
                .await?;

            receipt_lines.push(PosReceiptLine {
                row,
                item: line.item.clone(),
                issue_number,
                unit_cost,
            });
        }

        tx.commit().await?;
        tracing::info!(zid, order = %order_number, total = %totals.total, "Sale processed");

        Ok(PosSaleReceipt { order_number, date, totals, lines: receipt_lines })
    }
}
