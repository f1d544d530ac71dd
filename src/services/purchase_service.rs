// src/services/purchase_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::PurchaseRepository,
    models::{
        inventory::{NewStockMovement, StockDirection},
        purchase::{
            GrnConfirmation, NewGoodsReceipt, NewPurchaseLine, NewPurchaseOrder, PurchaseOrderCreated,
            PurchaseOrderPayload, PurchaseTotals, GRN_CONFIRMED, GRN_OPEN,
        },
        voucher::VoucherSeries,
    },
    services::{
        inventory_service::InventoryService,
        sales_service::{line_amount, money},
        voucher_service::VoucherService,
    },
};

/// Order value before and after the percentage and fixed discounts.
pub fn purchase_totals(payload: &PurchaseOrderPayload) -> Result<PurchaseTotals, String> {
    let subtotal: Decimal = payload.lines.iter().map(|l| line_amount(l.quantity, l.rate)).sum();
    let discount = money(subtotal * payload.discount_percent / Decimal::ONE_HUNDRED) + money(payload.fixed_discount);

    if discount > subtotal {
        return Err(format!("Discount {} exceeds the order value {}.", discount, subtotal));
    }

    Ok(PurchaseTotals { subtotal, discount, total: subtotal - discount })
}

/// Cost a received line is booked at: the current average, or the purchase
/// rate while the item has no cost history.
pub fn receipt_cost(average: Decimal, rate: Decimal) -> Decimal {
    if average.is_zero() { rate } else { average }
}

#[derive(Clone)]
pub struct PurchaseService {
    pool: PgPool,
    purchase_repo: PurchaseRepository,
    inventory_service: InventoryService,
    voucher_service: VoucherService,
}

impl PurchaseService {
    pub fn new(
        pool: PgPool,
        purchase_repo: PurchaseRepository,
        inventory_service: InventoryService,
        voucher_service: VoucherService,
    ) -> Self {
        Self { pool, purchase_repo, inventory_service, voucher_service }
    }

    /// Writes a purchase order and its open GRN in one transaction.
    pub async fn create_purchase_order(
        &self,
        zid: i32,
        member: &str,
        payload: &PurchaseOrderPayload,
    ) -> Result<PurchaseOrderCreated, AppError> {
        let totals = purchase_totals(payload).map_err(AppError::BusinessRule)?;
        let date = payload.date.unwrap_or_else(|| Utc::now().date_naive());
        let warehouse = payload.warehouse.as_str();

        let mut tx = self.pool.begin().await?;

        let po_number = self
            .voucher_service
            .next_in_series(&mut *tx, zid, VoucherSeries::PurchaseOrder, date)
            .await?;

        self.purchase_repo
            .insert_order(
                &mut *tx,
                &NewPurchaseOrder {
                    zid,
                    po_number: &po_number,
                    date,
                    supplier: &payload.supplier,
                    warehouse,
                    project: payload.project.as_deref(),
                    supplier_ref: payload.supplier_ref.as_deref(),
                    remarks: payload.remarks.as_deref(),
                    discount_percent: payload.discount_percent,
                    fixed_discount: money(payload.fixed_discount),
                    totals,
                    member,
                },
            )
            .await?;

        let lines: Vec<NewPurchaseLine> = payload
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| NewPurchaseLine {
                zid,
                po_number: &po_number,
                row: idx as i32 + 1,
                item: &line.item,
                warehouse,
                quantity: line.quantity,
                rate: line.rate,
                line_amount: line_amount(line.quantity, line.rate),
            })
            .collect();

        for line in &lines {
            self.purchase_repo.insert_order_line(&mut *tx, line).await?;
        }

        let grn_number = self
            .voucher_service
            .next_in_series(&mut *tx, zid, VoucherSeries::GoodsReceipt, date)
            .await?;

        self.purchase_repo
            .insert_grn(
                &mut *tx,
                &NewGoodsReceipt {
                    zid,
                    grn_number: &grn_number,
                    po_number: &po_number,
                    date,
                    supplier: &payload.supplier,
                    warehouse,
                    project: payload.project.as_deref(),
                    remarks: payload.remarks.as_deref(),
                    total: totals.total,
                },
            )
            .await?;

        for line in &lines {
            self.purchase_repo.insert_grn_line(&mut *tx, &grn_number, line).await?;
        }

        tx.commit().await?;
        tracing::info!(zid, po = %po_number, grn = %grn_number, total = %totals.total, "Purchase order created");

        Ok(PurchaseOrderCreated { po_number, grn_number, date, totals })
    }

    /// Books every GRN line into stock and closes the GRN.
    ///
    /// The header row lock makes a second confirmation wait for the first
    /// and then fail on the status check.
    pub async fn confirm_grn(&self, zid: i32, grn: &str, member: &str) -> Result<GrnConfirmation, AppError> {
        let mut tx = self.pool.begin().await?;

        let header = self
            .purchase_repo
            .lock_grn(&mut *tx, zid, grn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("GRN {} not found", grn)))?;

        if header.xstatusgrn != GRN_OPEN {
            return Err(AppError::Conflict(format!(
                "GRN {} already processed (status {})",
                grn, header.xstatusgrn
            )));
        }

        let lines = self.purchase_repo.grn_lines(&mut *tx, zid, grn).await?;
        if lines.is_empty() {
            return Err(AppError::BusinessRule(format!("GRN {} has no lines", grn)));
        }

        let date = header.xdate.unwrap_or_else(|| Utc::now().date_naive());
        let mut receipts = Vec::with_capacity(lines.len());

        for line in &lines {
            let average = self.inventory_service.average_cost(&mut *tx, zid, &line.xitem, date).await?;
            let cost = receipt_cost(average, line.xrate);

            let number = self
                .voucher_service
                .next_in_series(&mut *tx, zid, VoucherSeries::InventoryReceipt, date)
                .await?;

            self.inventory_service
                .repo()
                .record_movement(
                    &mut *tx,
                    &NewStockMovement {
                        zid,
                        number: &number,
                        item: &line.xitem,
                        warehouse: &header.xwh,
                        date,
                        quantity: line.xqty,
                        value: (line.xqty * cost).round_dp(6),
                        rate: line.xrate,
                        doc_type: "GRN-",
                        doc_number: grn,
                        doc_row: line.xrow,
                        note: header.xpornum.as_deref(),
                        supplier: header.xsup.as_deref(),
                        customer: None,
                        project: header.xproj.as_deref(),
                        direction: StockDirection::Receipt,
                        member,
                    },
                )
                .await?;

            receipts.push(number);
        }

        self.purchase_repo.set_grn_status(&mut *tx, zid, grn, GRN_CONFIRMED).await?;
        self.purchase_repo.set_grn_line_status(&mut *tx, zid, grn, GRN_CONFIRMED).await?;

        tx.commit().await?;
        tracing::info!(zid, grn, receipts = receipts.len(), "GRN confirmed");

        Ok(GrnConfirmation { grn: grn.to_string(), receipts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::purchase::PurchaseLinePayload;
    use rust_decimal_macros::dec;

    fn order(discount_percent: Decimal, fixed_discount: Decimal) -> PurchaseOrderPayload {
        PurchaseOrderPayload {
            supplier: "SUP-000003".into(),
            warehouse: "Main".into(),
            project: None,
            supplier_ref: None,
            remarks: None,
            discount_percent,
            fixed_discount,
            date: None,
            lines: vec![
                PurchaseLinePayload { item: "A".into(), quantity: dec!(10), rate: dec!(12.5) },
                PurchaseLinePayload { item: "B".into(), quantity: dec!(3), rate: dec!(33.333) },
            ],
        }
    }

    #[test]
    fn totals_apply_percentage_then_fixed_discount() {
        let totals = purchase_totals(&order(dec!(10), dec!(5))).unwrap();
        assert_eq!(totals.subtotal, dec!(225.00));
        assert_eq!(totals.discount, dec!(27.50));
        assert_eq!(totals.total, dec!(197.50));
    }

    #[test]
    fn discounts_above_the_order_value_are_rejected() {
        assert!(purchase_totals(&order(dec!(100), dec!(0.01))).unwrap_err().contains("Discount"));
        assert_eq!(purchase_totals(&order(dec!(100), dec!(0))).unwrap().total, dec!(0));
    }

    #[test]
    fn receipt_cost_prefers_the_running_average() {
        assert_eq!(receipt_cost(dec!(12.5), dec!(10)), dec!(12.5));
        assert_eq!(receipt_cost(dec!(0), dec!(10)), dec!(10));
    }
}
