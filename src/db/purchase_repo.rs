// src/db/purchase_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::purchase::{GrnHeader, GrnLine, NewGoodsReceipt, NewPurchaseLine, NewPurchaseOrder, GRN_OPEN, PO_OPEN},
};

#[derive(Clone, Default)]
pub struct PurchaseRepository;

impl PurchaseRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  ORDER ENTRY
    // =========================================================================

    pub async fn insert_order<'e, E>(&self, executor: E, order: &NewPurchaseOrder<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO poord (
                zid, xpornum, xdate, xsup, xwh, xstatuspor, xproj, xsupref, xrem,
                xdisc, xdtwotax, xdtdisc, xdiscamt, xtotamt, xmember
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(order.zid)
        .bind(order.po_number)
        .bind(order.date)
        .bind(order.supplier)
        .bind(order.warehouse)
        .bind(PO_OPEN)
        .bind(order.project)
        .bind(order.supplier_ref)
        .bind(order.remarks)
        .bind(order.discount_percent)
        .bind(order.totals.subtotal)
        .bind(order.fixed_discount)
        .bind(order.totals.discount)
        .bind(order.totals.total)
        .bind(order.member)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_order_line<'e, E>(&self, executor: E, line: &NewPurchaseLine<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO poodt (zid, xpornum, xrow, xitem, xwh, xqtyord, xqtygrn, xrate, xlineamt)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8)
            "#,
        )
        .bind(line.zid)
        .bind(line.po_number)
        .bind(line.row)
        .bind(line.item)
        .bind(line.warehouse)
        .bind(line.quantity)
        .bind(line.rate)
        .bind(line.line_amount)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_grn<'e, E>(&self, executor: E, grn: &NewGoodsReceipt<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO pogrn (zid, xgrnnum, xpornum, xdate, xwh, xsup, xproj, xstatusgrn, xrem, xtotamt)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(grn.zid)
        .bind(grn.grn_number)
        .bind(grn.po_number)
        .bind(grn.date)
        .bind(grn.warehouse)
        .bind(grn.supplier)
        .bind(grn.project)
        .bind(GRN_OPEN)
        .bind(grn.remarks)
        .bind(grn.total)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_grn_line<'e, E>(
        &self,
        executor: E,
        grn_number: &str,
        line: &NewPurchaseLine<'_>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO pogdt (zid, xgrnnum, xrow, xitem, xqty, xrate, xstatusgdt, xpornum, xlineamt)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(line.zid)
        .bind(grn_number)
        .bind(line.row)
        .bind(line.item)
        .bind(line.quantity)
        .bind(line.rate)
        .bind(GRN_OPEN)
        .bind(line.po_number)
        .bind(line.line_amount)
        .execute(executor)
        .await?;

        Ok(())
    }

    // =========================================================================
    //  GRN CONFIRMATION
    // =========================================================================

    /// Locks the GRN header for the rest of the transaction.
    pub async fn lock_grn<'e, E>(&self, executor: E, zid: i32, grn: &str) -> Result<Option<GrnHeader>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let header = sqlx::query_as::<_, GrnHeader>(
            r#"
            SELECT xgrnnum, xpornum, xdate, xwh, xsup, xproj, xstatusgrn
            FROM pogrn
            WHERE zid = $1 AND xgrnnum = $2
            FOR UPDATE
            "#,
        )
        .bind(zid)
        .bind(grn)
        .fetch_optional(executor)
        .await?;

        Ok(header)
    }

    pub async fn grn_lines<'e, E>(&self, executor: E, zid: i32, grn: &str) -> Result<Vec<GrnLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, GrnLine>(
            "SELECT xrow, xitem, xqty, xrate FROM pogdt WHERE zid = $1 AND xgrnnum = $2 ORDER BY xrow",
        )
        .bind(zid)
        .bind(grn)
        .fetch_all(executor)
        .await?;

        Ok(lines)
    }

    pub async fn set_grn_status<'e, E>(&self, executor: E, zid: i32, grn: &str, status: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE pogrn SET xstatusgrn = $3 WHERE zid = $1 AND xgrnnum = $2")
            .bind(zid)
            .bind(grn)
            .bind(status)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn set_grn_line_status<'e, E>(&self, executor: E, zid: i32, grn: &str, status: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE pogdt SET xstatusgdt = $3 WHERE zid = $1 AND xgrnnum = $2")
            .bind(zid)
            .bind(grn)
            .bind(status)
            .execute(executor)
            .await?;

        Ok(())
    }
}
