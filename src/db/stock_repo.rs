// src/db/stock_repo.rs

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::inventory::NewStockMovement};

/// Access to the `imtrn` inventory ledger. Every query runs on the caller's
/// transaction.
#[derive(Clone, Default)]
pub struct StockRepository;

impl StockRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn on_hand<'e, E>(&self, executor: E, zid: i32, item: &str, warehouse: &str) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let qty = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(xqty * xsign), 0)
            FROM imtrn
            WHERE zid = $1 AND xitem = $2 AND xwh = $3
            "#,
        )
        .bind(zid)
        .bind(item)
        .bind(warehouse)
        .fetch_one(executor)
        .await?;

        Ok(qty)
    }

    /// (signed value, signed quantity) of an item across all warehouses,
    /// counting only movements dated on or before `as_of`.
    pub async fn valuation<'e, E>(
        &self,
        executor: E,
        zid: i32,
        item: &str,
        as_of: NaiveDate,
    ) -> Result<(Decimal, Decimal), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(xval * xsign), 0), COALESCE(SUM(xqty * xsign), 0)
            FROM imtrn
            WHERE zid = $1 AND xitem = $2 AND xdate <= $3
            "#,
        )
        .bind(zid)
        .bind(item)
        .bind(as_of)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    pub async fn standard_cost<'e, E>(&self, executor: E, zid: i32, item: &str) -> Result<Option<Decimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cost = sqlx::query_scalar::<_, Decimal>("SELECT xstdcost FROM caitem WHERE zid = $1 AND xitem = $2")
            .bind(zid)
            .bind(item)
            .fetch_optional(executor)
            .await?;

        Ok(cost)
    }

    pub async fn record_movement<'e, E>(&self, executor: E, movement: &NewStockMovement<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO imtrn (
                zid, ximtrnnum, xitem, xwh, xdate, xyear, xper,
                xqty, xval, xrate, xdoctype, xdocnum, xdocrow, xnote,
                xsup, xcus, xproj, xaction, xsign, zemail, xtrnim
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            "#,
        )
        .bind(movement.zid)
        .bind(movement.number)
        .bind(movement.item)
        .bind(movement.warehouse)
        .bind(movement.date)
        .bind(movement.date.year())
        .bind(movement.date.month() as i32)
        .bind(movement.quantity)
        .bind(movement.value)
        .bind(movement.rate)
        .bind(movement.doc_type)
        .bind(movement.doc_number)
        .bind(movement.doc_row)
        .bind(movement.note)
        .bind(movement.supplier)
        .bind(movement.customer)
        .bind(movement.project)
        .bind(movement.direction.action())
        .bind(movement.direction.sign())
        .bind(movement.member)
        .bind(movement.doc_type)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Removes every movement a document wrote.
    pub async fn delete_for_document<'e, E>(
        &self,
        executor: E,
        zid: i32,
        doc_type: &str,
        doc_number: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM imtrn WHERE zid = $1 AND xdoctype = $2 AND xdocnum = $3")
            .bind(zid)
            .bind(doc_type)
            .bind(doc_number)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
