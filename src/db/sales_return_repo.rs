// src/db/sales_return_repo.rs

use chrono::Datelike;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::sales_return::{
        NewReturnHeader, NewReturnLine, ReturnHeader, ReturnLineRow, SoldItem, RETURN_CONFIRMED, RETURN_DOC_TYPE,
    },
};

const HEADER_COLUMNS: &str = "ximtmptrn, xdate, xwh, xcus, xordernum, xglref, xstatustrn";

/// Return documents: `imtemptrn` headers and `imtemptdt` lines.
#[derive(Clone, Default)]
pub struct SalesReturnRepository;

impl SalesReturnRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  ORIGINAL SALE
    // =========================================================================

    /// Customer of a confirmed order; `None` when the order does not exist.
    pub async fn find_order_customer<'e, E>(
        &self,
        executor: E,
        zid: i32,
        order_number: &str,
    ) -> Result<Option<Option<String>>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_scalar::<_, Option<String>>(
            "SELECT xcus FROM opord WHERE zid = $1 AND xordernum = $2 AND xstatusord = 'Confirmed'",
        )
        .bind(zid)
        .bind(order_number)
        .fetch_optional(executor)
        .await?;

        Ok(customer)
    }

    pub async fn sold_items<'e, E>(&self, executor: E, zid: i32, order_number: &str) -> Result<Vec<SoldItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SoldItem>(
            r#"
            SELECT xitem, SUM(xqtyord) AS quantity, SUM(xqtyord * xcost) AS cost
            FROM opodt
            WHERE zid = $1 AND xordernum = $2
            GROUP BY xitem
            "#,
        )
        .bind(zid)
        .bind(order_number)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    /// Quantity of each item already returned against an order.
    pub async fn returned_quantities<'e, E>(
        &self,
        executor: E,
        zid: i32,
        order_number: &str,
    ) -> Result<Vec<(String, Decimal)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, (String, Decimal)>(
            r#"
            SELECT d.xitem, SUM(d.xqtyord)
            FROM imtemptdt d
            JOIN imtemptrn h ON h.zid = d.zid AND h.ximtmptrn = d.ximtmptrn
            WHERE h.zid = $1 AND h.xordernum = $2
            GROUP BY d.xitem
            "#,
        )
        .bind(zid)
        .bind(order_number)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    //  RETURN DOCUMENT
    // =========================================================================

    pub async fn insert_header<'e, E>(&self, executor: E, header: &NewReturnHeader<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO imtemptrn (
                zid, ximtmptrn, xdate, xyear, xper, xwh, xcus, xordernum,
                xproj, xref, xglref, xstatustrn, xtrnimt, zemail
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(header.zid)
        .bind(header.number)
        .bind(header.date)
        .bind(header.date.year())
        .bind(header.date.month() as i32)
        .bind(header.warehouse)
        .bind(header.customer)
        .bind(header.order_number)
        .bind(header.project)
        .bind(header.notes)
        .bind(header.voucher)
        .bind(RETURN_CONFIRMED)
        .bind(RETURN_DOC_TYPE)
        .bind(header.member)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_line<'e, E>(&self, executor: E, line: &NewReturnLine<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO imtemptdt (
                zid, ximtmptrn, xtorlno, xitem, xqtyord, ximtrnnum, xrate, xval, xlineamt
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(line.zid)
        .bind(line.number)
        .bind(line.row)
        .bind(line.item)
        .bind(line.quantity)
        .bind(line.movement_number)
        .bind(line.unit_cost)
        .bind(line.value)
        .bind(line.refund_amount)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_header<'e, E>(&self, executor: E, zid: i32, number: &str) -> Result<Option<ReturnHeader>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let header = sqlx::query_as::<_, ReturnHeader>(&format!(
            "SELECT {HEADER_COLUMNS} FROM imtemptrn WHERE zid = $1 AND ximtmptrn = $2"
        ))
        .bind(zid)
        .bind(number)
        .fetch_optional(executor)
        .await?;

        Ok(header)
    }

    /// Locks the header for the rest of the transaction.
    pub async fn lock_header<'e, E>(&self, executor: E, zid: i32, number: &str) -> Result<Option<ReturnHeader>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let header = sqlx::query_as::<_, ReturnHeader>(&format!(
            "SELECT {HEADER_COLUMNS} FROM imtemptrn WHERE zid = $1 AND ximtmptrn = $2 FOR UPDATE"
        ))
        .bind(zid)
        .bind(number)
        .fetch_optional(executor)
        .await?;

        Ok(header)
    }

    pub async fn lines<'e, E>(&self, executor: E, zid: i32, number: &str) -> Result<Vec<ReturnLineRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, ReturnLineRow>(
            r#"
            SELECT xtorlno, xitem, xqtyord, ximtrnnum, xrate, xval, xlineamt
            FROM imtemptdt
            WHERE zid = $1 AND ximtmptrn = $2
            ORDER BY xtorlno
            "#,
        )
        .bind(zid)
        .bind(number)
        .fetch_all(executor)
        .await?;

        Ok(lines)
    }

    pub async fn delete_lines<'e, E>(&self, executor: E, zid: i32, number: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM imtemptdt WHERE zid = $1 AND ximtmptrn = $2")
            .bind(zid)
            .bind(number)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_header<'e, E>(&self, executor: E, zid: i32, number: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM imtemptrn WHERE zid = $1 AND ximtmptrn = $2")
            .bind(zid)
            .bind(number)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
