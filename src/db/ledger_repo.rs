// src/db/ledger_repo.rs

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::ledger::{BankAmount, GlDetailRow, JournalLine, NewGlHeader, SalesAggregate, SALES_TRANSACTION_CODE},
};

#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  LOOKUPS
    // =========================================================================

    /// Voucher of the sales journal carrying `reference`, if one was posted.
    pub async fn find_sales_voucher_by_reference<'e, E>(
        &self,
        executor: E,
        zid: i32,
        reference: &str,
    ) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let voucher = sqlx::query_scalar::<_, String>(
            r#"
            SELECT xvoucher FROM glheader
            WHERE zid = $1 AND xref = $2 AND xtrngl = $3
            LIMIT 1
            "#,
        )
        .bind(zid)
        .bind(reference)
        .bind(SALES_TRANSACTION_CODE)
        .fetch_optional(executor)
        .await?;

        Ok(voucher)
    }

    /// First `glmst` account whose description matches the `LIKE` pattern.
    pub async fn find_account<'e, E>(&self, executor: E, zid: i32, description: &str) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_scalar::<_, String>(
            "SELECT xacc FROM glmst WHERE zid = $1 AND xdesc LIKE $2 ORDER BY xacc LIMIT 1",
        )
        .bind(zid)
        .bind(description)
        .fetch_optional(executor)
        .await?;

        Ok(account)
    }

    pub async fn find_project_code<'e, E>(&self, executor: E, zid: i32) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let code = sqlx::query_scalar::<_, String>(
            "SELECT xcode FROM xcodes WHERE zid = $1 AND xtype = 'Project' ORDER BY xcode LIMIT 1",
        )
        .bind(zid)
        .fetch_optional(executor)
        .await?;

        Ok(code)
    }

    // =========================================================================
    //  SALES AGGREGATION
    // =========================================================================

    /// Sums the confirmed sales of one day by payment channel.
    pub async fn aggregate_sales(&self, conn: &mut PgConnection, zid: i32, date: NaiveDate) -> Result<SalesAggregate, AppError> {
        let (order_count, total_amount, cash_amount, discount_amount) =
            sqlx::query_as::<_, (i64, Decimal, Decimal, Decimal)>(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(xtotamt), 0),
                       COALESCE(SUM(xlineamt), 0),
                       COALESCE(SUM(xdtdisc), 0) + COALESCE(SUM(xdiscf), 0)
                FROM opordnview
                WHERE zid = $1 AND xdate = $2
                "#,
            )
            .bind(zid)
            .bind(date)
            .fetch_one(&mut *conn)
            .await?;

        let bank_amounts = sqlx::query_as::<_, BankAmount>(
            r#"
            SELECT COALESCE(xsalescat, '') AS bank, COALESCE(SUM(xdtcomm), 0) AS amount
            FROM opordnview
            WHERE zid = $1 AND xdate = $2 AND xsltype = 'Card Sale'
            GROUP BY COALESCE(xsalescat, '')
            ORDER BY 1
            "#,
        )
        .bind(zid)
        .bind(date)
        .fetch_all(&mut *conn)
        .await?;

        Ok(SalesAggregate {
            order_count,
            total_amount,
            cash_amount,
            bank_amounts,
            discount_amount,
        })
    }

    // =========================================================================
    //  JOURNAL WRITES
    // =========================================================================

    pub async fn insert_header<'e, E>(&self, executor: E, header: &NewGlHeader<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO glheader (
                zid, xvoucher, xref, xdate, xlong, xpostflag,
                xyear, xper, xstatusjv, xdatedue, xnumofper, xtrngl,
                xmember, xapproved, xaction
            )
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, 'Balanced', $4, 0, $8, $9, 1, 'Journal')
            "#,
        )
        .bind(header.zid)
        .bind(header.voucher)
        .bind(header.reference)
        .bind(header.date)
        .bind(header.narration)
        .bind(header.date.year())
        .bind(header.date.month() as i32)
        .bind(header.transaction_code)
        .bind(header.member)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_detail<'e, E>(
        &self,
        executor: E,
        zid: i32,
        voucher: &str,
        date: NaiveDate,
        project: &str,
        line: &JournalLine,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO gldetail (
                zid, xvoucher, xrow, xacc, xsub, xaccusage, xaccsource,
                xproj, xcur, xexch, xprime, xbase, xacctype, xinvnum,
                xdateapp, xexchval, xdateclr, xdatedue
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'BDT', 1, $9, $9, $10, $2, $11, 1, $11, $11)
            "#,
        )
        .bind(zid)
        .bind(voucher)
        .bind(line.row)
        .bind(&line.account)
        .bind(line.sub_account.as_deref())
        .bind(line.usage.as_str())
        .bind(line.source.as_str())
        .bind(project)
        .bind(line.amount)
        .bind(line.account_type.as_str())
        .bind(date)
        .execute(executor)
        .await
        .map_err(|e| {
            tracing::error!(voucher, row = line.row, account = %line.account, "GL detail insert failed: {}", e);
            AppError::DatabaseError(e)
        })?;

        Ok(())
    }

    pub async fn delete_details<'e, E>(&self, executor: E, zid: i32, voucher: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM gldetail WHERE zid = $1 AND xvoucher = $2")
            .bind(zid)
            .bind(voucher)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_header<'e, E>(&self, executor: E, zid: i32, voucher: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM glheader WHERE zid = $1 AND xvoucher = $2")
            .bind(zid)
            .bind(voucher)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_details(&self, zid: i32, voucher: &str) -> Result<Vec<GlDetailRow>, AppError> {
        let rows = sqlx::query_as::<_, GlDetailRow>(
            r#"
            SELECT xvoucher, xrow, xacc, xsub, xaccusage, xprime, xacctype
            FROM gldetail
            WHERE zid = $1 AND xvoucher = $2
            ORDER BY xrow
            "#,
        )
        .bind(zid)
        .bind(voucher)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
