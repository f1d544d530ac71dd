// src/services/voucher_service.rs

use chrono::{Datelike, NaiveDate};
use sqlx::{PgConnection, PgPool};

use crate::{
    common::{db_utils::acquire_xact_lock, error::AppError},
    db::voucher_repo,
    models::voucher::{SeriesLayout, VoucherSeries, VoucherTarget},
};

/// Numeric part of `voucher` after `prefix`: the first run of digits, 0 if none.
///
/// `None` when the digit run does not fit in a `u64`.
pub fn parse_sequence(voucher: &str, prefix: &str) -> Option<u64> {
    let Some(rest) = voucher.strip_prefix(prefix) else {
        return Some(0);
    };
    let digits: String = rest
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return Some(0);
    }
    digits.parse().ok()
}

/// Number following `last` in its series.
fn next_sequence(last: Option<&str>, prefix: &str) -> Result<u64, AppError> {
    let Some(last) = last else {
        return Ok(1);
    };
    parse_sequence(last, prefix)
        .and_then(|n| n.checked_add(1))
        .ok_or_else(|| AppError::VoucherGeneration(format!("sequence of {} is out of range", last)))
}

pub fn format_voucher(prefix: &str, number: u64, width: usize) -> String {
    format!("{prefix}{number:0width$}")
}

/// `SINV` + March 2025 -> `SINV0325-`.
pub fn monthly_prefix(prefix: &str, date: NaiveDate) -> String {
    format!("{}{:02}{:02}-", prefix, date.month(), date.year() % 100)
}

fn lock_key(zid: i32, table: &str, column: &str, prefix: &str) -> String {
    format!("voucher:{zid}:{table}.{column}:{prefix}")
}

/// Allocates prefixed document numbers.
///
/// Every allocation runs on the caller's open transaction and holds a
/// transaction-scoped lock for the (business, series) pair until that
/// transaction ends, so the caller must insert the row carrying the number
/// before committing. Two callers can never observe the same "last" voucher.
#[derive(Clone, Default)]
pub struct VoucherService;

impl VoucherService {
    pub fn new() -> Self {
        Self
    }

    pub async fn next_voucher(
        &self,
        conn: &mut PgConnection,
        zid: i32,
        target: &VoucherTarget<'_>,
    ) -> Result<String, AppError> {
        if target.prefix.is_empty() {
            return Err(AppError::VoucherGeneration("empty prefix".into()));
        }

        self.allocate(conn, zid, target).await.inspect_err(|e| {
            tracing::error!(
                zid,
                table = target.table,
                column = target.column,
                prefix = target.prefix,
                "Error generating voucher number: {}",
                e
            );
        })
    }

    async fn allocate(
        &self,
        conn: &mut PgConnection,
        zid: i32,
        target: &VoucherTarget<'_>,
    ) -> Result<String, AppError> {
        let as_voucher_error = |e: sqlx::Error| AppError::VoucherGeneration(e.to_string());

        acquire_xact_lock(&mut *conn, &lock_key(zid, target.table, target.column, target.prefix))
            .await
            .map_err(as_voucher_error)?;

        let last = voucher_repo::last_voucher_for_update(conn, zid, target)
            .await
            .map_err(as_voucher_error)?;
        let next = next_sequence(last.as_deref(), target.prefix)?;

        Ok(format_voucher(target.prefix, next, target.width))
    }

    /// `{prefix}{MM}{YY}-{serial:06}` on `glheader`; the serial restarts each month.
    pub async fn next_monthly_voucher(
        &self,
        conn: &mut PgConnection,
        zid: i32,
        prefix: &str,
        date: NaiveDate,
    ) -> Result<String, AppError> {
        let base = monthly_prefix(prefix, date);

        let result: Result<String, AppError> = async {
            let as_voucher_error = |e: sqlx::Error| AppError::VoucherGeneration(e.to_string());
            acquire_xact_lock(&mut *conn, &lock_key(zid, "glheader", "xvoucher", &base))
                .await
                .map_err(as_voucher_error)?;
            let last = voucher_repo::last_gl_voucher_for_update(&mut *conn, zid, &base)
                .await
                .map_err(as_voucher_error)?;
            let next = next_sequence(last.as_deref(), &base)?;
            Ok(format_voucher(&base, next, 6))
        }
        .await;

        match result {
            Ok(voucher) => {
                tracing::info!(zid, voucher = %voucher, "Generated monthly voucher");
                Ok(voucher)
            }
            Err(e) => {
                tracing::error!(zid, prefix, "Error generating monthly voucher: {}", e);
                Err(e)
            }
        }
    }

    pub async fn next_in_series(
        &self,
        conn: &mut PgConnection,
        zid: i32,
        series: VoucherSeries,
        today: NaiveDate,
    ) -> Result<String, AppError> {
        match series.layout() {
            SeriesLayout::Sequential(target) => self.next_voucher(conn, zid, &target).await,
            SeriesLayout::Monthly { prefix } => self.next_monthly_voucher(conn, zid, prefix, today).await,
        }
    }

    /// The number the next caller would get. Nothing is reserved.
    pub async fn preview(
        &self,
        pool: &PgPool,
        zid: i32,
        series: VoucherSeries,
        today: NaiveDate,
    ) -> Result<String, AppError> {
        let mut tx = pool.begin().await?;
        let voucher = self.next_in_series(&mut *tx, zid, series, today).await?;
        tx.rollback().await?;
        Ok(voucher)
    }
}
