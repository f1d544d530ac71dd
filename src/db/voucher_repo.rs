// src/db/voucher_repo.rs

use sqlx::PgConnection;

use crate::{
    common::db_utils::{is_sql_identifier, like_prefix_pattern},
    models::voucher::VoucherTarget,
};

/// Numeric value of the first digit run after the prefix (`$3`).
///
/// Suffixed or oddly padded vouchers (`RE--000003-X`, `RE--0050`) rank by
/// their number, never by their length or spelling.
fn sequence_expr(column: &str) -> String {
    format!("substring(substr({column}, char_length($3) + 1) from '[0-9]+')::numeric")
}

/// Reads the highest existing voucher of a series and locks its row.
pub async fn last_voucher_for_update(
    conn: &mut PgConnection,
    zid: i32,
    target: &VoucherTarget<'_>,
) -> Result<Option<String>, sqlx::Error> {
    if !is_sql_identifier(target.table) || !is_sql_identifier(target.column) {
        return Err(sqlx::Error::Protocol(format!(
            "invalid voucher target {}.{}",
            target.table, target.column
        )));
    }

    let column = target.column;
    let action_filter = if target.action.is_some() { "AND xaction = $4" } else { "" };
    let sql = format!(
        r#"
        SELECT {column}
        FROM {table}
        WHERE zid = $1 AND {column} LIKE $2 {action_filter}
        ORDER BY {sequence} DESC NULLS LAST, {column} DESC
        LIMIT 1
        FOR UPDATE
        "#,
        table = target.table,
        sequence = sequence_expr(column),
    );

    let mut query = sqlx::query_scalar::<_, Option<String>>(&sql)
        .bind(zid)
        .bind(like_prefix_pattern(target.prefix))
        .bind(target.prefix);
    if let Some(action) = target.action {
        query = query.bind(action);
    }

    Ok(query.fetch_optional(conn).await?.flatten())
}

/// Highest `glheader` voucher starting with `base_prefix` (e.g. `SINV0325-`).
pub async fn last_gl_voucher_for_update(
    conn: &mut PgConnection,
    zid: i32,
    base_prefix: &str,
) -> Result<Option<String>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT xvoucher
        FROM glheader
        WHERE zid = $1 AND xvoucher LIKE $2
        ORDER BY {} DESC NULLS LAST, xvoucher DESC
        LIMIT 1
        FOR UPDATE
        "#,
        sequence_expr("xvoucher")
    );

    sqlx::query_scalar::<_, String>(&sql)
        .bind(zid)
        .bind(like_prefix_pattern(base_prefix))
        .bind(base_prefix)
        .fetch_optional(conn)
        .await
}
