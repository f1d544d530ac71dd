// src/common/db_utils.rs

use sqlx::PgConnection;

/// Takes a transaction-scoped advisory lock keyed by `key`.
///
/// The key text is hashed by Postgres so any string (tenant, date, table...)
/// can be used. The lock is released on commit or rollback.
pub async fn acquire_xact_lock(conn: &mut PgConnection, key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(key)
        .execute(conn)
        .await?;
    Ok(())
}

/// True when `name` can be spliced into SQL as an unquoted identifier.
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// `LIKE` pattern matching values that start with `prefix` literally.
pub fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_legacy_table_and_column_names() {
        assert!(is_sql_identifier("imtrn"));
        assert!(is_sql_identifier("ximtrnnum"));
        assert!(is_sql_identifier("_tmp2"));
    }

    #[test]
    fn rejects_anything_that_could_alter_the_query() {
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("imtrn; DROP TABLE imtrn"));
        assert!(!is_sql_identifier("1abc"));
        assert!(!is_sql_identifier("Imtrn"));
        assert!(!is_sql_identifier("gl.header"));
        assert!(!is_sql_identifier(&"a".repeat(64)));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_prefix_pattern("RE--"), "RE--%");
        assert_eq!(like_prefix_pattern("SR_"), "SR\\_%");
        assert_eq!(like_prefix_pattern("50%"), "50\\%%");
    }
}
