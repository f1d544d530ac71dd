// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::rbac::{ModuleAccessRow, PermissionAction},
};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// True when one of the user's active groups is granted `action` on
    /// `module_code` inside business `zid`, and the user can access that business.
    pub async fn user_has_permission(
        &self,
        user_id: Uuid,
        zid: i32,
        module_code: &str,
        action: PermissionAction,
    ) -> Result<bool, AppError> {
        // `column()` only yields fixed column names.
        let sql = format!(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM business_module_group_access a
                JOIN businesses b ON b.id = a.business_id
                JOIN modules m ON m.id = a.module_id
                JOIN permission_groups g ON g.id = a.group_id
                JOIN user_group_memberships ug ON ug.group_id = a.group_id
                JOIN user_business_access uba
                    ON uba.business_id = b.id AND uba.user_id = ug.user_id
                WHERE ug.user_id = $1
                  AND b.zid = $2
                  AND m.code = $3
                  AND b.is_active AND m.is_active AND g.is_active
                  AND a.{}
            )
            "#,
            action.column()
        );

        let allowed = sqlx::query_scalar::<_, bool>(&sql)
            .bind(user_id)
            .bind(zid)
            .bind(module_code)
            .fetch_one(&self.pool)
            .await?;

        Ok(allowed)
    }

    pub async fn module_access_rows(&self, user_id: Uuid, zid: i32) -> Result<Vec<ModuleAccessRow>, AppError> {
        let rows = sqlx::query_as::<_, ModuleAccessRow>(
            r#"
            SELECT m.code,
                   bool_or(a.can_view)   AS can_view,
                   bool_or(a.can_create) AS can_create,
                   bool_or(a.can_edit)   AS can_edit,
                   bool_or(a.can_delete) AS can_delete
            FROM business_module_group_access a
            JOIN businesses b ON b.id = a.business_id
            JOIN modules m ON m.id = a.module_id
            JOIN permission_groups g ON g.id = a.group_id
            JOIN user_group_memberships ug ON ug.group_id = a.group_id
            JOIN user_business_access uba
                ON uba.business_id = b.id AND uba.user_id = ug.user_id
            WHERE ug.user_id = $1 AND b.zid = $2
              AND b.is_active AND m.is_active AND g.is_active
            GROUP BY m.code
            ORDER BY m.code
            "#,
        )
        .bind(user_id)
        .bind(zid)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Id of the named group, created on first use.
    pub async fn ensure_group<'e, E>(&self, executor: E, name: &str) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO permission_groups (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    pub async fn active_module_codes<'e, E>(&self, executor: E) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let codes = sqlx::query_scalar::<_, String>("SELECT code FROM modules WHERE is_active ORDER BY code")
            .fetch_all(executor)
            .await?;

        Ok(codes)
    }

    pub async fn add_member<'e, E>(&self, executor: E, user_id: Uuid, group_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO user_group_memberships (user_id, group_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(group_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Grants `actions` (and nothing else) on a module to a group within one business.
    pub async fn grant_module<'e, E>(
        &self,
        executor: E,
        zid: i32,
        module_code: &str,
        group_id: i32,
        actions: &[PermissionAction],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let has = |action| actions.contains(&action);

        let result = sqlx::query(
            r#"
            INSERT INTO business_module_group_access
                (business_id, module_id, group_id, can_view, can_create, can_edit, can_delete)
            SELECT b.id, m.id, $3, $4, $5, $6, $7
            FROM businesses b, modules m
            WHERE b.zid = $1 AND m.code = $2
            ON CONFLICT (business_id, module_id, group_id) DO UPDATE
            SET can_view = EXCLUDED.can_view,
                can_create = EXCLUDED.can_create,
                can_edit = EXCLUDED.can_edit,
                can_delete = EXCLUDED.can_delete
            "#,
        )
        .bind(zid)
        .bind(module_code)
        .bind(group_id)
        .bind(has(PermissionAction::View))
        .bind(has(PermissionAction::Create))
        .bind(has(PermissionAction::Edit))
        .bind(has(PermissionAction::Delete))
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Unknown business {} or module '{}'.",
                zid, module_code
            )));
        }

        Ok(())
    }
}
