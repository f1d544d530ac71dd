// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::tenancy::Business};

#[derive(Clone)]
pub struct BusinessRepository {
    pool: PgPool,
}

impl BusinessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_active_by_zid(&self, zid: i32) -> Result<Option<Business>, AppError> {
        let business = sqlx::query_as::<_, Business>(
            "SELECT id, zid, name, is_active FROM businesses WHERE zid = $1 AND is_active",
        )
        .bind(zid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(business)
    }

    /// Direct grant only; superuser bypass is decided by the caller.
    pub async fn user_has_access(&self, user_id: Uuid, zid: i32) -> Result<bool, AppError> {
        let has_access = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_business_access uba
                JOIN businesses b ON b.id = uba.business_id
                WHERE uba.user_id = $1 AND b.zid = $2 AND b.is_active
            )
            "#,
        )
        .bind(user_id)
        .bind(zid)
        .fetch_one(&self.pool)
        .await?;

        Ok(has_access)
    }

    /// Creates the business, or renames it when the `zid` already exists.
    pub async fn upsert_business<'e, E>(&self, executor: E, zid: i32, name: &str) -> Result<Business, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let business = sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses (zid, name)
            VALUES ($1, $2)
            ON CONFLICT (zid) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, zid, name, is_active
            "#,
        )
        .bind(zid)
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(business)
    }

    pub async fn grant_access<'e, E>(&self, executor: E, user_id: Uuid, zid: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO user_business_access (user_id, business_id)
            SELECT $1, id FROM businesses WHERE zid = $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(zid)
        .execute(executor)
        .await?;

        Ok(())
    }
}
