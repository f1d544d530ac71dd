// src/services/setup_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BusinessRepository, RbacRepository, UserRepository},
    models::rbac::PermissionAction,
    services::auth::AuthService,
};

pub const ADMIN_GROUP: &str = "admins";

#[derive(Debug)]
pub struct SeededAdmin {
    pub user_id: Uuid,
    pub zid: i32,
    pub created_user: bool,
    pub modules: Vec<String>,
}

/// First-run bootstrap: one business, one administrator with every action
/// on every module of that business.
#[derive(Clone)]
pub struct SetupService {
    pool: PgPool,
    user_repo: UserRepository,
    business_repo: BusinessRepository,
    rbac_repo: RbacRepository,
}

impl SetupService {
    pub fn new(
        pool: PgPool,
        user_repo: UserRepository,
        business_repo: BusinessRepository,
        rbac_repo: RbacRepository,
    ) -> Self {
        Self { pool, user_repo, business_repo, rbac_repo }
    }

    /// Safe to run on every start. An existing user keeps its password.
    pub async fn seed_admin(
        &self,
        zid: i32,
        business_name: &str,
        username: &str,
        password: &str,
    ) -> Result<SeededAdmin, AppError> {
        let existing = self.user_repo.find_by_username(username).await?;

        let mut tx = self.pool.begin().await?;

        self.business_repo.upsert_business(&mut *tx, zid, business_name).await?;

        let (user_id, created_user) = match existing {
            Some(user) => (user.id, false),
            None => {
                let hash = AuthService::hash_password(password).await?;
                let user = self.user_repo.create_user(&mut *tx, username, None, &hash, false).await?;
                (user.id, true)
            }
        };

        self.business_repo.grant_access(&mut *tx, user_id, zid).await?;

        let group = self.rbac_repo.ensure_group(&mut *tx, ADMIN_GROUP).await?;
        self.rbac_repo.add_member(&mut *tx, user_id, group).await?;

        let modules = self.rbac_repo.active_module_codes(&mut *tx).await?;
        for module in &modules {
            self.rbac_repo
                .grant_module(&mut *tx, zid, module, group, &PermissionAction::ALL)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(zid, user = %username, created_user, modules = modules.len(), "Administrator seeded");

        Ok(SeededAdmin { user_id, zid, created_user, modules })
    }
}
