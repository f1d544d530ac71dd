// src/services/rbac_service.rs

use std::collections::BTreeMap;

use crate::{
    common::error::AppError,
    db::RbacRepository,
    models::{
        auth::User,
        rbac::{ModulePermissions, PermissionAction},
    },
};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
}

impl RbacService {
    pub fn new(repo: RbacRepository) -> Self {
        Self { repo }
    }

    pub async fn has_permission(
        &self,
        user: &User,
        zid: i32,
        module_code: &str,
        action: PermissionAction,
    ) -> Result<bool, AppError> {
        if user.is_superuser {
            return Ok(true);
        }
        self.repo.user_has_permission(user.id, zid, module_code, action).await
    }

    pub async fn module_permissions(&self, user: &User, zid: i32) -> Result<ModulePermissions, AppError> {
        if user.is_superuser {
            return Ok(ModulePermissions { zid, all_modules: true, modules: BTreeMap::new() });
        }

        let modules = self
            .repo
            .module_access_rows(user.id, zid)
            .await?
            .into_iter()
            .map(|row| {
                let actions = row.actions();
                (row.code, actions)
            })
            .filter(|(_, actions)| !actions.is_empty())
            .collect();

        Ok(ModulePermissions { zid, all_modules: false, modules })
    }
}
