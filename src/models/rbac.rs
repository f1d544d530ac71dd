// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    View,
    Create,
    Edit,
    Delete,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 4] = [
        PermissionAction::View,
        PermissionAction::Create,
        PermissionAction::Edit,
        PermissionAction::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionAction::View => "view",
            PermissionAction::Create => "create",
            PermissionAction::Edit => "edit",
            PermissionAction::Delete => "delete",
        }
    }

    /// Flag column in `business_module_group_access`.
    pub fn column(self) -> &'static str {
        match self {
            PermissionAction::View => "can_view",
            PermissionAction::Create => "can_create",
            PermissionAction::Edit => "can_edit",
            PermissionAction::Delete => "can_delete",
        }
    }
}

// One row per module, flags OR-ed across every group the user belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct ModuleAccessRow {
    pub code: String,
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl ModuleAccessRow {
    pub fn actions(&self) -> Vec<PermissionAction> {
        PermissionAction::ALL
            .into_iter()
            .filter(|action| match action {
                PermissionAction::View => self.can_view,
                PermissionAction::Create => self.can_create,
                PermissionAction::Edit => self.can_edit,
                PermissionAction::Delete => self.can_delete,
            })
            .collect()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModulePermissions {
    pub zid: i32,
    /// Superusers get every action on every module; `modules` is empty for them.
    pub all_modules: bool,
    pub modules: BTreeMap<String, Vec<PermissionAction>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_follow_the_granted_flags() {
        let row = ModuleAccessRow {
            code: "day_end_process".into(),
            can_view: true,
            can_create: true,
            can_edit: false,
            can_delete: false,
        };
        assert_eq!(row.actions(), vec![PermissionAction::View, PermissionAction::Create]);
    }

    #[test]
    fn every_action_has_a_flag_column() {
        let columns: Vec<_> = PermissionAction::ALL.iter().map(|a| a.column()).collect();
        assert_eq!(columns, ["can_view", "can_create", "can_edit", "can_delete"]);
    }
}
