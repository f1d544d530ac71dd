// src/models/tenancy.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    #[schema(ignore)]
    pub id: i32,

    #[schema(example = 100001)]
    pub zid: i32,

    #[schema(example = "HMBR Gulshan")]
    pub name: String,

    pub is_active: bool,
}
