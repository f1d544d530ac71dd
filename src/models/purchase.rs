// src/models/purchase.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::sales::{validate_not_negative, validate_positive};

pub const PO_OPEN: &str = "1-Open";
pub const GRN_OPEN: &str = "1-Open";
pub const GRN_CONFIRMED: &str = "5-Confirmed";

fn validate_percent(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() || *val > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.message = Some("Percentage must be between 0 and 100.".into());
        return Err(err);
    }
    Ok(())
}

// --- Purchase order entry ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLinePayload {
    #[validate(length(min = 1, message = "Item code is required."))]
    #[schema(example = "RM-000045")]
    pub item: String,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "24")]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "310.50")]
    pub rate: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderPayload {
    #[validate(length(min = 1, message = "Supplier is required."))]
    #[schema(example = "SUP-000003")]
    pub supplier: String,

    #[validate(length(min = 1, message = "Warehouse is required."))]
    pub warehouse: String,

    pub project: Option<String>,
    pub supplier_ref: Option<String>,
    pub remarks: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_percent"))]
    pub discount_percent: Decimal,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub fixed_discount: Decimal,

    /// Defaults to today.
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,

    #[validate(length(min = 1, message = "An order needs at least one line."), nested)]
    pub lines: Vec<PurchaseLinePayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTotals {
    pub subtotal: Decimal,
    /// Percentage part plus the fixed part.
    pub discount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderCreated {
    #[schema(example = "PO--000012")]
    pub po_number: String,
    /// Open GRN waiting for confirmation.
    #[schema(example = "GRN-000031")]
    pub grn_number: String,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub totals: PurchaseTotals,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseOrder<'a> {
    pub zid: i32,
    pub po_number: &'a str,
    pub date: NaiveDate,
    pub supplier: &'a str,
    pub warehouse: &'a str,
    pub project: Option<&'a str>,
    pub supplier_ref: Option<&'a str>,
    pub remarks: Option<&'a str>,
    pub discount_percent: Decimal,
    pub fixed_discount: Decimal,
    pub totals: PurchaseTotals,
    pub member: &'a str,
}

#[derive(Debug, Clone)]
pub struct NewGoodsReceipt<'a> {
    pub zid: i32,
    pub grn_number: &'a str,
    pub po_number: &'a str,
    pub date: NaiveDate,
    pub supplier: &'a str,
    pub warehouse: &'a str,
    pub project: Option<&'a str>,
    pub remarks: Option<&'a str>,
    pub total: Decimal,
}

/// One line, written to `poodt` under the order and `pogdt` under the GRN.
#[derive(Debug, Clone)]
pub struct NewPurchaseLine<'a> {
    pub zid: i32,
    pub po_number: &'a str,
    pub row: i32,
    pub item: &'a str,
    pub warehouse: &'a str,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub line_amount: Decimal,
}

// --- GRN confirmation ---

#[derive(Debug, Clone, FromRow)]
pub struct GrnHeader {
    pub xgrnnum: String,
    pub xpornum: Option<String>,
    pub xdate: Option<NaiveDate>,
    pub xwh: String,
    pub xsup: Option<String>,
    pub xproj: Option<String>,
    pub xstatusgrn: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct GrnLine {
    pub xrow: i32,
    pub xitem: String,
    pub xqty: Decimal,
    pub xrate: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrnConfirmation {
    #[schema(example = "GRN-000031")]
    pub grn: String,
    /// `RE--` inventory receipt numbers, one per GRN line.
    pub receipts: Vec<String>,
}
