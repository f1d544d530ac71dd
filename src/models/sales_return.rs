// src/models/sales_return.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    ledger::{GlDetailRow, JournalLine},
    sales::{validate_not_negative, validate_positive},
};

/// `imtrn.xdoctype` of return movements.
pub const RETURN_DOC_TYPE: &str = "SRE-";
/// `glheader.xtrngl` of return journals.
pub const RETURN_TRANSACTION_CODE: &str = "SRE";
pub const RETURN_CONFIRMED: &str = "Confirmed";

/// How the customer is paid back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RefundMethod {
    #[default]
    Cash,
    /// Credited to the customer's receivable account.
    Credit,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReturnLinePayload {
    #[validate(length(min = 1, message = "Item code is required."))]
    #[schema(example = "FG-000123")]
    pub item: String,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "1")]
    pub quantity: Decimal,

    /// Refund per unit.
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "450.00")]
    pub rate: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReturnPayload {
    /// Sale being returned against. When given, returned quantities are
    /// capped by what that order sold and goods come back at its cost.
    #[schema(example = "CO--000218")]
    pub order_number: Option<String>,

    pub customer: Option<String>,

    #[validate(length(min = 1, message = "Warehouse is required."))]
    #[schema(example = "Fixit Gulshan")]
    pub warehouse: String,

    pub project: Option<String>,

    #[serde(default)]
    pub refund: RefundMethod,

    pub notes: Option<String>,

    /// Defaults to today.
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,

    #[validate(length(min = 1, message = "A return needs at least one line."), nested)]
    pub lines: Vec<SalesReturnLinePayload>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReturnLine {
    pub row: i32,
    pub item: String,
    #[schema(example = "SRE000017")]
    pub movement_number: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub refund_amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReturnReceipt {
    #[schema(example = "SRE-000004")]
    pub return_number: String,
    /// Journal voucher posted for the return.
    #[schema(example = "SALE000031")]
    pub voucher: String,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub refund_total: Decimal,
    pub inventory_value: Decimal,
    pub lines: Vec<SalesReturnLine>,
    pub journal: Vec<JournalLine>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReturnDeletion {
    pub return_number: String,
    pub voucher: Option<String>,
    pub movements_deleted: u64,
    pub lines_deleted: u64,
    pub details_deleted: u64,
    pub headers_deleted: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReturnDetail {
    #[serde(flatten)]
    pub header: ReturnHeader,
    pub lines: Vec<ReturnLineRow>,
    pub journal: Vec<GlDetailRow>,
}

// --- Persisted rows ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnHeader {
    pub ximtmptrn: String,
    #[schema(value_type = String, format = Date)]
    pub xdate: NaiveDate,
    pub xwh: String,
    pub xcus: Option<String>,
    pub xordernum: Option<String>,
    pub xglref: Option<String>,
    pub xstatustrn: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLineRow {
    pub xtorlno: i32,
    pub xitem: String,
    pub xqtyord: Decimal,
    pub ximtrnnum: String,
    pub xrate: Decimal,
    pub xval: Decimal,
    pub xlineamt: Decimal,
}

/// What one order sold of an item: quantity and total cost.
#[derive(Debug, Clone, FromRow)]
pub struct SoldItem {
    pub xitem: String,
    pub quantity: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewReturnHeader<'a> {
    pub zid: i32,
    pub number: &'a str,
    pub date: NaiveDate,
    pub warehouse: &'a str,
    pub customer: Option<&'a str>,
    pub order_number: Option<&'a str>,
    pub project: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub voucher: &'a str,
    pub member: &'a str,
}

#[derive(Debug, Clone)]
pub struct NewReturnLine<'a> {
    pub zid: i32,
    pub number: &'a str,
    pub row: i32,
    pub item: &'a str,
    pub quantity: Decimal,
    pub movement_number: &'a str,
    pub unit_cost: Decimal,
    pub value: Decimal,
    pub refund_amount: Decimal,
}

/// GL accounts a return journal posts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnAccounts {
    pub sales: String,
    pub cash: String,
    pub receivable: String,
    pub inventory: String,
    pub cost_of_sales: String,
    pub project: String,
}
