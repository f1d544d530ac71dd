// src/models/sales.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const ORDER_CONFIRMED: &str = "Confirmed";
pub const DEFAULT_CUSTOMER: &str = "CUS-000001";

pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("Value cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("Value must be greater than zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Credit,
}

impl PaymentMethod {
    /// Value stored in `opord.xsltype`.
    pub fn sale_type(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash Sale",
            PaymentMethod::Card => "Card Sale",
            PaymentMethod::Credit => "Credit Sale",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosLinePayload {
    #[validate(length(min = 1, message = "Item code is required."))]
    #[schema(example = "FG-000123")]
    pub item: String,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "2")]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "450.00")]
    pub rate: Decimal,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub vat: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosSalePayload {
    pub customer: Option<String>,

    #[validate(length(min = 1, message = "Warehouse is required."))]
    #[schema(example = "Fixit Gulshan")]
    pub warehouse: String,

    pub payment_method: PaymentMethod,

    #[schema(example = "DBBL")]
    pub bank_name: Option<String>,

    pub card_number: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub card_amount: Decimal,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub fixed_discount: Decimal,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub percent_discount_amount: Decimal,

    /// Defaults to today.
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,

    #[validate(length(min = 1, message = "A sale needs at least one line."), nested)]
    pub lines: Vec<PosLinePayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub card_amount: Decimal,
    pub cash_amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosReceiptLine {
    pub row: i32,
    pub item: String,
    #[schema(example = "IS--000412")]
    pub issue_number: String,
    pub unit_cost: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosSaleReceipt {
    #[schema(example = "CO--000218")]
    pub order_number: String,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub totals: SaleTotals,
    pub lines: Vec<PosReceiptLine>,
}

/// Header row of `opord`.
#[derive(Debug, Clone)]
pub struct NewSalesOrder<'a> {
    pub zid: i32,
    pub order_number: &'a str,
    pub date: NaiveDate,
    pub customer: &'a str,
    pub warehouse: &'a str,
    pub sale_type: &'a str,
    pub bank: Option<&'a str>,
    pub card_number: Option<&'a str>,
    pub fixed_discount: Decimal,
    pub percent_discount_amount: Decimal,
    pub totals: SaleTotals,
    pub member: &'a str,
}

/// Detail row of `opodt`.
#[derive(Debug, Clone)]
pub struct NewSalesLine<'a> {
    pub zid: i32,
    pub order_number: &'a str,
    pub row: i32,
    pub item: &'a str,
    pub warehouse: &'a str,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub line_amount: Decimal,
    pub vat: Decimal,
    pub issue_number: &'a str,
    pub unit_cost: Decimal,
}
