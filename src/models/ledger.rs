// src/models/ledger.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const SALES_TRANSACTION_CODE: &str = "SALE";

/// Reference written on the day-end GL header; doubles as the idempotency key.
pub fn day_end_reference(date: NaiveDate) -> String {
    format!("***System generated Sales voucher on {}", date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum AccountUsage {
    Ledger,
    Cash,
    Bank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum AccountSource {
    None,
    Subaccount,
    Customer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum AccountType {
    Income,
    Asset,
    Expenditure,
}

impl AccountUsage {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountUsage::Ledger => "Ledger",
            AccountUsage::Cash => "Cash",
            AccountUsage::Bank => "Bank",
        }
    }
}

impl AccountSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountSource::None => "None",
            AccountSource::Subaccount => "Subaccount",
            AccountSource::Customer => "Customer",
        }
    }
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Income => "Income",
            AccountType::Asset => "Asset",
            AccountType::Expenditure => "Expenditure",
        }
    }
}

// --- Aggregation ---

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BankAmount {
    #[schema(example = "DBBL")]
    pub bank: String,
    #[schema(example = "1500.00")]
    pub amount: Decimal,
}

/// One day's confirmed sales for a business.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesAggregate {
    pub order_count: i64,
    /// Net of discounts.
    pub total_amount: Decimal,
    pub cash_amount: Decimal,
    pub bank_amounts: Vec<BankAmount>,
    pub discount_amount: Decimal,
}

/// GL accounts the day-end journal posts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAccounts {
    pub sales: String,
    pub cash: String,
    pub discount: String,
    pub receivable: String,
    pub project: String,
}

/// Positive amounts are debits, negative amounts credits.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JournalLine {
    pub row: i32,
    #[schema(example = "08010001")]
    pub account: String,
    pub sub_account: Option<String>,
    pub usage: AccountUsage,
    pub source: AccountSource,
    pub account_type: AccountType,
    pub amount: Decimal,
}

// --- Persisted rows ---

#[derive(Debug, Clone)]
pub struct NewGlHeader<'a> {
    pub zid: i32,
    pub voucher: &'a str,
    /// `xtrngl`: which process wrote the journal.
    pub transaction_code: &'a str,
    pub reference: &'a str,
    pub date: NaiveDate,
    pub narration: &'a str,
    pub member: &'a str,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlDetailRow {
    pub xvoucher: String,
    pub xrow: i32,
    pub xacc: String,
    pub xsub: Option<String>,
    pub xaccusage: String,
    pub xprime: Decimal,
    pub xacctype: String,
}

// --- Day-end API ---

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayEndPayload {
    #[schema(value_type = String, format = Date, example = "2025-03-31")]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DayEndOutcome {
    /// The journal was written.
    Posted { voucher: String, lines: Vec<JournalLine> },
    /// A journal for this date already exists; nothing was written.
    AlreadyProcessed { voucher: String },
    /// No confirmed sales on the date; nothing was written.
    NoSales,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayEndPreview {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub aggregate: SalesAggregate,
    pub journal: Vec<JournalLine>,
    pub processed_voucher: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayEndReversal {
    pub voucher: String,
    pub details_deleted: u64,
    pub headers_deleted: u64,
}

impl DayEndOutcome {
    pub fn is_posted(&self) -> bool {
        matches!(self, DayEndOutcome::Posted { .. })
    }

    pub fn message(&self) -> String {
        match self {
            DayEndOutcome::Posted { voucher, .. } => format!("Day end posted as {}", voucher),
            DayEndOutcome::AlreadyProcessed { voucher } => {
                format!("Day end already processed (voucher {})", voucher)
            }
            DayEndOutcome::NoSales => "No confirmed sales found for this date".to_string(),
        }
    }
}

/// HTTP body for a day-end run: the outcome plus a `success` flag.
#[derive(Debug, Serialize, ToSchema)]
pub struct DayEndResponse {
    pub success: bool,
    #[schema(example = "Day end posted as SALE000012")]
    pub message: String,
    #[serde(flatten)]
    pub outcome: DayEndOutcome,
}

impl From<DayEndOutcome> for DayEndResponse {
    fn from(outcome: DayEndOutcome) -> Self {
        Self { success: outcome.is_posted(), message: outcome.message(), outcome }
    }
}
