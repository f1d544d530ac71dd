// src/models/inventory.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    Receipt,
    Issue,
    /// Goods a customer brought back; adds to stock like a receipt.
    Return,
}

impl StockDirection {
    pub fn action(self) -> &'static str {
        match self {
            StockDirection::Receipt => "Receipt",
            StockDirection::Issue => "Issue",
            StockDirection::Return => "Return",
        }
    }

    /// `imtrn.xsign`: on-hand quantity is SUM(xqty * xsign).
    pub fn sign(self) -> i32 {
        match self {
            StockDirection::Receipt | StockDirection::Return => 1,
            StockDirection::Issue => -1,
        }
    }
}

/// A row of the `imtrn` inventory ledger.
#[derive(Debug, Clone)]
pub struct NewStockMovement<'a> {
    pub zid: i32,
    pub number: &'a str,
    pub item: &'a str,
    pub warehouse: &'a str,
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub value: Decimal,
    pub rate: Decimal,
    pub doc_type: &'a str,
    pub doc_number: &'a str,
    pub doc_row: i32,
    pub note: Option<&'a str>,
    pub supplier: Option<&'a str>,
    pub customer: Option<&'a str>,
    pub project: Option<&'a str>,
    pub direction: StockDirection,
    pub member: &'a str,
}
