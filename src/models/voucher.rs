// src/models/voucher.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_VOUCHER_WIDTH: usize = 6;

/// Where a sequential voucher lives and how it is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoucherTarget<'a> {
    pub prefix: &'a str,
    pub table: &'a str,
    pub column: &'a str,
    pub width: usize,
    /// Extra `xaction = ?` filter for tables shared by several documents.
    pub action: Option<&'a str>,
}

impl<'a> VoucherTarget<'a> {
    pub fn new(prefix: &'a str, table: &'a str, column: &'a str) -> Self {
        Self { prefix, table, column, width: DEFAULT_VOUCHER_WIDTH, action: None }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_action(mut self, action: &'a str) -> Self {
        self.action = Some(action);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum VoucherSeries {
    SalesOrder,
    InventoryIssue,
    InventoryReceipt,
    SalesReturn,
    ReturnDocument,
    PurchaseOrder,
    GoodsReceipt,
    SalesJournal,
    SupplierInvoice,
}

pub enum SeriesLayout {
    Sequential(VoucherTarget<'static>),
    /// `{prefix}{MM}{YY}-{serial}` on glheader, serial restarting every month.
    Monthly { prefix: &'static str },
}

impl VoucherSeries {
    pub fn layout(self) -> SeriesLayout {
        use SeriesLayout::*;
        match self {
            VoucherSeries::SalesOrder => Sequential(VoucherTarget::new("CO--", "opord", "xordernum")),
            VoucherSeries::InventoryIssue => Sequential(VoucherTarget::new("IS--", "imtrn", "ximtrnnum")),
            VoucherSeries::InventoryReceipt => Sequential(VoucherTarget::new("RE--", "imtrn", "ximtrnnum")),
            VoucherSeries::SalesReturn => Sequential(VoucherTarget::new("SRE", "imtrn", "ximtrnnum")),
            VoucherSeries::ReturnDocument => Sequential(VoucherTarget::new("SRE-", "imtemptrn", "ximtmptrn")),
            VoucherSeries::PurchaseOrder => Sequential(VoucherTarget::new("PO--", "poord", "xpornum")),
            VoucherSeries::GoodsReceipt => Sequential(VoucherTarget::new("GRN-", "pogrn", "xgrnnum")),
            VoucherSeries::SalesJournal => Sequential(VoucherTarget::new("SALE", "glheader", "xvoucher")),
            VoucherSeries::SupplierInvoice => Monthly { prefix: "SINV" },
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextVoucherPayload {
    pub series: VoucherSeries,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoucherPreview {
    pub series: VoucherSeries,
    #[schema(example = "RE--001035")]
    pub voucher: String,
}
