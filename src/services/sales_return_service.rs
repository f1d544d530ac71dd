// src/services/sales_return_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use std::collections::BTreeMap;

use crate::{
    common::{db_utils::acquire_xact_lock, error::AppError},
    db::{LedgerRepository, SalesReturnRepository},
    models::{
        inventory::{NewStockMovement, StockDirection},
        ledger::{AccountSource, AccountType, AccountUsage, JournalLine, NewGlHeader},
        sales_return::{
            NewReturnHeader, NewReturnLine, RefundMethod, ReturnAccounts, SalesReturnDeletion, SalesReturnDetail,
            SalesReturnLine, SalesReturnPayload, SalesReturnReceipt, SoldItem, RETURN_DOC_TYPE,
            RETURN_TRANSACTION_CODE,
        },
        voucher::VoucherSeries,
    },
    services::{
        day_end_service::{
            is_balanced, DEFAULT_CASH_ACCOUNT, DEFAULT_PROJECT, DEFAULT_RECEIVABLE_ACCOUNT, DEFAULT_SALES_ACCOUNT,
        },
        inventory_service::InventoryService,
        sales_service::{line_amount, money},
        voucher_service::VoucherService,
    },
};

pub const DEFAULT_INVENTORY_ACCOUNT: &str = "01060003";
pub const DEFAULT_COST_OF_SALES_ACCOUNT: &str = "04010020";

pub fn return_lock_key(zid: i32, order_number: &str) -> String {
    format!("sales_return:{}:{}", zid, order_number)
}

/// Rejects a return asking for more of an item than the order has left to give back.
pub fn check_returnable(
    order_number: &str,
    requested: &BTreeMap<String, Decimal>,
    sold: &[SoldItem],
    returned: &[(String, Decimal)],
) -> Result<(), String> {
    let mut problems = Vec::new();
    for (item, qty) in requested {
        let sold_qty = sold.iter().find(|s| &s.xitem == item).map(|s| s.quantity).unwrap_or_default();
        let returned_qty = returned
            .iter()
            .find(|(i, _)| i == item)
            .map(|(_, q)| *q)
            .unwrap_or_default();
        let left = sold_qty - returned_qty;
        if *qty > left {
            problems.push(format!("{} (requested {}, returnable {})", item, qty, left));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(format!("Cannot return more than {} sold: {}", order_number, problems.join(", ")))
    }
}

/// The sale reversed: sales revenue and inventory are debited back, the
/// refund (cash or the customer's receivable) and cost of sales credited.
pub fn build_return_journal(
    refund_total: Decimal,
    inventory_value: Decimal,
    refund: RefundMethod,
    customer: Option<&str>,
    accounts: &ReturnAccounts,
) -> Vec<JournalLine> {
    let mut lines = Vec::new();
    let mut push = |account: &str,
                    sub_account: Option<&str>,
                    usage: AccountUsage,
                    source: AccountSource,
                    account_type: AccountType,
                    amount: Decimal| {
        lines.push(JournalLine {
            row: lines.len() as i32 + 1,
            account: account.to_string(),
            sub_account: sub_account.map(str::to_string),
            usage,
            source,
            account_type,
            amount,
        });
    };

    if !refund_total.is_zero() {
        push(&accounts.sales, None, AccountUsage::Ledger, AccountSource::None, AccountType::Income, refund_total);
        match refund {
            RefundMethod::Cash => push(
                &accounts.cash,
                None,
                AccountUsage::Cash,
                AccountSource::None,
                AccountType::Asset,
                -refund_total,
            ),
            RefundMethod::Credit => push(
                &accounts.receivable,
                customer,
                AccountUsage::Ledger,
                AccountSource::Customer,
                AccountType::Asset,
                -refund_total,
            ),
        }
    }

    if !inventory_value.is_zero() {
        push(&accounts.inventory, None, AccountUsage::Ledger, AccountSource::None, AccountType::Asset, inventory_value);
        push(
            &accounts.cost_of_sales,
            None,
            AccountUsage::Ledger,
            AccountSource::None,
            AccountType::Expenditure,
            -inventory_value,
        );
    }

    lines
}

/// Takes goods back from customers: return document, stock movements back
/// into the warehouse and a reversing journal, all in one transaction.
#[derive(Clone)]
pub struct SalesReturnService {
    pool: PgPool,
    return_repo: SalesReturnRepository,
    ledger_repo: LedgerRepository,
    inventory_service: InventoryService,
    voucher_service: VoucherService,
}

impl SalesReturnService {
    pub fn new(
        pool: PgPool,
        return_repo: SalesReturnRepository,
        ledger_repo: LedgerRepository,
        inventory_service: InventoryService,
        voucher_service: VoucherService,
    ) -> Self {
        Self { pool, return_repo, ledger_repo, inventory_service, voucher_service }
    }

    pub async fn process(&self, zid: i32, member: &str, payload: &SalesReturnPayload) -> Result<SalesReturnReceipt, AppError> {
        let date = payload.date.unwrap_or_else(|| Utc::now().date_naive());
        let warehouse = payload.warehouse.as_str();

        let mut requested: BTreeMap<String, Decimal> = BTreeMap::new();
        for line in &payload.lines {
            *requested.entry(line.item.clone()).or_default() += line.quantity;
        }

        let mut tx = self.pool.begin().await?;

        let mut customer = payload.customer.clone();
        let mut order_costs: BTreeMap<String, Decimal> = BTreeMap::new();

        if let Some(order) = payload.order_number.as_deref() {
            // Two returns against one order must not both pass the quantity check.
            acquire_xact_lock(&mut *tx, &return_lock_key(zid, order)).await?;

            let order_customer = self
                .return_repo
                .find_order_customer(&mut *tx, zid, order)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Sales order {} not found", order)))?;
            if customer.is_none() {
                customer = order_customer;
            }

            let sold = self.return_repo.sold_items(&mut *tx, zid, order).await?;
            let returned = self.return_repo.returned_quantities(&mut *tx, zid, order).await?;
            check_returnable(order, &requested, &sold, &returned).map_err(AppError::BusinessRule)?;

            order_costs = sold
                .iter()
                .filter(|s| s.quantity > Decimal::ZERO)
                .map(|s| (s.xitem.clone(), (s.cost / s.quantity).round_dp(6)))
                .collect();
        }

        if payload.refund == RefundMethod::Credit && customer.is_none() {
            return Err(AppError::BusinessRule("Credit refunds need a customer.".to_string()));
        }

        let return_number = self
            .voucher_service
            .next_in_series(&mut *tx, zid, VoucherSeries::ReturnDocument, date)
            .await?;
        let voucher = self
            .voucher_service
            .next_in_series(&mut *tx, zid, VoucherSeries::SalesJournal, date)
            .await?;

        let accounts = self.resolve_accounts(&mut *tx, zid).await?;
        let project = payload.project.as_deref().unwrap_or(&accounts.project);

        self.return_repo
            .insert_header(
                &mut *tx,
                &NewReturnHeader {
                    zid,
                    number: &return_number,
                    date,
                    warehouse,
                    customer: customer.as_deref(),
                    order_number: payload.order_number.as_deref(),
                    project: Some(project),
                    notes: payload.notes.as_deref(),
                    voucher: &voucher,
                    member,
                },
            )
            .await?;

        let mut lines = Vec::with_capacity(payload.lines.len());
        let mut inventory_value = Decimal::ZERO;

        for (idx, line) in payload.lines.iter().enumerate() {
            let row = idx as i32 + 1;
            let unit_cost = match order_costs.get(&line.item) {
                Some(cost) => *cost,
                None => self.inventory_service.average_cost(&mut *tx, zid, &line.item, date).await?,
            };
            let value = (line.quantity * unit_cost).round_dp(6);
            let refund_amount = line_amount(line.quantity, line.rate);

            let movement_number = self
                .voucher_service
                .next_in_series(&mut *tx, zid, VoucherSeries::SalesReturn, date)
                .await?;

            self.return_repo
                .insert_line(
                    &mut *tx,
                    &NewReturnLine {
                        zid,
                        number: &return_number,
                        row,
                        item: &line.item,
                        quantity: line.quantity,
                        movement_number: &movement_number,
                        unit_cost,
                        value,
                        refund_amount,
                    },
                )
                .await?;

            self.inventory_service
                .repo()
                .record_movement(
                    &mut *tx,
                    &NewStockMovement {
                        zid,
                        number: &movement_number,
                        item: &line.item,
                        warehouse,
                        date,
                        quantity: line.quantity,
                        value,
                        rate: line.rate,
                        doc_type: RETURN_DOC_TYPE,
                        doc_number: &return_number,
                        doc_row: row,
                        note: payload.notes.as_deref(),
                        supplier: None,
                        customer: customer.as_deref(),
                        project: Some(project),
                        direction: StockDirection::Return,
                        member,
                    },
                )
                .await?;

            inventory_value += value;
            lines.push(SalesReturnLine {
                row,
                item: line.item.clone(),
                movement_number,
                quantity: line.quantity,
                unit_cost,
                refund_amount,
            });
        }

        let refund_total: Decimal = lines.iter().map(|l| l.refund_amount).sum();
        let inventory_value = money(inventory_value);
        let journal = build_return_journal(refund_total, inventory_value, payload.refund, customer.as_deref(), &accounts);
        if !is_balanced(&journal) {
            return Err(anyhow::anyhow!("return journal for {} does not balance", return_number).into());
        }

        let narration = format!("** Sales Return Created By System On {} **", date.format("%Y-%m-%d"));
        self.ledger_repo
            .insert_header(
                &mut *tx,
                &NewGlHeader {
                    zid,
                    voucher: &voucher,
                    transaction_code: RETURN_TRANSACTION_CODE,
                    reference: &return_number,
                    date,
                    narration: &narration,
                    member,
                },
            )
            .await?;
        for line in &journal {
            self.ledger_repo
                .insert_detail(&mut *tx, zid, &voucher, date, project, line)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(
            zid,
            return_number = %return_number,
            voucher = %voucher,
            refund = %refund_total,
            "Sales return processed"
        );

        Ok(SalesReturnReceipt {
            return_number,
            voucher,
            date,
            refund_total,
            inventory_value,
            lines,
            journal,
        })
    }

    /// Removes a return with its stock movements and journal.
    pub async fn delete(&self, zid: i32, return_number: &str) -> Result<SalesReturnDeletion, AppError> {
        let mut tx = self.pool.begin().await?;

        let header = self
            .return_repo
            .lock_header(&mut *tx, zid, return_number)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Sales return {} not found", return_number)))?;

        if let Some(order) = header.xordernum.as_deref() {
            acquire_xact_lock(&mut *tx, &return_lock_key(zid, order)).await?;
        }

        let (details_deleted, headers_deleted) = match header.xglref.as_deref() {
            Some(voucher) => (
                self.ledger_repo.delete_details(&mut *tx, zid, voucher).await?,
                self.ledger_repo.delete_header(&mut *tx, zid, voucher).await?,
            ),
            None => (0, 0),
        };

        let movements_deleted = self
            .inventory_service
            .repo()
            .delete_for_document(&mut *tx, zid, RETURN_DOC_TYPE, return_number)
            .await?;
        let lines_deleted = self.return_repo.delete_lines(&mut *tx, zid, return_number).await?;
        if self.return_repo.delete_header(&mut *tx, zid, return_number).await? == 0 {
            return Err(anyhow::anyhow!("return header {} vanished during delete", return_number).into());
        }

        tx.commit().await?;
        tracing::info!(zid, return_number, movements_deleted, details_deleted, "Sales return deleted");

        Ok(SalesReturnDeletion {
            return_number: return_number.to_string(),
            voucher: header.xglref,
            movements_deleted,
            lines_deleted,
            details_deleted,
            headers_deleted,
        })
    }

    pub async fn detail(&self, zid: i32, return_number: &str) -> Result<SalesReturnDetail, AppError> {
        let header = self
            .return_repo
            .find_header(&self.pool, zid, return_number)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Sales return {} not found", return_number)))?;
        let lines = self.return_repo.lines(&self.pool, zid, return_number).await?;
        let journal = match header.xglref.as_deref() {
            Some(voucher) => self.ledger_repo.list_details(zid, voucher).await?,
            None => Vec::new(),
        };

        Ok(SalesReturnDetail { header, lines, journal })
    }

    async fn resolve_accounts(&self, conn: &mut PgConnection, zid: i32) -> Result<ReturnAccounts, AppError> {
        let repo = &self.ledger_repo;
        let or_default = |found: Option<String>, default: &str| found.unwrap_or_else(|| default.to_string());

        Ok(ReturnAccounts {
            sales: or_default(repo.find_account(&mut *conn, zid, "Sales").await?, DEFAULT_SALES_ACCOUNT),
            cash: or_default(repo.find_account(&mut *conn, zid, "Cash").await?, DEFAULT_CASH_ACCOUNT),
            receivable: or_default(
                repo.find_account(&mut *conn, zid, "Accounts Receivable").await?,
                DEFAULT_RECEIVABLE_ACCOUNT,
            ),
            inventory: or_default(repo.find_account(&mut *conn, zid, "Inventory%").await?, DEFAULT_INVENTORY_ACCOUNT),
            cost_of_sales: or_default(
                repo.find_account(&mut *conn, zid, "Cost of Goods Sold%").await?,
                DEFAULT_COST_OF_SALES_ACCOUNT,
            ),
            project: or_default(repo.find_project_code(&mut *conn, zid).await?, DEFAULT_PROJECT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn accounts() -> ReturnAccounts {
        ReturnAccounts {
            sales: DEFAULT_SALES_ACCOUNT.into(),
            cash: DEFAULT_CASH_ACCOUNT.into(),
            receivable: DEFAULT_RECEIVABLE_ACCOUNT.into(),
            inventory: DEFAULT_INVENTORY_ACCOUNT.into(),
            cost_of_sales: DEFAULT_COST_OF_SALES_ACCOUNT.into(),
            project: DEFAULT_PROJECT.into(),
        }
    }

    #[test]
    fn cash_refund_reverses_revenue_and_cost() {
        let lines = build_return_journal(dec!(450), dec!(300), RefundMethod::Cash, None, &accounts());

        assert!(is_balanced(&lines));
        let posted: Vec<_> = lines.iter().map(|l| (l.row, l.account.as_str(), l.amount)).collect();
        assert_eq!(
            posted,
            vec![
                (1, "08010001", dec!(450)),
                (2, "01010001", dec!(-450)),
                (3, "01060003", dec!(300)),
                (4, "04010020", dec!(-300)),
            ]
        );
        assert_eq!(lines[1].usage, AccountUsage::Cash);
    }

    #[test]
    fn credit_refund_goes_to_the_customer_receivable() {
        let lines = build_return_journal(dec!(90), dec!(0), RefundMethod::Credit, Some("CUS-000042"), &accounts());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].account, DEFAULT_RECEIVABLE_ACCOUNT);
        assert_eq!(lines[1].sub_account.as_deref(), Some("CUS-000042"));
        assert_eq!(lines[1].source, AccountSource::Customer);
    }

    #[test]
    fn returns_are_capped_by_what_the_order_has_left() {
        let sold = vec![
            SoldItem { xitem: "A".into(), quantity: dec!(3), cost: dec!(300) },
            SoldItem { xitem: "B".into(), quantity: dec!(1), cost: dec!(50) },
        ];
        let returned = vec![("A".to_string(), dec!(2))];

        let ok: BTreeMap<String, Decimal> = [("A".to_string(), dec!(1)), ("B".to_string(), dec!(1))].into();
        assert!(check_returnable("CO--000001", &ok, &sold, &returned).is_ok());

        let too_many: BTreeMap<String, Decimal> = [("A".to_string(), dec!(2)), ("C".to_string(), dec!(1))].into();
        let err = check_returnable("CO--000001", &too_many, &sold, &returned).unwrap_err();
        assert!(err.contains("A (requested 2, returnable 1)"), "{err}");
        assert!(err.contains("C (requested 1, returnable 0)"), "{err}");
    }
}
