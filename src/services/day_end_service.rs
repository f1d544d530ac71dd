// src/services/day_end_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::{
    common::{db_utils::acquire_xact_lock, error::AppError},
    db::LedgerRepository,
    models::{
        ledger::{
            day_end_reference, AccountSource, AccountType, AccountUsage, DayEndOutcome, DayEndPreview,
            DayEndReversal, JournalLine, LedgerAccounts, NewGlHeader, SalesAggregate, SALES_TRANSACTION_CODE,
        },
        voucher::VoucherSeries,
    },
    services::voucher_service::VoucherService,
};

pub const DEFAULT_SALES_ACCOUNT: &str = "08010001";
pub const DEFAULT_CASH_ACCOUNT: &str = "01010001";
pub const DEFAULT_DISCOUNT_ACCOUNT: &str = "07080001";
pub const DEFAULT_RECEIVABLE_ACCOUNT: &str = "01030001";
pub const DEFAULT_PROJECT: &str = "DEFAULT";

/// Parent GL account shared by every card-settlement bank.
pub const BANK_PARENT_ACCOUNT: &str = "01020001";

const BANK_SUB_ACCOUNTS: [(&str, &str); 5] = [
    ("PBL", "0102000101"),
    ("DBBL", "0102000102"),
    ("CBL", "0102000103"),
    ("MTBL", "0102000104"),
    ("UCB", "0102000105"),
];

const FIRST_ROW: i32 = 20;
const ROW_STEP: i32 = 10;

pub fn bank_sub_account(bank: &str) -> Option<&'static str> {
    BANK_SUB_ACCOUNTS
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(bank.trim()))
        .map(|(_, sub)| *sub)
}

pub fn day_end_lock_key(zid: i32, date: NaiveDate) -> String {
    format!("day_end:{}:{}", zid, date.format("%Y-%m-%d"))
}

pub fn is_balanced(lines: &[JournalLine]) -> bool {
    lines.iter().map(|l| l.amount).sum::<Decimal>().is_zero()
}

/// Turns a day's sales into journal lines.
///
/// Sales revenue is credited gross (net total plus discounts). Cash, mapped
/// banks and discounts are debited; whatever part of the net total was not
/// settled by cash or a mapped bank is debited to accounts receivable.
pub fn build_journal(aggregate: &SalesAggregate, accounts: &LedgerAccounts) -> Vec<JournalLine> {
    let mut lines = Vec::new();
    let mut row = FIRST_ROW;
    let mut push = |lines: &mut Vec<JournalLine>,
                    account: &str,
                    sub_account: Option<&str>,
                    usage: AccountUsage,
                    source: AccountSource,
                    account_type: AccountType,
                    amount: Decimal| {
        lines.push(JournalLine {
            row,
            account: account.to_string(),
            sub_account: sub_account.map(str::to_string),
            usage,
            source,
            account_type,
            amount,
        });
        row += ROW_STEP;
    };

    let gross = aggregate.total_amount + aggregate.discount_amount;
    push(
        &mut lines,
        &accounts.sales,
        None,
        AccountUsage::Ledger,
        AccountSource::None,
        AccountType::Income,
        -gross,
    );

    let mut unsettled = aggregate.total_amount;

    if aggregate.cash_amount > Decimal::ZERO {
        push(
            &mut lines,
            &accounts.cash,
            None,
            AccountUsage::Cash,
            AccountSource::None,
            AccountType::Asset,
            aggregate.cash_amount,
        );
        unsettled -= aggregate.cash_amount;
    }

    for bank in &aggregate.bank_amounts {
        match bank_sub_account(&bank.bank) {
            Some(sub) if bank.amount > Decimal::ZERO => {
                push(
                    &mut lines,
                    BANK_PARENT_ACCOUNT,
                    Some(sub),
                    AccountUsage::Bank,
                    AccountSource::Subaccount,
                    AccountType::Asset,
                    bank.amount,
                );
                unsettled -= bank.amount;
            }
            sub => {
                tracing::warn!(
                    bank = %bank.bank,
                    amount = %bank.amount,
                    mapped = sub.is_some(),
                    "Card amount not posted to a bank account; left in receivables"
                );
            }
        }
    }

    if aggregate.discount_amount > Decimal::ZERO {
        push(
            &mut lines,
            &accounts.discount,
            None,
            AccountUsage::Ledger,
            AccountSource::Customer,
            AccountType::Expenditure,
            aggregate.discount_amount,
        );
    }

    if !unsettled.is_zero() {
        push(
            &mut lines,
            &accounts.receivable,
            None,
            AccountUsage::Ledger,
            AccountSource::Customer,
            AccountType::Asset,
            unsettled,
        );
    }

    lines
}

/// Posts a day's sales to the general ledger, once per business and date.
#[derive(Clone)]
pub struct DayEndService {
    pool: PgPool,
    ledger_repo: LedgerRepository,
    voucher_service: VoucherService,
}

impl DayEndService {
    pub fn new(pool: PgPool, ledger_repo: LedgerRepository, voucher_service: VoucherService) -> Self {
        Self { pool, ledger_repo, voucher_service }
    }

    pub async fn process(&self, zid: i32, date: NaiveDate, member: &str) -> Result<DayEndOutcome, AppError> {
        tracing::info!(zid, %date, "Starting day end process");

        let mut tx = self.pool.begin().await?;

        // An error drops `tx`, which rolls back every row written so far.
        let outcome = self.post(&mut *tx, zid, date, member).await?;

        match &outcome {
            DayEndOutcome::Posted { voucher, lines } => {
                tx.commit().await?;
                tracing::info!(zid, %date, voucher = %voucher, lines = lines.len(), "Day end process completed");
            }
            DayEndOutcome::AlreadyProcessed { voucher } => {
                tx.rollback().await?;
                tracing::info!(zid, %date, voucher = %voucher, "Day end already processed");
            }
            DayEndOutcome::NoSales => {
                tx.rollback().await?;
                tracing::warn!(zid, %date, "No sales data found for date");
            }
        }

        Ok(outcome)
    }

    async fn post(
        &self,
        conn: &mut PgConnection,
        zid: i32,
        date: NaiveDate,
        member: &str,
    ) -> Result<DayEndOutcome, AppError> {
        // Serialises runs for the same (business, date) until commit/rollback.
        acquire_xact_lock(&mut *conn, &day_end_lock_key(zid, date)).await?;

        let reference = day_end_reference(date);
        if let Some(voucher) = self
            .ledger_repo
            .find_sales_voucher_by_reference(&mut *conn, zid, &reference)
            .await?
        {
            return Ok(DayEndOutcome::AlreadyProcessed { voucher });
        }

        let aggregate = self.ledger_repo.aggregate_sales(&mut *conn, zid, date).await?;
        if aggregate.order_count == 0 {
            return Ok(DayEndOutcome::NoSales);
        }

        let accounts = self.resolve_accounts(&mut *conn, zid).await?;
        let lines = build_journal(&aggregate, &accounts);
        if !is_balanced(&lines) {
            return Err(anyhow::anyhow!("day end journal for {} does not balance", date).into());
        }

        let voucher = self
            .voucher_service
            .next_in_series(&mut *conn, zid, VoucherSeries::SalesJournal, date)
            .await?;

        let narration = format!("** Created By System On {} **", date.format("%Y-%m-%d"));
        self.ledger_repo
            .insert_header(
                &mut *conn,
                &NewGlHeader {
                    zid,
                    voucher: &voucher,
                    transaction_code: SALES_TRANSACTION_CODE,
                    reference: &reference,
                    date,
                    narration: &narration,
                    member,
                },
            )
            .await?;

        for line in &lines {
            self.ledger_repo
                .insert_detail(&mut *conn, zid, &voucher, date, &accounts.project, line)
                .await?;
        }

        Ok(DayEndOutcome::Posted { voucher, lines })
    }

    async fn resolve_accounts(&self, conn: &mut PgConnection, zid: i32) -> Result<LedgerAccounts, AppError> {
        let repo = &self.ledger_repo;
        let or_default = |found: Option<String>, default: &str| found.unwrap_or_else(|| default.to_string());

        Ok(LedgerAccounts {
            sales: or_default(repo.find_account(&mut *conn, zid, "Sales").await?, DEFAULT_SALES_ACCOUNT),
            cash: or_default(repo.find_account(&mut *conn, zid, "Cash").await?, DEFAULT_CASH_ACCOUNT),
            discount: or_default(repo.find_account(&mut *conn, zid, "%Discount%").await?, DEFAULT_DISCOUNT_ACCOUNT),
            receivable: or_default(
                repo.find_account(&mut *conn, zid, "Accounts Receivable").await?,
                DEFAULT_RECEIVABLE_ACCOUNT,
            ),
            project: or_default(repo.find_project_code(&mut *conn, zid).await?, DEFAULT_PROJECT),
        })
    }

    /// Removes a posted day so it can be processed again.
    pub async fn reverse(&self, zid: i32, date: NaiveDate) -> Result<DayEndReversal, AppError> {
        let mut tx = self.pool.begin().await?;
        acquire_xact_lock(&mut *tx, &day_end_lock_key(zid, date)).await?;

        let voucher = self
            .ledger_repo
            .find_sales_voucher_by_reference(&mut *tx, zid, &day_end_reference(date))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No day-end process found for date {}", date)))?;

        let details_deleted = self.ledger_repo.delete_details(&mut *tx, zid, &voucher).await?;
        let headers_deleted = self.ledger_repo.delete_header(&mut *tx, zid, &voucher).await?;
        if headers_deleted == 0 {
            return Err(anyhow::anyhow!("journal header {} vanished during reversal", voucher).into());
        }

        tx.commit().await?;
        tracing::info!(zid, %date, voucher = %voucher, details_deleted, "Day end process reversed");

        Ok(DayEndReversal { voucher, details_deleted, headers_deleted })
    }

    /// What `process` would post for the date, without writing anything.
    pub async fn preview(&self, zid: i32, date: NaiveDate) -> Result<DayEndPreview, AppError> {
        let mut conn = self.pool.acquire().await?;

        let processed_voucher = self
            .ledger_repo
            .find_sales_voucher_by_reference(&mut *conn, zid, &day_end_reference(date))
            .await?;
        let aggregate = self.ledger_repo.aggregate_sales(&mut *conn, zid, date).await?;

        let journal = if aggregate.order_count == 0 {
            Vec::new()
        } else {
            let accounts = self.resolve_accounts(&mut *conn, zid).await?;
            build_journal(&aggregate, &accounts)
        };

        Ok(DayEndPreview { date, aggregate, journal, processed_voucher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ledger::BankAmount;
    use rust_decimal_macros::dec;

    fn accounts() -> LedgerAccounts {
        LedgerAccounts {
            sales: DEFAULT_SALES_ACCOUNT.into(),
            cash: DEFAULT_CASH_ACCOUNT.into(),
            discount: DEFAULT_DISCOUNT_ACCOUNT.into(),
            receivable: DEFAULT_RECEIVABLE_ACCOUNT.into(),
            project: DEFAULT_PROJECT.into(),
        }
    }

    fn aggregate(total: Decimal, cash: Decimal, banks: &[(&str, Decimal)], discount: Decimal) -> SalesAggregate {
        SalesAggregate {
            order_count: 3,
            total_amount: total,
            cash_amount: cash,
            bank_amounts: banks
                .iter()
                .map(|(bank, amount)| BankAmount { bank: bank.to_string(), amount: *amount })
                .collect(),
            discount_amount: discount,
        }
    }

    #[test]
    fn cash_card_and_discount_day_balances() {
        let agg = aggregate(dec!(1000), dec!(600), &[("DBBL", dec!(400))], dec!(50));
        let lines = build_journal(&agg, &accounts());

        assert!(is_balanced(&lines));
        let amounts: Vec<_> = lines.iter().map(|l| (l.account.as_str(), l.amount)).collect();
        assert_eq!(
            amounts,
            vec![
                ("08010001", dec!(-1050)),
                ("01010001", dec!(600)),
                ("01020001", dec!(400)),
                ("07080001", dec!(50)),
            ]
        );
        assert_eq!(lines[2].sub_account.as_deref(), Some("0102000102"));
    }

    #[test]
    fn rows_start_at_twenty_and_step_by_ten() {
        let agg = aggregate(dec!(300), dec!(100), &[("PBL", dec!(100)), ("UCB", dec!(100))], dec!(0));
        let rows: Vec<_> = build_journal(&agg, &accounts()).iter().map(|l| l.row).collect();
        assert_eq!(rows, vec![20, 30, 40, 50]);
    }

    #[test]
    fn credit_sales_and_unknown_banks_go_to_receivables() {
        let agg = aggregate(dec!(900), dec!(200), &[("XYZ", dec!(300)), ("CBL", dec!(100))], dec!(0));
        let lines = build_journal(&agg, &accounts());

        assert!(is_balanced(&lines));
        let receivable = lines.last().unwrap();
        assert_eq!(receivable.account, DEFAULT_RECEIVABLE_ACCOUNT);
        assert_eq!(receivable.amount, dec!(600));
        assert!(lines.iter().all(|l| l.sub_account.as_deref() != Some("XYZ")));
    }

    #[test]
    fn zero_cash_is_not_posted() {
        let agg = aggregate(dec!(500), dec!(0), &[("MTBL", dec!(500))], dec!(0));
        let lines = build_journal(&agg, &accounts());
        assert!(lines.iter().all(|l| l.usage != AccountUsage::Cash));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn bank_codes_match_case_insensitively() {
        assert_eq!(bank_sub_account("dbbl"), Some("0102000102"));
        assert_eq!(bank_sub_account(" UCB "), Some("0102000105"));
        assert_eq!(bank_sub_account("HSBC"), None);
    }

    #[test]
    fn lock_key_is_stable_per_business_and_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(day_end_lock_key(100001, date), "day_end:100001:2025-03-31");
        assert_eq!(day_end_lock_key(100001, date), day_end_lock_key(100001, date));
        assert_ne!(day_end_lock_key(100002, date), day_end_lock_key(100001, date));
    }

    #[test]
    fn reference_names_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(day_end_reference(date), "***System generated Sales voucher on 2025-01-05");
    }
}
