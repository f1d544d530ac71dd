// src/services/inventory_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use std::collections::BTreeMap;

use crate::{common::error::AppError, db::StockRepository};

/// Moving average cost from the signed inventory ledger totals.
///
/// Falls back to `fallback` while nothing is on hand.
pub fn moving_average_cost(total_value: Decimal, total_qty: Decimal, fallback: Decimal) -> Decimal {
    if total_qty <= Decimal::ZERO {
        return fallback;
    }
    (total_value / total_qty).round_dp(6)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockShortage {
    pub item: String,
    pub requested: Decimal,
    pub available: Decimal,
}

pub fn describe_shortages(shortages: &[StockShortage]) -> String {
    let parts: Vec<String> = shortages
        .iter()
        .map(|s| format!("{} (requested {}, available {})", s.item, s.requested, s.available))
        .collect();
    format!("Insufficient stock: {}", parts.join(", "))
}

#[derive(Clone)]
pub struct InventoryService {
    stock_repo: StockRepository,
}

impl InventoryService {
    pub fn new(stock_repo: StockRepository) -> Self {
        Self { stock_repo }
    }

    pub fn repo(&self) -> &StockRepository {
        &self.stock_repo
    }

    /// Average cost of `item` on `as_of`, falling back to the item's standard cost.
    pub async fn average_cost(
        &self,
        conn: &mut PgConnection,
        zid: i32,
        item: &str,
        as_of: NaiveDate,
    ) -> Result<Decimal, AppError> {
        let (value, qty) = self.stock_repo.valuation(&mut *conn, zid, item, as_of).await?;
        if qty > Decimal::ZERO {
            return Ok(moving_average_cost(value, qty, Decimal::ZERO));
        }

        let standard = self
            .stock_repo
            .standard_cost(&mut *conn, zid, item)
            .await?
            .unwrap_or(Decimal::ZERO);
        Ok(standard)
    }

    /// Items whose on-hand quantity in `warehouse` cannot cover the request.
    pub async fn find_shortages(
        &self,
        conn: &mut PgConnection,
        zid: i32,
        warehouse: &str,
        requested: &BTreeMap<String, Decimal>,
    ) -> Result<Vec<StockShortage>, AppError> {
        let mut shortages = Vec::new();
        for (item, qty) in requested {
            let available = self.stock_repo.on_hand(&mut *conn, zid, item, warehouse).await?;
            if available < *qty {
                shortages.push(StockShortage {
                    item: item.clone(),
                    requested: *qty,
                    available,
                });
            }
        }
        Ok(shortages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn average_cost_divides_value_by_quantity() {
        assert_eq!(moving_average_cost(dec!(1000), dec!(8), dec!(0)), dec!(125));
        assert_eq!(moving_average_cost(dec!(100), dec!(3), dec!(0)), dec!(33.333333));
    }

    #[test]
    fn average_cost_falls_back_when_nothing_is_on_hand() {
        assert_eq!(moving_average_cost(dec!(0), dec!(0), dec!(42.5)), dec!(42.5));
        assert_eq!(moving_average_cost(dec!(-10), dec!(-1), dec!(7)), dec!(7));
    }

    #[test]
    fn shortage_message_lists_every_item() {
        let msg = describe_shortages(&[
            StockShortage { item: "A".into(), requested: dec!(3), available: dec!(1) },
            StockShortage { item: "B".into(), requested: dec!(2), available: dec!(0) },
        ]);
        assert_eq!(msg, "Insufficient stock: A (requested 3, available 1), B (requested 2, available 0)");
    }
}
