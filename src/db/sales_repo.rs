// src/db/sales_repo.rs

use chrono::Datelike;
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::sales::{NewSalesLine, NewSalesOrder, ORDER_CONFIRMED},
};

#[derive(Clone, Default)]
pub struct SalesRepository;

impl SalesRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_order<'e, E>(&self, executor: E, order: &NewSalesOrder<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO opord (
                zid, xordernum, xdate, xcus, xstatusord, xwh, xsltype, xsalescat, xdocnum,
                xdtwotax, xdttax, xdtdisc, xdiscf, xtotamt, xdtcomm, xcashamt,
                xyear, xper, xemp
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(order.zid)
        .bind(order.order_number)
        .bind(order.date)
        .bind(order.customer)
        .bind(ORDER_CONFIRMED)
        .bind(order.warehouse)
        .bind(order.sale_type)
        .bind(order.bank)
        .bind(order.card_number)
        .bind(order.totals.subtotal)
        .bind(order.totals.tax)
        .bind(order.percent_discount_amount)
        .bind(order.fixed_discount)
        .bind(order.totals.total)
        .bind(order.totals.card_amount)
        .bind(order.totals.cash_amount)
        .bind(order.date.year())
        .bind(order.date.month() as i32)
        .bind(order.member)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_line<'e, E>(&self, executor: E, line: &NewSalesLine<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO opodt (
                zid, xordernum, xrow, xitem, xwh, xqtyord, xrate, xlineamt, xdttax, ximtrnnum, xcost
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(line.zid)
        .bind(line.order_number)
        .bind(line.row)
        .bind(line.item)
        .bind(line.warehouse)
        .bind(line.quantity)
        .bind(line.rate)
        .bind(line.line_amount)
        .bind(line.vat)
        .bind(line.issue_number)
        .bind(line.unit_cost)
        .execute(executor)
        .await?;

        Ok(())
    }
}
