// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, net::SocketAddr, time::Duration};

use crate::{
    db::{
        BusinessRepository, LedgerRepository, PurchaseRepository, RbacRepository, SalesRepository,
        SalesReturnRepository, StockRepository, UserRepository,
    },
    services::{
        auth::AuthService, day_end_service::DayEndService, inventory_service::InventoryService,
        purchase_service::PurchaseService, rbac_service::RbacService, sales_return_service::SalesReturnService,
        sales_service::SalesService, setup_service::SetupService, voucher_service::VoucherService,
    },
};

/// Process settings read from the environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub jwt_ttl_days: i64,
    /// Administrator created at startup when all three `SEED_*` variables are set.
    pub seed_admin: Option<SeedAdmin>,
}

#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub zid: i32,
    pub business_name: String,
    pub username: String,
    pub password: String,
}

impl SeedAdmin {
    fn from_env() -> anyhow::Result<Option<Self>> {
        let (Ok(zid), Ok(username), Ok(password)) = (
            env::var("SEED_BUSINESS_ZID"),
            env::var("SEED_ADMIN_USERNAME"),
            env::var("SEED_ADMIN_PASSWORD"),
        ) else {
            return Ok(None);
        };

        let zid = zid
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for SEED_BUSINESS_ZID: {}", e))?;

        let business_name = env::var("SEED_BUSINESS_NAME").unwrap_or_else(|_| format!("Business {}", zid));

        Ok(Some(Self { zid, business_name, username, password }))
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: parse_var("BIND_ADDR", "0.0.0.0:3000".parse()?)?,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_ttl_days: parse_var("JWT_TTL_DAYS", 7)?,
            seed_admin: SeedAdmin::from_env()?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        _ => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub voucher_service: VoucherService,
    pub day_end_service: DayEndService,
    pub sales_service: SalesService,
    pub purchase_service: PurchaseService,
    pub sales_return_service: SalesReturnService,
    pub setup_service: SetupService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("Database connection established");

        Ok(Self::from_pool(db_pool, config))
    }

    /// Wires every repository and service onto an existing pool.
    pub fn from_pool(db_pool: PgPool, config: &Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let business_repo = BusinessRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let ledger_repo = LedgerRepository::new(db_pool.clone());
        let stock_repo = StockRepository::new();

        let voucher_service = VoucherService::new();
        let inventory_service = InventoryService::new(stock_repo);

        Self {
            setup_service: SetupService::new(
                db_pool.clone(),
                user_repo.clone(),
                business_repo.clone(),
                rbac_repo.clone(),
            ),
            auth_service: AuthService::new(user_repo, business_repo, config.jwt_secret.clone(), config.jwt_ttl_days),
            rbac_service: RbacService::new(rbac_repo),
            sales_return_service: SalesReturnService::new(
                db_pool.clone(),
                SalesReturnRepository::new(),
                ledger_repo.clone(),
                inventory_service.clone(),
                voucher_service.clone(),
            ),
            day_end_service: DayEndService::new(db_pool.clone(), ledger_repo, voucher_service.clone()),
            sales_service: SalesService::new(
                db_pool.clone(),
                SalesRepository::new(),
                inventory_service.clone(),
                voucher_service.clone(),
            ),
            purchase_service: PurchaseService::new(
                db_pool.clone(),
                PurchaseRepository::new(),
                inventory_service,
                voucher_service.clone(),
            ),
            voucher_service,
            db_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        let ttl: i64 = parse_var("ERP_BACKEND_TEST_UNSET_TTL", 7).unwrap();
        assert_eq!(ttl, 7);
    }
}
