pub mod ledger_repo;
pub use ledger_repo::LedgerRepository;
pub mod purchase_repo;
pub use purchase_repo::PurchaseRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod sales_repo;
pub use sales_repo::SalesRepository;
pub mod sales_return_repo;
pub use sales_return_repo::SalesReturnRepository;
pub mod stock_repo;
pub use stock_repo::StockRepository;
pub mod tenancy_repo;
pub use tenancy_repo::BusinessRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod voucher_repo;
