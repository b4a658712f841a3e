//! Budget ledger and waterfall income allocation.
//!
//! The [`Engine`] records expenses against budget buckets and splits income
//! across them proportionally, respecting per-bucket caps. Everything is
//! persisted through a [`LedgerStore`] on any database sea-orm supports.

pub use budgets::BudgetBucket;
pub use error::EngineError;
pub use expenses::ExpenseRecord;
pub use money::Money;
pub use ops::{
    Allocation, Engine, EngineBuilder, ExpenseReceipt, LedgerWarning, UnknownCategoryPolicy,
};
pub use policy::AllocationPolicy;
pub use store::LedgerStore;

pub mod reports;
pub mod waterfall;

mod budgets;
mod error;
mod expenses;
mod money;
mod ops;
mod policy;
mod store;

type ResultEngine<T> = Result<T, EngineError>;
