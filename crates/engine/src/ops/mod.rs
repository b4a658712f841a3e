use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::{AllocationPolicy, ResultEngine, store::LedgerStore};

mod allocation;
mod expenses;

pub use allocation::Allocation;
pub use expenses::ExpenseReceipt;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.store.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// What to do when an expense names a category that has no bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Keep the expense, leave balances untouched and report a
    /// [`LedgerWarning::UnknownCategory`].
    #[default]
    Warn,
    /// Roll back and fail with [`EngineError::UnknownCategory`].
    ///
    /// [`EngineError::UnknownCategory`]: crate::EngineError::UnknownCategory
    Reject,
}

/// Non-fatal conditions a write committed with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum LedgerWarning {
    /// No bucket row matched, so no balance moved. The ledger and the buckets
    /// have drifted apart by the written amount.
    UnknownCategory(String),
}

/// The budget ledger: expense recording and income allocation over one
/// [`LedgerStore`].
#[derive(Debug)]
pub struct Engine {
    store: LedgerStore,
    policy: AllocationPolicy,
    unknown_category: UnknownCategoryPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    /// Creates missing tables and buckets. Safe to call any number of times.
    pub async fn initialize(&self) -> ResultEngine<u64> {
        self.store.initialize(&self.policy).await
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    policy: AllocationPolicy,
    unknown_category: UnknownCategoryPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Categories, weights and caps used to create buckets and split income.
    pub fn policy(mut self, policy: AllocationPolicy) -> EngineBuilder {
        self.policy = policy;
        self
    }

    pub fn unknown_category(mut self, policy: UnknownCategoryPolicy) -> EngineBuilder {
        self.unknown_category = policy;
        self
    }

    /// Construct `Engine`, making sure the schema and every bucket exist.
    pub async fn build(self) -> ResultEngine<Engine> {
        let engine = Engine {
            store: LedgerStore::new(self.database),
            policy: self.policy,
            unknown_category: self.unknown_category,
        };
        engine.initialize().await?;
        Ok(engine)
    }
}
