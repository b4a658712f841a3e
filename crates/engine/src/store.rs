//! Durable storage for expenses and bucket balances.
//!
//! [`LedgerStore`] owns the connection pool and exposes the primitives the
//! ledger is built from. The single-row primitives are generic over
//! [`ConnectionTrait`] so they run either directly on the pool or inside the
//! caller's [`DatabaseTransaction`]; compound operations open their own
//! transaction and commit once. Dropping an uncommitted transaction rolls it
//! back.
//!
//! The same code serves every backend sea-orm connects to (embedded SQLite
//! file, in-memory SQLite, Postgres server); which one is used is decided by
//! the connection URL handed to [`LedgerStore::new`].

use std::collections::BTreeMap;

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseConnection, DatabaseTransaction, QueryFilter,
    QueryOrder, TransactionTrait, prelude::*,
    sea_query::{Expr, OnConflict},
};

use crate::{
    AllocationPolicy, BudgetBucket, ExpenseRecord, Money, ResultEngine, budgets, expenses,
};

#[derive(Clone, Debug)]
pub struct LedgerStore {
    database: DatabaseConnection,
}

impl LedgerStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.database
    }

    pub async fn begin(&self) -> ResultEngine<DatabaseTransaction> {
        Ok(self.database.begin().await?)
    }

    /// Creates the tables if absent and a zero-balance bucket for every policy
    /// category that does not have one yet. Existing balances are never reset.
    ///
    /// Returns how many buckets were created.
    pub async fn initialize(&self, policy: &AllocationPolicy) -> ResultEngine<u64> {
        Migrator::up(&self.database, None).await?;

        let db_tx = self.begin().await?;
        let mut created = 0;
        for category in policy.categories() {
            let bucket = BudgetBucket {
                category: category.to_string(),
                balance: Money::ZERO,
            };
            created += budgets::Entity::insert(budgets::ActiveModel::from(&bucket))
                .on_conflict(
                    OnConflict::column(budgets::Column::Category)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;
        }
        db_tx.commit().await?;

        if created > 0 {
            tracing::info!("created {created} budget bucket(s)");
        }
        Ok(created)
    }

    /// All expenses in insertion order.
    ///
    /// Read failures are logged and answered with an empty list, so an empty
    /// result means either "no data" or "storage unavailable". Use
    /// [`LedgerStore::try_load_expenses`] to tell the two apart.
    pub async fn load_expenses(&self) -> Vec<ExpenseRecord> {
        match self.try_load_expenses().await {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!("failed to load expenses, returning empty list: {err}");
                Vec::new()
            }
        }
    }

    pub async fn try_load_expenses(&self) -> ResultEngine<Vec<ExpenseRecord>> {
        let models = expenses::Entity::find()
            .order_by_asc(expenses::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(ExpenseRecord::from).collect())
    }

    /// Swaps the whole expense table for `records` in one transaction.
    ///
    /// Records with an id keep it, the others get a fresh one. The id sequence
    /// is not reset, so ids of deleted rows are never handed out again.
    pub async fn replace_all_expenses(&self, records: &[ExpenseRecord]) -> ResultEngine<usize> {
        let db_tx = self.begin().await?;
        let deleted = expenses::Entity::delete_many().exec(&db_tx).await?;
        let now = Utc::now();
        for record in records {
            record.to_active_model(now).insert(&db_tx).await?;
        }
        db_tx.commit().await?;

        tracing::info!(
            "replaced {} expense(s) with {}",
            deleted.rows_affected,
            records.len()
        );
        Ok(records.len())
    }

    /// Appends one expense and returns its id.
    pub async fn insert_expense<C>(conn: &C, record: &ExpenseRecord) -> ResultEngine<i32>
    where
        C: ConnectionTrait,
    {
        let mut model = record.to_active_model(Utc::now());
        model.id = ActiveValue::NotSet;
        let inserted = model.insert(conn).await?;
        Ok(inserted.id)
    }

    /// `current_balance += delta` for one bucket.
    ///
    /// Returns the number of rows touched: 0 when no bucket exists for
    /// `category`.
    pub async fn adjust_balance<C>(conn: &C, category: &str, delta: Money) -> ResultEngine<u64>
    where
        C: ConnectionTrait,
    {
        let result = budgets::Entity::update_many()
            .col_expr(
                budgets::Column::CurrentBalance,
                Expr::col(budgets::Column::CurrentBalance).add(delta.cents()),
            )
            .filter(budgets::Column::Category.eq(category))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Snapshot of every bucket balance.
    pub async fn get_balances<C>(conn: &C) -> ResultEngine<BTreeMap<String, Money>>
    where
        C: ConnectionTrait,
    {
        let models = budgets::Entity::find().all(conn).await?;
        Ok(models
            .into_iter()
            .map(BudgetBucket::from)
            .map(|bucket| (bucket.category, bucket.balance))
            .collect())
    }
}
