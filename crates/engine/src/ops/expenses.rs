use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ExpenseRecord, Money, ResultEngine, store::LedgerStore};

use super::{Engine, LedgerWarning, UnknownCategoryPolicy, with_tx};

/// Outcome of [`Engine::record_expense`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseReceipt {
    pub id: i32,
    /// The whole expense list after the write.
    pub expenses: Vec<ExpenseRecord>,
    pub warnings: Vec<LedgerWarning>,
}

impl Engine {
    /// Records an expense and debits its bucket in one transaction.
    pub async fn record_expense(
        &self,
        category: &str,
        description: &str,
        amount: Money,
    ) -> ResultEngine<ExpenseReceipt> {
        self.record_expense_at(category, description, amount, Utc::now())
            .await
    }

    /// Same as [`Engine::record_expense`] with an explicit timestamp.
    pub async fn record_expense_at(
        &self,
        category: &str,
        description: &str,
        amount: Money,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<ExpenseReceipt> {
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(format!(
                "expense amount must be >= 0, got {amount}"
            )));
        }

        let record = ExpenseRecord::new(category, description, amount).at(occurred_at);
        let (id, warnings) = with_tx!(self, |db_tx| {
            let id = LedgerStore::insert_expense(&db_tx, &record).await?;
            let touched = LedgerStore::adjust_balance(&db_tx, category, -amount).await?;

            let mut warnings = Vec::new();
            if touched == 0 {
                match self.unknown_category {
                    UnknownCategoryPolicy::Reject => {
                        Err(EngineError::UnknownCategory(category.to_string()))
                    }
                    UnknownCategoryPolicy::Warn => {
                        tracing::warn!(
                            "expense {id} of {amount} names unknown category '{category}', no bucket debited"
                        );
                        warnings.push(LedgerWarning::UnknownCategory(category.to_string()));
                        Ok((id, warnings))
                    }
                }
            } else {
                Ok((id, warnings))
            }
        })?;

        tracing::info!("recorded expense {id}: {amount} from '{category}'");

        let expenses = self.store.load_expenses().await;
        Ok(ExpenseReceipt {
            id,
            expenses,
            warnings,
        })
    }

    /// Replaces every expense with `records`.
    ///
    /// Bucket balances are a running total of the writes that actually
    /// happened and are **not** recomputed from the new list.
    pub async fn replace_all(&self, records: &[ExpenseRecord]) -> ResultEngine<usize> {
        if let Some(record) = records.iter().find(|record| record.amount.is_negative()) {
            return Err(EngineError::InvalidAmount(format!(
                "expense amount must be >= 0, got {} for '{}'",
                record.amount, record.category
            )));
        }
        self.store.replace_all_expenses(records).await
    }

    /// All expenses, or an empty list when storage cannot be read.
    pub async fn load_expenses(&self) -> Vec<ExpenseRecord> {
        self.store.load_expenses().await
    }

    /// All expenses, propagating storage failures.
    pub async fn try_load_expenses(&self) -> ResultEngine<Vec<ExpenseRecord>> {
        self.store.try_load_expenses().await
    }
}
