use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine, store::LedgerStore, waterfall};

use super::{Engine, LedgerWarning, with_tx};

/// Outcome of [`Engine::allocate_income`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub income: Money,
    /// Amount credited per policy category, zero entries included.
    pub credited: BTreeMap<String, Money>,
    /// Part of the income no bucket could accept. Not credited anywhere.
    pub undistributed: Money,
    pub rounds: usize,
    pub warnings: Vec<LedgerWarning>,
}

impl Allocation {
    pub fn total_credited(&self) -> Money {
        self.credited.values().sum()
    }
}

impl Engine {
    /// Splits `income` across buckets with the waterfall and credits them.
    ///
    /// The balance snapshot is read inside the same transaction as the
    /// credits, so the computation and the write commit together.
    pub async fn allocate_income(&self, income: Money) -> ResultEngine<Allocation> {
        if !income.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "income must be > 0, got {income}"
            )));
        }

        let allocation = with_tx!(self, |db_tx| {
            let balances = LedgerStore::get_balances(&db_tx).await?;
            let distribution = waterfall::distribute(income, &self.policy, &balances);

            let mut warnings = Vec::new();
            for (category, amount) in &distribution.credited {
                if !amount.is_positive() {
                    continue;
                }
                let touched = LedgerStore::adjust_balance(&db_tx, category, *amount).await?;
                if touched == 0 {
                    tracing::warn!("no bucket for '{category}', {amount} not credited");
                    warnings.push(LedgerWarning::UnknownCategory(category.clone()));
                }
            }

            Ok::<_, EngineError>(Allocation {
                income,
                credited: distribution.credited,
                undistributed: distribution.undistributed,
                rounds: distribution.rounds,
                warnings,
            })
        })?;

        tracing::info!(
            "allocated {} of {income} in {} round(s), {} undistributed",
            allocation.total_credited(),
            allocation.rounds,
            allocation.undistributed
        );
        Ok(allocation)
    }

    /// Current balance of every bucket.
    pub async fn get_balances(&self) -> ResultEngine<BTreeMap<String, Money>> {
        LedgerStore::get_balances(self.store.connection()).await
    }
}
