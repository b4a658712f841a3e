//! Allocation policy: how income is split between buckets.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

/// Proportional weights and balance caps per category.
///
/// Weights do not need to sum to 1, the waterfall renormalizes them over the
/// buckets that can still accept money. A cap of [`Money::ZERO`] means the
/// bucket is uncapped. A category present in only one of the two maps is
/// treated as having weight 0 or no cap respectively.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationPolicy {
    weights: BTreeMap<String, f64>,
    caps: BTreeMap<String, Money>,
}

impl AllocationPolicy {
    pub fn new(
        weights: BTreeMap<String, f64>,
        caps: BTreeMap<String, Money>,
    ) -> ResultEngine<Self> {
        for (category, weight) in &weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(EngineError::InvalidPolicy(format!(
                    "weight for '{category}' must be a finite number >= 0, got {weight}"
                )));
            }
        }
        for (category, cap) in &caps {
            if cap.is_negative() {
                return Err(EngineError::InvalidPolicy(format!(
                    "cap for '{category}' must be >= 0, got {cap}"
                )));
            }
        }
        Ok(Self { weights, caps })
    }

    /// Builds a policy from `(category, weight, cap)` rows.
    ///
    /// A repeated category keeps the last row.
    pub fn from_rows<I, S>(rows: I) -> ResultEngine<Self>
    where
        I: IntoIterator<Item = (S, f64, Money)>,
        S: Into<String>,
    {
        let mut weights = BTreeMap::new();
        let mut caps = BTreeMap::new();
        for (name, weight, cap) in rows {
            let name = name.into();
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(EngineError::InvalidPolicy(
                    "category name must not be empty".to_string(),
                ));
            }
            weights.insert(trimmed.to_string(), weight);
            caps.insert(trimmed.to_string(), cap);
        }
        Self::new(weights, caps)
    }

    /// Every category the policy knows about, sorted.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.weights
            .keys()
            .chain(self.caps.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn weight(&self, category: &str) -> f64 {
        self.weights.get(category).copied().unwrap_or(0.0)
    }

    /// The configured cap, `None` when the bucket is uncapped.
    pub fn cap(&self, category: &str) -> Option<Money> {
        self.caps
            .get(category)
            .copied()
            .filter(|cap| cap.is_positive())
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty() && self.caps.is_empty()
    }
}
