//! Budget buckets: one row per category holding its running balance.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::Money;

/// A bucket. The category name is the identity.
///
/// The balance is what has been allocated to the bucket minus what has been
/// spent from it. Overspending simply makes it negative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetBucket {
    pub category: String,
    pub balance: Money,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub category: String,
    pub current_balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for BudgetBucket {
    fn from(model: Model) -> Self {
        Self {
            category: model.category,
            balance: Money::new(model.current_balance),
        }
    }
}

impl From<&BudgetBucket> for ActiveModel {
    fn from(bucket: &BudgetBucket) -> Self {
        Self {
            category: ActiveValue::Set(bucket.category.clone()),
            current_balance: ActiveValue::Set(bucket.balance.cents()),
        }
    }
}
