//! Expense records.
//!
//! An [`ExpenseRecord`] with `id == None` is transient: it only lives in memory
//! (for example while a caller edits the whole list) until it is saved through
//! the bulk replace path. Records read from storage always carry an id and a
//! timestamp.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: Option<i32>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub category: String,
    pub description: String,
    pub amount: Money,
}

impl ExpenseRecord {
    /// A transient record, timestamped when it is first persisted.
    pub fn new(category: impl Into<String>, description: impl Into<String>, amount: Money) -> Self {
        Self {
            id: None,
            occurred_at: None,
            category: category.into(),
            description: description.into(),
            amount,
        }
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// Active model ready for insertion. A missing timestamp becomes `now`.
    pub(crate) fn to_active_model(&self, now: DateTime<Utc>) -> ActiveModel {
        ActiveModel {
            id: match self.id {
                Some(id) => ActiveValue::Set(id),
                None => ActiveValue::NotSet,
            },
            occurred_at: ActiveValue::Set(self.occurred_at.unwrap_or(now)),
            category: ActiveValue::Set(self.category.clone()),
            description: ActiveValue::Set(self.description.clone()),
            amount_minor: ActiveValue::Set(self.amount.cents()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub occurred_at: DateTimeUtc,
    pub category: String,
    pub description: String,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ExpenseRecord {
    fn from(model: Model) -> Self {
        Self {
            id: Some(model.id),
            occurred_at: Some(model.occurred_at),
            category: model.category,
            description: model.description,
            amount: Money::new(model.amount_minor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_record_gets_default_timestamp() {
        let now = Utc::now();
        let record = ExpenseRecord::new("Food", "", Money::new(1_50));
        assert_eq!(record.id, None);

        let model = record.to_active_model(now);
        assert_eq!(model.id, ActiveValue::NotSet);
        assert_eq!(model.occurred_at, ActiveValue::Set(now));
        assert_eq!(model.amount_minor, ActiveValue::Set(150));
    }

    #[test]
    fn persisted_record_keeps_id_and_timestamp() {
        let when = DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut record = ExpenseRecord::new("Rent", "March", Money::new(900_00)).at(when);
        record.id = Some(7);

        let model = record.to_active_model(Utc::now());
        assert_eq!(model.id, ActiveValue::Set(7));
        assert_eq!(model.occurred_at, ActiveValue::Set(when));
    }
}
