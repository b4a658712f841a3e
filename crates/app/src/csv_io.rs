//! CSV export and import of the expense list.
//!
//! Amounts are written in major units (`12.34`) and timestamps as RFC 3339.
//! On import an empty `id` or `occurred_at` cell is left for the ledger to
//! fill in.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use csv::{Reader, Writer};
use engine::{ExpenseRecord, Money};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct ExpenseRow {
    id: Option<i32>,
    occurred_at: Option<DateTime<Utc>>,
    category: String,
    #[serde(default)]
    description: String,
    amount: String,
}

pub fn write_expenses<W: Write>(writer: W, expenses: &[ExpenseRecord]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    for expense in expenses {
        writer.serialize(ExpenseRow {
            id: expense.id,
            occurred_at: expense.occurred_at,
            category: expense.category.clone(),
            description: expense.description.clone(),
            amount: expense.amount.to_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_expenses<R: Read>(reader: R) -> Result<Vec<ExpenseRecord>> {
    let mut reader = Reader::from_reader(reader);
    let mut expenses = Vec::new();
    for row in reader.deserialize() {
        let row: ExpenseRow = row?;
        // Header is line 1.
        let line = expenses.len() as u64 + 2;
        let category = row.category.trim();
        if category.is_empty() {
            return Err(AppError::Import {
                line,
                reason: "empty category".to_string(),
            });
        }
        let amount = row
            .amount
            .parse::<Money>()
            .map_err(|err| AppError::Import {
                line,
                reason: err.to_string(),
            })?;

        let mut record = ExpenseRecord::new(category, row.description, amount);
        record.id = row.id;
        record.occurred_at = row.occurred_at;
        expenses.push(record);
    }
    Ok(expenses)
}
