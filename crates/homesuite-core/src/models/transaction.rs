//! Expando income/expense records.

use chrono::{DateTime, Utc};

use super::Amount;
use crate::codec::{Entity, Record, RecordReader, RecordWriter, Result};

/// A single income or expense line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: u64,
    pub title: String,
    pub amount: Amount,
    /// `true` for income, `false` for an expense.
    pub is_income: bool,
    pub category: String,
    pub date: DateTime<Utc>,
    pub note: String,
}

impl Transaction {
    pub fn expense(title: impl Into<String>, amount: Amount, date: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            amount,
            is_income: false,
            category: String::new(),
            date,
            note: String::new(),
        }
    }

    pub fn income(title: impl Into<String>, amount: Amount, date: DateTime<Utc>) -> Self {
        Self {
            is_income: true,
            ..Self::expense(title, amount, date)
        }
    }

    /// Amount with the sign applied: positive for income, negative for expenses.
    pub fn signed_amount(&self) -> Amount {
        if self.is_income {
            self.amount
        } else {
            Amount::from_raw(-self.amount.raw())
        }
    }
}

impl Record for Transaction {
    fn encode(&self, w: &mut RecordWriter) -> Result<()> {
        w.write_u64(self.id);
        w.write_str(&self.title)?;
        w.write_i64(self.amount.raw());
        w.write_bool(self.is_income);
        w.write_str(&self.category)?;
        w.write_timestamp(&self.date);
        w.write_str(&self.note)
    }

    fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            id: r.read_u64()?,
            title: r.read_string()?,
            amount: Amount::from_raw(r.read_i64()?),
            is_income: r.read_bool()?,
            category: r.read_string()?,
            date: r.read_timestamp()?,
            note: r.read_string()?,
        })
    }
}

impl Entity for Transaction {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Income, expenses and balance over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub income: Amount,
    pub expenses: Amount,
    pub balance: Amount,
}

/// Totals saturate rather than overflow.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut income = 0i64;
    let mut expenses = 0i64;
    for t in transactions {
        if t.is_income {
            income = income.saturating_add(t.amount.raw());
        } else {
            expenses = expenses.saturating_add(t.amount.raw());
        }
    }
    Summary {
        income: Amount::from_raw(income),
        expenses: Amount::from_raw(expenses),
        balance: Amount::from_raw(income.saturating_sub(expenses)),
    }
}
