use rust_decimal::Decimal;
use thiserror::Error;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::app::store::{ExpenseRecord, RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Please enter an amount.")]
    EmptyAmount,
    #[error("Please enter a category.")]
    EmptyCategory,
    #[error("\"{0}\" is not a valid amount.")]
    InvalidAmount(String),
    #[error("There is no expense in row {position}, only {len} recorded.")]
    OutOfRange { position: usize, len: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

/// In-memory rows of the expense table, mirrored to a [`RecordStore`].
///
/// Rows are identified by their position. Every mutation reaches the store
/// before it is kept in memory.
pub struct Ledger {
    store: RecordStore,
    records: Vec<ExpenseRecord>,
    offset: UtcOffset,
}

impl Ledger {
    pub fn initialize(store: RecordStore) -> Result<Self> {
        let records = store.load_all()?;
        Ok(Self {
            store,
            records,
            offset: UtcOffset::UTC,
        })
    }

    /// Offset used to stamp new expenses with today's date.
    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Switches to another store. On failure the current rows are kept.
    pub fn reload(&mut self, store: RecordStore) -> Result<()> {
        self.records = store.load_all()?;
        self.store = store;
        Ok(())
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all amounts that parse as numbers, `None` if it overflows.
    pub fn total(&self) -> Option<Decimal> {
        self.records
            .iter()
            .filter_map(|r| r.amount.trim().parse::<Decimal>().ok())
            .try_fold(Decimal::ZERO, |acc, d| acc.checked_add(d))
    }

    pub fn add_expense(
        &mut self,
        amount: &str,
        category: &str,
        description: &str,
    ) -> Result<&ExpenseRecord> {
        self.add_expense_on(today(self.offset), amount, category, description)
    }

    pub fn add_expense_on(
        &mut self,
        date: Date,
        amount: &str,
        category: &str,
        description: &str,
    ) -> Result<&ExpenseRecord> {
        if amount.is_empty() {
            return Err(LedgerError::EmptyAmount);
        }
        if category.is_empty() {
            return Err(LedgerError::EmptyCategory);
        }
        let amount = amount.trim();
        match amount.parse::<Decimal>() {
            Ok(v) if !v.is_sign_negative() => {}
            _ => return Err(LedgerError::InvalidAmount(amount.to_owned())),
        }

        let record = ExpenseRecord {
            date: format_date(date),
            amount: amount.to_owned(),
            category: category.to_owned(),
            description: description.to_owned(),
        };
        self.store.append(&record)?;
        self.records.push(record);

        Ok(&self.records[self.records.len() - 1])
    }

    /// Removes the row at `position` and rewrites the store from what is left.
    pub fn delete_expense(&mut self, position: usize) -> Result<ExpenseRecord> {
        if position >= self.records.len() {
            return Err(LedgerError::OutOfRange {
                position,
                len: self.records.len(),
            });
        }

        let removed = self.records.remove(position);
        if let Err(e) = self.store.rewrite_all(&self.records) {
            self.records.insert(position, removed);
            return Err(e.into());
        }
        Ok(removed)
    }
}

pub fn today(offset: UtcOffset) -> Date {
    OffsetDateTime::now_utc().to_offset(offset).date()
}

/// `YYYY-MM-DD`
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
