use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_cents, Cents, MAX_AMOUNT_CENTS};

/// Category for borrowed principal (recorded as an inflow).
pub const DEBT_CATEGORY: &str = "debt";

/// Category for repayments against borrowed principal (recorded as an outflow).
pub const DEBT_PAYMENT_CATEGORY: &str = "debt_payment";

/// A single logged transaction or snapshot.
/// Records are immutable once created; the ledger only ever grows by append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRecord {
    /// When the entry was made
    pub timestamp: DateTime<Utc>,
    /// Free-form label such as "income", "rent" or "debt_payment"
    pub category: String,
    /// Signed amount in cents: positive = inflow, negative = outflow
    pub amount_cents: Cents,
    pub note: Option<String>,
}

impl BudgetRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        category: impl Into<String>,
        amount_cents: Cents,
    ) -> Self {
        Self {
            timestamp,
            category: category.into(),
            amount_cents,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = if note.is_empty() { None } else { Some(note) };
        self
    }

    pub fn is_inflow(&self) -> bool {
        self.amount_cents > 0
    }

    pub fn is_outflow(&self) -> bool {
        self.amount_cents < 0
    }

    /// Returns true if this record moves borrowed principal up or down.
    pub fn is_debt(&self) -> bool {
        let category = self.category.trim();
        category.eq_ignore_ascii_case(DEBT_CATEGORY)
            || category.eq_ignore_ascii_case(DEBT_PAYMENT_CATEGORY)
    }

    /// Check the fields a caller can get wrong.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.category.trim().is_empty() {
            return Err(RecordError::EmptyCategory);
        }
        if self.category.contains(['\n', '\r']) {
            return Err(RecordError::MultilineCategory);
        }
        if self.amount_cents.unsigned_abs() > MAX_AMOUNT_CENTS.unsigned_abs() {
            return Err(RecordError::AmountOutOfRange);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    EmptyCategory,
    MultilineCategory,
    AmountOutOfRange,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::EmptyCategory => write!(f, "category must not be empty"),
            RecordError::MultilineCategory => write!(f, "category must be a single line"),
            RecordError::AmountOutOfRange => {
                write!(f, "amount must not exceed {} in magnitude", format_cents(MAX_AMOUNT_CENTS))
            }
        }
    }
}

impl std::error::Error for RecordError {}
