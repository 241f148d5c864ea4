use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BudgetRecord, Cents};

/// Totals derived from a ledger snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Sum of all positive amounts
    pub total_inflow: Cents,
    /// Magnitude of the sum of all negative amounts
    pub total_outflow: Cents,
    /// Sum of all amounts
    pub net_balance: Cents,
    /// Category -> summed amount, ordered by category name
    pub by_category: BTreeMap<String, Cents>,
    pub record_count: usize,
}

/// Compute totals for a sequence of records.
/// Every figure is a plain sum, so the result does not depend on record order.
pub fn summarize(records: &[BudgetRecord]) -> Summary {
    let mut summary = Summary::default();

    for record in records {
        if record.is_inflow() {
            summary.total_inflow += record.amount_cents;
        } else {
            summary.total_outflow -= record.amount_cents;
        }
        summary.net_balance += record.amount_cents;
        *summary
            .by_category
            .entry(record.category.trim().to_string())
            .or_insert(0) += record.amount_cents;
    }

    summary.record_count = records.len();
    summary
}

/// Outstanding borrowed principal: debt inflows plus repayment outflows,
/// never below zero.
pub fn outstanding_debt(records: &[BudgetRecord]) -> Cents {
    let balance: Cents = records
        .iter()
        .filter(|r| r.is_debt())
        .map(|r| r.amount_cents)
        .sum();
    balance.max(0)
}

/// Linear payoff projection for the debt recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub outstanding: Cents,
    pub monthly_payment: Cents,
    pub months: u64,
    /// Amount due in the last month (smaller than the regular payment when
    /// the debt does not divide evenly)
    pub final_payment: Cents,
}

/// Months to pay off the ledger's outstanding debt with a fixed monthly payment.
/// No interest is applied: the balance drops by exactly `monthly_payment` each month.
pub fn debt_projection(
    records: &[BudgetRecord],
    monthly_payment: Cents,
) -> Result<Projection, ProjectionError> {
    let outstanding = outstanding_debt(records);

    if outstanding == 0 {
        return Ok(Projection {
            outstanding,
            monthly_payment,
            months: 0,
            final_payment: 0,
        });
    }
    if monthly_payment <= 0 {
        return Err(ProjectionError::NonPositivePayment {
            monthly_payment,
            outstanding,
        });
    }

    let months = (outstanding as u64).div_ceil(monthly_payment as u64);
    let final_payment = outstanding - monthly_payment * (months as i64 - 1);

    Ok(Projection {
        outstanding,
        monthly_payment,
        months,
        final_payment,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    NonPositivePayment {
        monthly_payment: Cents,
        outstanding: Cents,
    },
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionError::NonPositivePayment {
                monthly_payment,
                outstanding,
            } => write!(
                f,
                "Monthly payment must be positive while {} cents of debt are outstanding (got {})",
                outstanding, monthly_payment
            ),
        }
    }
}

impl std::error::Error for ProjectionError {}

/// Balance after a given record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub amount_cents: Cents,
    pub balance: Cents,
}

/// Cumulative net balance after each record, in ledger order.
pub fn running_balance(records: &[BudgetRecord]) -> Vec<BalancePoint> {
    records
        .iter()
        .scan(0, |balance, record| {
            *balance += record.amount_cents;
            Some(BalancePoint {
                timestamp: record.timestamp,
                category: record.category.clone(),
                amount_cents: record.amount_cents,
                balance: *balance,
            })
        })
        .collect()
}
