use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::{
    debt_projection, parse_cents, plan_budget, running_balance, summarize, Allocation,
    BalancePoint, BudgetPlan, BudgetRecord, Cents, Expense, ExpenseStatus, Loan, Projection,
    Summary, DEBT_PAYMENT_CATEGORY,
};
use crate::storage::LedgerStore;

use super::{category_breakdown, monthly_cash_flow, AppError, CategorySummary, MonthlyFlow, SummarySnapshot};

/// Category used for salary when a plan is recorded.
pub const INCOME_CATEGORY: &str = "income";

/// Category used for the savings bucket when a plan is recorded.
pub const SAVINGS_CATEGORY: &str = "savings";

/// Application service providing the budget use cases.
/// This is the primary interface for any client (CLI, web, TUI, etc.).
/// Every query reloads the ledger, so calls can come in any order.
pub struct BudgetService {
    store: LedgerStore,
}

/// Filter for querying the history
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub category: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    /// Keep only the most recent N matching records
    pub limit: Option<usize>,
}

impl HistoryFilter {
    fn matches(&self, record: &BudgetRecord) -> bool {
        if let Some(category) = &self.category {
            if !record.category.trim().eq_ignore_ascii_case(category.trim()) {
                return false;
            }
        }
        if let Some(from) = self.from_date {
            if record.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to_date {
            if record.timestamp > to {
                return false;
            }
        }
        true
    }
}

impl BudgetService {
    /// Create a new service over the given store.
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Open the ledger file at the given path. The file is created on first append.
    pub fn open(ledger_path: impl Into<PathBuf>) -> Self {
        Self::new(LedgerStore::new(ledger_path))
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    // ========================
    // Recording
    // ========================

    /// Record an entry from raw user input.
    /// A non-numeric amount is rejected before the ledger is touched.
    pub fn record_entry(
        &self,
        category: &str,
        amount: &str,
        note: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<BudgetRecord, AppError> {
        let amount_cents = parse_cents(amount)?;

        let mut record = BudgetRecord::new(timestamp, category, amount_cents);
        if let Some(note) = note {
            record = record.with_note(note);
        }

        self.record(&record)?;
        Ok(record)
    }

    /// Append an already-built record.
    pub fn record(&self, record: &BudgetRecord) -> Result<(), AppError> {
        self.store.append(record)?;
        info!(
            category = %record.category,
            amount = record.amount_cents,
            "recorded entry"
        );
        Ok(())
    }

    // ========================
    // Queries
    // ========================

    /// All records in ledger order.
    pub fn records(&self) -> Result<Vec<BudgetRecord>, AppError> {
        Ok(self.store.load()?)
    }

    pub fn history(&self, filter: &HistoryFilter) -> Result<Vec<BudgetRecord>, AppError> {
        let mut records: Vec<BudgetRecord> = self
            .records()?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();

        if let Some(limit) = filter.limit {
            let skip = records.len().saturating_sub(limit);
            records.drain(..skip);
        }
        Ok(records)
    }

    pub fn summary(&self) -> Result<Summary, AppError> {
        Ok(summarize(&self.records()?))
    }

    pub fn snapshot(&self, generated_at: DateTime<Utc>) -> Result<SummarySnapshot, AppError> {
        Ok(SummarySnapshot::from_records(&self.records()?, generated_at))
    }

    pub fn category_report(&self) -> Result<Vec<CategorySummary>, AppError> {
        Ok(category_breakdown(&self.records()?))
    }

    pub fn monthly_cash_flow(&self) -> Result<Vec<MonthlyFlow>, AppError> {
        Ok(monthly_cash_flow(&self.records()?))
    }

    pub fn running_balance(&self) -> Result<Vec<BalancePoint>, AppError> {
        Ok(running_balance(&self.records()?))
    }

    /// Months to clear the debt recorded in the ledger at a fixed monthly payment.
    pub fn debt_projection(&self, monthly_payment: Cents) -> Result<Projection, AppError> {
        Ok(debt_projection(&self.records()?, monthly_payment)?)
    }

    // ========================
    // Planning
    // ========================

    /// Build a monthly plan. Over-budget expenses are logged and reported in
    /// the plan, not treated as an error.
    pub fn plan(
        &self,
        salary: Cents,
        allocation: Allocation,
        loans: Vec<Loan>,
        expenses: Vec<Expense>,
    ) -> Result<BudgetPlan, AppError> {
        let plan = plan_budget(salary, allocation, loans, expenses)?;

        if let ExpenseStatus::OverBudget { excess } = plan.expense_status {
            warn!(
                excess,
                expenses_budget = plan.buckets.expenses,
                "expenses exceed budget"
            );
        }
        Ok(plan)
    }

    /// Append a plan to the ledger as one month of entries: salary in, then
    /// savings, each expense and the debt budget out. Zero amounts are skipped.
    ///
    /// All entries are checked before the first one is written.
    pub fn record_plan(
        &self,
        plan: &BudgetPlan,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<BudgetRecord>, AppError> {
        let mut entries = vec![
            BudgetRecord::new(timestamp, INCOME_CATEGORY, plan.salary).with_note("salary"),
            BudgetRecord::new(timestamp, SAVINGS_CATEGORY, -plan.buckets.savings),
        ];
        entries.extend(
            plan.expenses
                .iter()
                .map(|e| BudgetRecord::new(timestamp, e.label.trim(), -e.amount)),
        );
        entries.push(
            BudgetRecord::new(timestamp, DEBT_PAYMENT_CATEGORY, -plan.buckets.debt)
                .with_note(format!("{} plan", plan.strategies.recommended)),
        );
        entries.retain(|r| r.amount_cents != 0);

        for entry in &entries {
            entry
                .validate()
                .map_err(|e| AppError::Validation(e.to_string()))?;
        }
        if let Some(last) = self.records()?.last() {
            if timestamp < last.timestamp {
                return Err(AppError::Validation(
                    "plan timestamp is earlier than the last recorded entry".to_string(),
                ));
            }
        }

        for entry in &entries {
            self.record(entry)?;
        }
        Ok(entries)
    }
}
