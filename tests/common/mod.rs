// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use debtcoach::application::BudgetService;
use tempfile::TempDir;

/// Helper to create a test service over a ledger file in a temporary directory.
/// The file itself is not created until the first append.
pub fn test_service() -> Result<(BudgetService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = BudgetService::open(ledger_path(&temp_dir));
    Ok((service, temp_dir))
}

pub fn ledger_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("budget_history.csv")
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Test fixture: a typical first month
pub struct StandardMonth;

impl StandardMonth {
    /// Salary in, rent and groceries out
    pub fn record_basic(service: &BudgetService) -> Result<()> {
        service.record_entry("income", "1000", Some("salary".into()), parse_date("2024-01-01"))?;
        service.record_entry("rent", "-500", None, parse_date("2024-01-02"))?;
        service.record_entry("rent", "-100", Some("late fee".into()), parse_date("2024-01-03"))?;
        Ok(())
    }

    /// Basic month plus a loan and two repayments
    pub fn record_with_debt(service: &BudgetService) -> Result<()> {
        Self::record_basic(service)?;
        service.record_entry("debt", "1800", Some("car loan".into()), parse_date("2024-01-05"))?;
        service.record_entry("debt_payment", "-300", None, parse_date("2024-02-05"))?;
        service.record_entry("debt_payment", "-300", None, parse_date("2024-03-05"))?;
        Ok(())
    }
}
