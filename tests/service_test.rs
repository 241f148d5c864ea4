mod common;

use std::fs;

use anyhow::Result;
use common::{parse_date, test_service, StandardMonth};
use debtcoach::application::{AppError, HistoryFilter};
use debtcoach::domain::{Allocation, Expense, ExpenseStatus, Loan, Strategy, MAX_AMOUNT_CENTS};

#[test]
fn test_summary_of_standard_month() -> Result<()> {
    let (service, _temp) = test_service()?;
    StandardMonth::record_basic(&service)?;

    let summary = service.summary()?;

    assert_eq!(summary.total_inflow, 100000);
    assert_eq!(summary.total_outflow, 60000);
    assert_eq!(summary.net_balance, 40000);
    assert_eq!(summary.by_category.len(), 2);
    assert_eq!(summary.by_category.get("income"), Some(&100000));
    assert_eq!(summary.by_category.get("rent"), Some(&-60000));

    Ok(())
}

#[test]
fn test_summary_of_fresh_ledger() -> Result<()> {
    let (service, _temp) = test_service()?;

    let summary = service.summary()?;

    assert_eq!(summary.total_inflow, 0);
    assert_eq!(summary.total_outflow, 0);
    assert_eq!(summary.net_balance, 0);
    assert!(summary.by_category.is_empty());
    assert!(!service.store().exists());

    Ok(())
}

#[test]
fn test_repeated_summaries_agree() -> Result<()> {
    let (service, _temp) = test_service()?;
    StandardMonth::record_with_debt(&service)?;

    assert_eq!(service.summary()?, service.summary()?);

    Ok(())
}

#[test]
fn test_non_numeric_amount_leaves_ledger_untouched() -> Result<()> {
    let (service, _temp) = test_service()?;
    StandardMonth::record_basic(&service)?;
    let before = fs::read(service.store().path())?;

    let result = service.record_entry("rent", "five hundred", None, parse_date("2024-01-10"));

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(fs::read(service.store().path())?, before);

    Ok(())
}

#[test]
fn test_non_numeric_amount_on_fresh_ledger_creates_nothing() -> Result<()> {
    let (service, _temp) = test_service()?;

    let result = service.record_entry("income", "NaN", None, parse_date("2024-01-01"));

    assert!(result.unwrap_err().is_validation());
    assert!(!service.store().exists());

    Ok(())
}

#[test]
fn test_largest_amounts_sum_without_overflow() -> Result<()> {
    let (service, _temp) = test_service()?;
    service.record_entry("income", "10000000000", None, parse_date("2024-01-01"))?;
    service.record_entry("income", "10000000000", None, parse_date("2024-01-02"))?;
    service.record_entry("rent", "-10000000000", None, parse_date("2024-01-03"))?;

    let summary = service.summary()?;

    assert_eq!(summary.total_inflow, 2 * MAX_AMOUNT_CENTS);
    assert_eq!(summary.total_outflow, MAX_AMOUNT_CENTS);
    assert_eq!(summary.net_balance, MAX_AMOUNT_CENTS);
    assert_eq!(
        service.running_balance()?.last().map(|p| p.balance),
        Some(MAX_AMOUNT_CENTS)
    );

    Ok(())
}

#[test]
fn test_amount_beyond_limit_is_validation_error() -> Result<()> {
    let (service, _temp) = test_service()?;
    StandardMonth::record_basic(&service)?;
    let before = fs::read(service.store().path())?;

    let result = service.record_entry("income", "90000000000000000", None, parse_date("2024-01-10"));

    assert!(result.unwrap_err().is_validation());
    assert_eq!(fs::read(service.store().path())?, before);
    assert_eq!(service.summary()?.net_balance, 40000);

    Ok(())
}

#[test]
fn test_empty_category_is_validation_error() -> Result<()> {
    let (service, _temp) = test_service()?;

    let result = service.record_entry("", "10", None, parse_date("2024-01-01"));

    assert!(result.unwrap_err().is_validation());

    Ok(())
}

#[test]
fn test_corrupt_ledger_is_validation_error() -> Result<()> {
    let (service, _temp) = test_service()?;
    fs::write(
        service.store().path(),
        "timestamp,category,amount,note\n2024-01-01T00:00:00Z,income,abc,\n",
    )?;

    let err = service.summary().unwrap_err();

    assert!(err.is_validation());
    assert!(err.to_string().contains("line 2"));

    Ok(())
}

#[test]
fn test_debt_projection_from_ledger() -> Result<()> {
    let (service, _temp) = test_service()?;
    StandardMonth::record_with_debt(&service)?;

    // 1800 borrowed, 600 repaid
    let projection = service.debt_projection(30000)?;

    assert_eq!(projection.outstanding, 120000);
    assert_eq!(projection.months, 4);

    Ok(())
}

#[test]
fn test_debt_projection_zero_payment_is_invalid_input() -> Result<()> {
    let (service, _temp) = test_service()?;
    StandardMonth::record_with_debt(&service)?;

    let err = service.debt_projection(0).unwrap_err();

    assert!(err.is_invalid_input());

    Ok(())
}

#[test]
fn test_debt_projection_without_debt() -> Result<()> {
    let (service, _temp) = test_service()?;
    StandardMonth::record_basic(&service)?;

    let projection = service.debt_projection(0)?;

    assert_eq!(projection.months, 0);

    Ok(())
}

#[test]
fn test_history_filters() -> Result<()> {
    let (service, _temp) = test_service()?;
    StandardMonth::record_with_debt(&service)?;

    let rent = service.history(&HistoryFilter {
        category: Some("RENT".into()),
        ..Default::default()
    })?;
    assert_eq!(rent.len(), 2);

    let february_onwards = service.history(&HistoryFilter {
        from_date: Some(parse_date("2024-02-01")),
        ..Default::default()
    })?;
    assert_eq!(february_onwards.len(), 2);

    let january = service.history(&HistoryFilter {
        to_date: Some(parse_date("2024-01-31")),
        ..Default::default()
    })?;
    assert_eq!(january.len(), 4);

    let last_two = service.history(&HistoryFilter {
        limit: Some(2),
        ..Default::default()
    })?;
    assert_eq!(last_two.len(), 2);
    assert_eq!(last_two[1].timestamp, parse_date("2024-03-05"));

    Ok(())
}

#[test]
fn test_running_balance_and_cash_flow() -> Result<()> {
    let (service, _temp) = test_service()?;
    StandardMonth::record_with_debt(&service)?;

    let points = service.running_balance()?;
    assert_eq!(points.len(), 6);
    assert_eq!(points.last().unwrap().balance, service.summary()?.net_balance);

    let flow = service.monthly_cash_flow()?;
    let months: Vec<&str> = flow.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
    assert_eq!(flow[0].inflow, 280000);
    assert_eq!(flow[0].outflow, 60000);
    assert_eq!(flow[1].net, -30000);

    Ok(())
}

#[test]
fn test_plan_rejects_min_payments_over_budget() -> Result<()> {
    let (service, _temp) = test_service()?;

    let err = service
        .plan(
            100000,
            Allocation::default(),
            vec![Loan::new("card", 500000, 20.0, 25000)],
            vec![],
        )
        .unwrap_err();

    assert!(err.is_invalid_input());
    assert!(err.to_string().contains("minimum payments"));

    Ok(())
}

#[test]
fn test_record_plan_appends_month() -> Result<()> {
    let (service, _temp) = test_service()?;

    let plan = service.plan(
        5000000,
        Allocation::FixedSavings { savings: 400000 },
        vec![
            Loan::new("card", 300000, 8.0, 20000),
            Loan::new("car", 2000000, 24.0, 60000),
        ],
        vec![Expense::new("rent", 2000000), Expense::new("food", 800000)],
    )?;

    assert_eq!(plan.buckets.debt, 1000000);
    assert_eq!(plan.buckets.expenses, 3600000);
    assert_eq!(plan.expense_status, ExpenseStatus::WithinBudget { spare: 800000 });
    assert_eq!(plan.strategies.recommended, Strategy::Avalanche);

    let entries = service.record_plan(&plan, parse_date("2024-04-01"))?;
    assert_eq!(entries.len(), 5);

    let summary = service.summary()?;
    assert_eq!(summary.total_inflow, 5000000);
    assert_eq!(summary.total_outflow, 400000 + 2000000 + 800000 + 1000000);
    assert_eq!(summary.by_category.get("debt_payment"), Some(&-1000000));

    Ok(())
}

#[test]
fn test_record_plan_rejects_stale_timestamp() -> Result<()> {
    let (service, _temp) = test_service()?;
    StandardMonth::record_basic(&service)?;
    let before = service.records()?;

    let plan = service.plan(100000, Allocation::default(), vec![], vec![])?;
    let err = service
        .record_plan(&plan, parse_date("2023-12-01"))
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(service.records()?, before);

    Ok(())
}
