use serde::{Deserialize, Serialize};

use super::{
    compare_strategies, format_cents, Cents, Loan, LoanError, StrategyComparison, MAX_AMOUNT_CENTS,
};

/// Share of salary set aside for debt when savings are a fixed amount.
pub const DEFAULT_DEBT_SHARE_PERCENT: i64 = 20;

/// How a monthly salary is divided between savings, debt and expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allocation {
    /// A fixed savings amount; debt gets 20% of salary and expenses the rest.
    FixedSavings { savings: Cents },
    /// Percentages of salary for each bucket.
    Split {
        savings_pct: u8,
        debt_pct: u8,
        expenses_pct: u8,
    },
}

impl Default for Allocation {
    fn default() -> Self {
        Allocation::Split {
            savings_pct: 10,
            debt_pct: 20,
            expenses_pct: 70,
        }
    }
}

/// The three monthly buckets produced by an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buckets {
    pub savings: Cents,
    pub debt: Cents,
    pub expenses: Cents,
}

impl Allocation {
    pub fn buckets(&self, salary: Cents) -> Result<Buckets, PlanError> {
        if salary <= 0 {
            return Err(PlanError::NonPositiveSalary);
        }
        if salary > MAX_AMOUNT_CENTS {
            return Err(PlanError::SalaryTooLarge);
        }

        match *self {
            Allocation::FixedSavings { savings } => {
                if savings < 0 {
                    return Err(PlanError::NegativeSavings);
                }
                let debt = salary * DEFAULT_DEBT_SHARE_PERCENT / 100;
                if savings > salary - debt {
                    return Err(PlanError::SavingsExceedSalary {
                        savings,
                        available: salary - debt,
                    });
                }
                Ok(Buckets {
                    savings,
                    debt,
                    expenses: salary - savings - debt,
                })
            }
            Allocation::Split {
                savings_pct,
                debt_pct,
                expenses_pct,
            } => {
                let total = savings_pct as u32 + debt_pct as u32 + expenses_pct as u32;
                if total > 100 {
                    return Err(PlanError::InvalidSplit { total });
                }
                let share = |pct: u8| salary * pct as i64 / 100;
                Ok(Buckets {
                    savings: share(savings_pct),
                    debt: share(debt_pct),
                    expenses: share(expenses_pct),
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub label: String,
    pub amount: Cents,
}

impl Expense {
    pub fn new(label: impl Into<String>, amount: Cents) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExpenseStatus {
    WithinBudget { spare: Cents },
    OverBudget { excess: Cents },
}

/// A validated monthly plan: buckets, loan strategy comparison and expense check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlan {
    pub salary: Cents,
    pub buckets: Buckets,
    pub loans: Vec<Loan>,
    pub expenses: Vec<Expense>,
    pub total_min_payments: Cents,
    pub total_expenses: Cents,
    pub expense_status: ExpenseStatus,
    pub strategies: StrategyComparison,
}

/// Build a plan for one month of salary.
///
/// Loans must be valid and their minimum payments must fit in the debt bucket.
/// Expenses above the expenses bucket are reported, not rejected.
pub fn plan_budget(
    salary: Cents,
    allocation: Allocation,
    loans: Vec<Loan>,
    expenses: Vec<Expense>,
) -> Result<BudgetPlan, PlanError> {
    let buckets = allocation.buckets(salary)?;

    for (index, loan) in loans.iter().enumerate() {
        loan.validate()
            .map_err(|error| PlanError::InvalidLoan { index, error })?;
    }

    let total_min_payments: Cents = loans.iter().map(|l| l.min_payment).sum();
    if total_min_payments > buckets.debt {
        return Err(PlanError::MinPaymentsExceedDebtBudget {
            total_min_payments,
            debt_budget: buckets.debt,
        });
    }

    if let Some(expense) = expenses
        .iter()
        .find(|e| e.label.trim().is_empty() || !(0..=MAX_AMOUNT_CENTS).contains(&e.amount))
    {
        return Err(PlanError::InvalidExpense(expense.label.clone()));
    }

    let total_expenses: Cents = expenses.iter().map(|e| e.amount).sum();
    let expense_status = if total_expenses > buckets.expenses {
        ExpenseStatus::OverBudget {
            excess: total_expenses - buckets.expenses,
        }
    } else {
        ExpenseStatus::WithinBudget {
            spare: buckets.expenses - total_expenses,
        }
    };

    let strategies = compare_strategies(&loans, buckets.debt);

    Ok(BudgetPlan {
        salary,
        buckets,
        loans,
        expenses,
        total_min_payments,
        total_expenses,
        expense_status,
        strategies,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    NonPositiveSalary,
    SalaryTooLarge,
    NegativeSavings,
    SavingsExceedSalary { savings: Cents, available: Cents },
    InvalidSplit { total: u32 },
    InvalidLoan { index: usize, error: LoanError },
    MinPaymentsExceedDebtBudget {
        total_min_payments: Cents,
        debt_budget: Cents,
    },
    InvalidExpense(String),
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanError::NonPositiveSalary => write!(f, "Salary must be positive"),
            PlanError::SalaryTooLarge => {
                write!(f, "Salary must not exceed {}", format_cents(MAX_AMOUNT_CENTS))
            }
            PlanError::NegativeSavings => write!(f, "Savings must be non-negative"),
            PlanError::SavingsExceedSalary { savings, available } => write!(
                f,
                "Savings ({}) exceed what is left after the debt budget ({})",
                format_cents(*savings),
                format_cents(*available)
            ),
            PlanError::InvalidSplit { total } => {
                write!(f, "Savings/debt/expenses split adds up to {}%, more than 100%", total)
            }
            PlanError::InvalidLoan { index, error } => write!(f, "Loan {}: {}", index + 1, error),
            PlanError::MinPaymentsExceedDebtBudget {
                total_min_payments,
                debt_budget,
            } => write!(
                f,
                "Total minimum payments ({}) exceed debt budget ({})",
                format_cents(*total_min_payments),
                format_cents(*debt_budget)
            ),
            PlanError::InvalidExpense(label) => write!(
                f,
                "Expense '{}' needs a name and an amount between 0 and {}",
                label,
                format_cents(MAX_AMOUNT_CENTS)
            ),
        }
    }
}

impl std::error::Error for PlanError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_savings_buckets() {
        let buckets = Allocation::FixedSavings { savings: 400000 }
            .buckets(5000000)
            .unwrap();

        assert_eq!(buckets.savings, 400000);
        assert_eq!(buckets.debt, 1000000);
        assert_eq!(buckets.expenses, 3600000);
    }

    #[test]
    fn test_split_buckets() {
        let buckets = Allocation::default().buckets(1000000).unwrap();

        assert_eq!(buckets.savings, 100000);
        assert_eq!(buckets.debt, 200000);
        assert_eq!(buckets.expenses, 700000);
    }

    #[test]
    fn test_bucket_errors() {
        assert_eq!(
            Allocation::default().buckets(0),
            Err(PlanError::NonPositiveSalary)
        );
        assert_eq!(
            Allocation::FixedSavings { savings: -1 }.buckets(1000),
            Err(PlanError::NegativeSavings)
        );
        assert!(matches!(
            Allocation::FixedSavings { savings: 900 }.buckets(1000),
            Err(PlanError::SavingsExceedSalary { available: 800, .. })
        ));
        assert_eq!(
            Allocation::Split {
                savings_pct: 50,
                debt_pct: 40,
                expenses_pct: 20
            }
            .buckets(1000),
            Err(PlanError::InvalidSplit { total: 110 })
        );
    }

    #[test]
    fn test_plan_within_budget() {
        let plan = plan_budget(
            1000000,
            Allocation::default(),
            vec![Loan::new("card", 300000, 18.0, 50000)],
            vec![Expense::new("rent", 400000), Expense::new("food", 150000)],
        )
        .unwrap();

        assert_eq!(plan.total_min_payments, 50000);
        assert_eq!(plan.total_expenses, 550000);
        assert_eq!(
            plan.expense_status,
            ExpenseStatus::WithinBudget { spare: 150000 }
        );
        assert!(plan.strategies.avalanche.paid_off);
    }

    #[test]
    fn test_plan_over_budget_is_a_warning() {
        let plan = plan_budget(
            100000,
            Allocation::default(),
            vec![],
            vec![Expense::new("rent", 80000)],
        )
        .unwrap();

        assert_eq!(plan.expense_status, ExpenseStatus::OverBudget { excess: 10000 });
    }

    #[test]
    fn test_plan_rejects_min_payments_over_debt_budget() {
        let result = plan_budget(
            100000,
            Allocation::default(),
            vec![
                Loan::new("card", 50000, 20.0, 15000),
                Loan::new("phone", 30000, 0.0, 10000),
            ],
            vec![],
        );

        assert_eq!(
            result,
            Err(PlanError::MinPaymentsExceedDebtBudget {
                total_min_payments: 25000,
                debt_budget: 20000,
            })
        );
    }

    #[test]
    fn test_plan_rejects_invalid_loan() {
        let result = plan_budget(
            100000,
            Allocation::default(),
            vec![Loan::new("card", 100, 1.0, 10), Loan::new("", 100, 1.0, 10)],
            vec![],
        );

        assert_eq!(
            result,
            Err(PlanError::InvalidLoan {
                index: 1,
                error: LoanError::EmptyName
            })
        );
    }

    #[test]
    fn test_plan_rejects_invalid_expense() {
        let result = plan_budget(
            100000,
            Allocation::default(),
            vec![],
            vec![Expense::new("gym", -5)],
        );

        assert_eq!(result, Err(PlanError::InvalidExpense("gym".to_string())));
    }

    #[test]
    fn test_plan_rejects_out_of_range_values() {
        assert_eq!(
            plan_budget(MAX_AMOUNT_CENTS + 1, Allocation::default(), vec![], vec![]),
            Err(PlanError::SalaryTooLarge)
        );

        let runaway_rate = plan_budget(
            100000,
            Allocation::default(),
            vec![Loan::new("card", 100000, 1e300, 1000)],
            vec![],
        );
        assert!(matches!(
            runaway_rate,
            Err(PlanError::InvalidLoan {
                index: 0,
                error: LoanError::InvalidRate(_)
            })
        ));

        let huge_expense = plan_budget(
            100000,
            Allocation::default(),
            vec![],
            vec![Expense::new("yacht", Cents::MAX)],
        );
        assert_eq!(huge_expense, Err(PlanError::InvalidExpense("yacht".to_string())));
    }
}
