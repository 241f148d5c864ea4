use serde::{Deserialize, Serialize};

use super::{format_cents, Cents, MAX_AMOUNT_CENTS};

/// Simulations give up after fifty years.
pub const MAX_PAYOFF_MONTHS: u32 = 600;

/// Highest annual rate, in percent, a loan may carry.
pub const MAX_ANNUAL_RATE: f64 = 1000.0;

/// An interest-bearing loan entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub name: String,
    pub balance: Cents,
    /// Annual interest rate in percent (e.g. 12.5)
    pub annual_rate: f64,
    pub min_payment: Cents,
}

impl Loan {
    pub fn new(name: impl Into<String>, balance: Cents, annual_rate: f64, min_payment: Cents) -> Self {
        Self {
            name: name.into(),
            balance,
            annual_rate,
            min_payment,
        }
    }

    pub fn validate(&self) -> Result<(), LoanError> {
        if self.name.trim().is_empty() {
            return Err(LoanError::EmptyName);
        }
        if self.balance < 0 {
            return Err(LoanError::NegativeBalance(self.name.clone()));
        }
        if !(0.0..=MAX_ANNUAL_RATE).contains(&self.annual_rate) {
            return Err(LoanError::InvalidRate(self.name.clone()));
        }
        if self.min_payment < 0 {
            return Err(LoanError::NegativeMinPayment(self.name.clone()));
        }
        if self.balance > MAX_AMOUNT_CENTS || self.min_payment > MAX_AMOUNT_CENTS {
            return Err(LoanError::AmountTooLarge(self.name.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanError {
    EmptyName,
    NegativeBalance(String),
    InvalidRate(String),
    NegativeMinPayment(String),
    AmountTooLarge(String),
}

impl std::fmt::Display for LoanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoanError::EmptyName => write!(f, "loan name cannot be empty"),
            LoanError::NegativeBalance(name) => write!(f, "loan {}: balance must be non-negative", name),
            LoanError::InvalidRate(name) => {
                write!(
                    f,
                    "loan {}: interest rate must be between 0 and {}%",
                    name, MAX_ANNUAL_RATE
                )
            }
            LoanError::NegativeMinPayment(name) => {
                write!(f, "loan {}: minimum payment must be non-negative", name)
            }
            LoanError::AmountTooLarge(name) => write!(
                f,
                "loan {}: amounts must not exceed {}",
                name,
                format_cents(MAX_AMOUNT_CENTS)
            ),
        }
    }
}

impl std::error::Error for LoanError {}

/// One month of interest, rounded to the cent. Saturates at `Cents::MAX`.
fn monthly_interest(balance: Cents, annual_rate: f64) -> Cents {
    (balance as f64 * annual_rate / 100.0 / 12.0).round() as Cents
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffResult {
    pub months: u32,
    pub total_interest: Cents,
    /// False when the month cap was hit with debt still outstanding
    pub paid_off: bool,
}

/// Months to clear a single balance with monthly compounding.
/// Interest is added first, then the payment is taken.
pub fn payoff_months(balance: Cents, annual_rate: f64, monthly_payment: Cents) -> PayoffResult {
    let mut balance = balance;
    let mut months = 0;
    let mut total_interest: Cents = 0;

    while balance > 0 && months < MAX_PAYOFF_MONTHS {
        let interest = monthly_interest(balance, annual_rate);
        balance = balance
            .saturating_add(interest)
            .saturating_sub(monthly_payment)
            .max(0);
        total_interest = total_interest.saturating_add(interest);
        months += 1;
    }

    PayoffResult {
        months,
        total_interest,
        paid_off: balance <= 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Extra money goes to the smallest balance first
    Snowball,
    /// Extra money goes to the highest interest rate first
    Avalanche,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Snowball => "snowball",
            Strategy::Avalanche => "avalanche",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "snowball" => Some(Strategy::Snowball),
            "avalanche" => Some(Strategy::Avalanche),
            _ => None,
        }
    }

    /// Order loans by this strategy's priority. Ties keep their input order.
    pub fn prioritize(&self, loans: &[Loan]) -> Vec<Loan> {
        let mut ordered = loans.to_vec();
        match self {
            Strategy::Snowball => ordered.sort_by_key(|loan| loan.balance),
            Strategy::Avalanche => {
                ordered.sort_by(|a, b| b.annual_rate.total_cmp(&a.annual_rate))
            }
        }
        ordered
    }

    pub fn simulate(&self, loans: &[Loan], monthly_budget: Cents) -> PayoffResult {
        simulate(&self.prioritize(loans), monthly_budget)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn snowball(loans: &[Loan], monthly_budget: Cents) -> PayoffResult {
    Strategy::Snowball.simulate(loans, monthly_budget)
}

pub fn avalanche(loans: &[Loan], monthly_budget: Cents) -> PayoffResult {
    Strategy::Avalanche.simulate(loans, monthly_budget)
}

/// Pay down `loans` (already in priority order) with a fixed monthly budget.
///
/// Every open loan accrues interest and receives its minimum payment. Whatever
/// is left of the budget goes to the first loan that is still open.
fn simulate(loans: &[Loan], monthly_budget: Cents) -> PayoffResult {
    let mut balances: Vec<Cents> = loans.iter().map(|loan| loan.balance).collect();
    let mut months = 0;
    let mut total_interest: Cents = 0;

    while balances.iter().any(|&b| b > 0) && months < MAX_PAYOFF_MONTHS {
        let mut extra_left = monthly_budget;

        for (loan, balance) in loans.iter().zip(balances.iter_mut()) {
            if *balance <= 0 {
                continue;
            }
            let interest = monthly_interest(*balance, loan.annual_rate);
            *balance = balance.saturating_add(interest);
            total_interest = total_interest.saturating_add(interest);

            let payment = loan.min_payment.min(*balance).max(0);
            *balance -= payment;
            extra_left = extra_left.saturating_sub(payment);
        }

        let extra_left = extra_left.max(0);
        if extra_left > 0 {
            if let Some(target) = balances.iter_mut().find(|b| **b > 0) {
                let payment = extra_left.min(*target);
                *target -= payment;
            }
        }

        months += 1;
    }

    PayoffResult {
        months,
        total_interest,
        paid_off: balances.iter().all(|&b| b <= 0),
    }
}

/// Snowball and avalanche side by side with a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub snowball: PayoffResult,
    pub avalanche: PayoffResult,
    pub recommended: Strategy,
    pub advice: String,
}

pub fn compare_strategies(loans: &[Loan], monthly_budget: Cents) -> StrategyComparison {
    let snowball = snowball(loans, monthly_budget);
    let avalanche = avalanche(loans, monthly_budget);

    let (recommended, advice) = if avalanche.total_interest < snowball.total_interest {
        (
            Strategy::Avalanche,
            "Avalanche saves more money in interest. Stick to avalanche if discipline is high.",
        )
    } else {
        (
            Strategy::Snowball,
            "Snowball gives faster wins. Use snowball for motivation.",
        )
    };

    StrategyComparison {
        snowball,
        avalanche,
        recommended,
        advice: advice.to_string(),
    }
}
