use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::io::stdout;
use tracing_subscriber::EnvFilter;

use crate::application::{BudgetService, HistoryFilter};
use crate::domain::{
    compare_strategies, format_cents, parse_cents, payoff_months, Allocation, BudgetPlan, Expense,
    ExpenseStatus, Loan, StrategyComparison,
};
use crate::io::{
    write_balance_csv, write_cash_flow_csv, write_categories_csv, write_records_csv, Exporter,
};

/// debtcoach - Budget & Debt Coach
#[derive(Parser)]
#[command(name = "debtcoach")]
#[command(about = "A local-first budget ledger with debt payoff planning")]
#[command(version)]
pub struct Cli {
    /// Ledger file path (CSV)
    #[arg(short, long, default_value = "budget_history.csv", global = true)]
    pub ledger: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record an income, expense or debt entry
    Add {
        /// Category label (e.g., "income", "rent", "debt", "debt_payment")
        category: String,

        /// Signed amount: positive for money in, negative for money out (e.g., "-50.00")
        #[arg(allow_negative_numbers = true)]
        amount: String,

        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,

        /// Date of the entry (YYYY-MM-DD or RFC 3339, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List recorded entries
    History {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Filter from date (YYYY-MM-DD)
        #[arg(long)]
        from_date: Option<String>,

        /// Filter to date (YYYY-MM-DD)
        #[arg(long)]
        to_date: Option<String>,

        /// Show only the most recent N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Totals and per-category breakdown
    Summary {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Running balance after each entry
    Balance {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Inflow and outflow per month
    Cashflow {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Months to clear the debt recorded in the ledger
    Project {
        /// Fixed monthly payment (e.g., "300.00")
        #[arg(allow_negative_numbers = true)]
        payment: String,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Compare snowball and avalanche payoff for a set of loans
    Payoff {
        /// Loan as NAME:BALANCE:RATE:MIN_PAYMENT (repeatable)
        #[arg(long = "loan", required = true)]
        loans: Vec<String>,

        /// Monthly debt budget (defaults to the sum of minimum payments)
        #[arg(long)]
        budget: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Split a salary into savings, debt and expenses and check it against loans
    Plan {
        /// Monthly salary
        salary: String,

        /// Fixed monthly savings amount (debt gets 20% of salary, expenses the rest)
        #[arg(long, conflicts_with = "split")]
        savings: Option<String>,

        /// Savings/debt/expenses percentages (e.g., "10,20,70")
        #[arg(long)]
        split: Option<String>,

        /// Loan as NAME:BALANCE:RATE:MIN_PAYMENT (repeatable)
        #[arg(long = "loan")]
        loans: Vec<String>,

        /// Expense as LABEL=AMOUNT (repeatable)
        #[arg(long = "expense")]
        expenses: Vec<String>,

        /// Append the plan to the ledger as this month's entries
        #[arg(long)]
        record: bool,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: records, cashflow, summary
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    fn init_logging(&self) {
        let default_level = if self.verbose { "debug" } else { "warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        // A subscriber may already be installed when embedded; keep the existing one.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    pub fn run(self) -> Result<()> {
        self.init_logging();
        let service = BudgetService::open(&self.ledger);

        match self.command {
            Commands::Add {
                category,
                amount,
                note,
                date,
            } => {
                let timestamp = match date {
                    Some(date_str) => parse_timestamp(&date_str).with_context(|| {
                        format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str)
                    })?,
                    None => Utc::now(),
                };

                let record = service.record_entry(&category, &amount, note, timestamp)?;

                println!(
                    "Recorded: {} {} ({})",
                    record.category,
                    format_cents(record.amount_cents),
                    record.timestamp.format("%Y-%m-%d %H:%M")
                );
            }

            Commands::History {
                category,
                from_date,
                to_date,
                limit,
                format,
            } => {
                let filter = HistoryFilter {
                    category,
                    from_date: from_date.as_deref().map(parse_date).transpose()?,
                    to_date: to_date.as_deref().map(parse_date).transpose()?,
                    limit,
                };
                run_history_command(&service, &filter, &format)?;
            }

            Commands::Summary { format } => run_summary_command(&service, &format)?,

            Commands::Balance { format } => run_balance_command(&service, &format)?,

            Commands::Cashflow { format } => run_cashflow_command(&service, &format)?,

            Commands::Project { payment, format } => {
                let payment = parse_cents(&payment)
                    .context("Invalid payment format. Use '300.00' or '300'")?;
                let projection = service.debt_projection(payment)?;

                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&projection)?),
                    _ => {
                        if projection.outstanding == 0 {
                            println!("No outstanding debt recorded.");
                        } else {
                            println!("Outstanding debt: {}", format_cents(projection.outstanding));
                            println!("Monthly payment:  {}", format_cents(projection.monthly_payment));
                            println!("Months to payoff: {}", projection.months);
                            println!("Final payment:    {}", format_cents(projection.final_payment));
                        }
                    }
                }
            }

            Commands::Payoff {
                loans,
                budget,
                format,
            } => {
                let loans = parse_loans(&loans)?;
                for loan in &loans {
                    loan.validate()?;
                }
                let budget = match budget {
                    Some(b) => parse_cents(&b).context("Invalid budget amount")?,
                    None => loans.iter().map(|l| l.min_payment).sum(),
                };
                let comparison = compare_strategies(&loans, budget);
                run_payoff_output(&loans, &comparison, &format)?;
            }

            Commands::Plan {
                salary,
                savings,
                split,
                loans,
                expenses,
                record,
                format,
            } => {
                let salary = parse_cents(&salary).context("Invalid salary amount")?;
                let allocation = match (savings, split) {
                    (Some(savings), _) => Allocation::FixedSavings {
                        savings: parse_cents(&savings).context("Invalid savings amount")?,
                    },
                    (None, Some(split)) => parse_split(&split)?,
                    (None, None) => Allocation::default(),
                };
                let loans = parse_loans(&loans)?;
                let expenses = parse_expenses(&expenses)?;

                let plan = service.plan(salary, allocation, loans, expenses)?;

                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&plan)?),
                    _ => print_plan(&plan),
                }

                if record {
                    let entries = service.record_plan(&plan, Utc::now())?;
                    eprintln!(
                        "Recorded {} entries in {}",
                        entries.len(),
                        service.store().path().display()
                    );
                }
            }

            Commands::Export {
                export_type,
                output,
            } => {
                run_export_command(&service, &export_type, output.as_deref())?;
            }
        }

        Ok(())
    }
}

fn run_history_command(service: &BudgetService, filter: &HistoryFilter, format: &str) -> Result<()> {
    let records = service.history(filter)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&records)?),
        "csv" => write_records_csv(&records, stdout().lock())?,
        _ => {
            if records.is_empty() {
                println!("No entries found.");
                return Ok(());
            }
            println!("{:<17} {:<20} {:>12}  {}", "DATE", "CATEGORY", "AMOUNT", "NOTE");
            println!("{}", "-".repeat(70));
            for r in &records {
                println!(
                    "{:<17} {:<20} {:>12}  {}",
                    r.timestamp.format("%Y-%m-%d %H:%M"),
                    truncate(&r.category, 20),
                    format_cents(r.amount_cents),
                    r.note.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

fn run_summary_command(service: &BudgetService, format: &str) -> Result<()> {
    match format {
        "json" => {
            let snapshot = service.snapshot(Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        "csv" => write_categories_csv(&service.category_report()?, stdout().lock())?,
        _ => {
            let summary = service.summary()?;
            let categories = service.category_report()?;

            println!("Budget Summary ({} entries)", summary.record_count);
            println!();
            println!("{:<20} {:>12}", "Total inflow", format_cents(summary.total_inflow));
            println!("{:<20} {:>12}", "Total outflow", format_cents(summary.total_outflow));
            println!("{:<20} {:>12}", "Net balance", format_cents(summary.net_balance));

            if !categories.is_empty() {
                println!();
                println!(
                    "{:<20} {:>12} {:>8} {:>12} {:>8}",
                    "CATEGORY", "TOTAL", "COUNT", "AVERAGE", "PERCENT"
                );
                println!("{}", "-".repeat(65));
                for cat in &categories {
                    println!(
                        "{:<20} {:>12} {:>8} {:>12} {:>7.1}%",
                        truncate(&cat.category, 20),
                        format_cents(cat.total),
                        cat.count,
                        format_cents(cat.average),
                        cat.percentage
                    );
                }
            }
        }
    }
    Ok(())
}

fn run_balance_command(service: &BudgetService, format: &str) -> Result<()> {
    let points = service.running_balance()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&points)?),
        "csv" => write_balance_csv(&points, stdout().lock())?,
        _ => {
            if points.is_empty() {
                println!("No entries found.");
                return Ok(());
            }
            println!("{:<17} {:<20} {:>12} {:>12}", "DATE", "CATEGORY", "AMOUNT", "BALANCE");
            println!("{}", "-".repeat(64));
            for p in &points {
                println!(
                    "{:<17} {:<20} {:>12} {:>12}",
                    p.timestamp.format("%Y-%m-%d %H:%M"),
                    truncate(&p.category, 20),
                    format_cents(p.amount_cents),
                    format_cents(p.balance)
                );
            }
        }
    }
    Ok(())
}

fn run_cashflow_command(service: &BudgetService, format: &str) -> Result<()> {
    let flow = service.monthly_cash_flow()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&flow)?),
        "csv" => write_cash_flow_csv(&flow, stdout().lock())?,
        _ => {
            println!("{:<10} {:>12} {:>12} {:>12}", "MONTH", "INFLOW", "OUTFLOW", "NET");
            println!("{}", "-".repeat(49));
            for m in &flow {
                println!(
                    "{:<10} {:>12} {:>12} {:>12}",
                    m.month,
                    format_cents(m.inflow),
                    format_cents(m.outflow),
                    format_cents(m.net)
                );
            }
        }
    }
    Ok(())
}

fn run_payoff_output(loans: &[Loan], comparison: &StrategyComparison, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(comparison)?);
        return Ok(());
    }

    println!(
        "{:<16} {:>12} {:>7} {:>10} {:>8} {:>12}",
        "LOAN", "BALANCE", "RATE", "MIN", "MONTHS", "INTEREST"
    );
    println!("{}", "-".repeat(70));
    for loan in loans {
        let alone = payoff_months(loan.balance, loan.annual_rate, loan.min_payment);
        println!(
            "{:<16} {:>12} {:>6.1}% {:>10} {:>8} {:>12}",
            truncate(&loan.name, 16),
            format_cents(loan.balance),
            loan.annual_rate,
            format_cents(loan.min_payment),
            months_label(alone.months, alone.paid_off),
            format_cents(alone.total_interest)
        );
    }
    println!();
    print_comparison(comparison);
    Ok(())
}

fn run_export_command(service: &BudgetService, export_type: &str, output: Option<&str>) -> Result<()> {
    use std::fs::File;
    use std::io::Write;

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "records" => {
            let count = exporter.export_records_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} records", count);
            }
        }
        "cashflow" => {
            let count = exporter.export_cash_flow_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} months", count);
            }
        }
        "summary" => {
            let snapshot = exporter.export_summary_json(writer)?;
            if output.is_some() {
                eprintln!(
                    "Exported summary of {} records across {} categories",
                    snapshot.summary.record_count,
                    snapshot.categories.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: records, cashflow, summary",
                export_type
            );
        }
    }

    Ok(())
}

fn print_comparison(comparison: &StrategyComparison) {
    println!("Debt Payoff Comparison");
    for (name, result) in [
        ("Snowball", &comparison.snowball),
        ("Avalanche", &comparison.avalanche),
    ] {
        println!(
            "  {:<10} {} months, interest {}",
            name,
            months_label(result.months, result.paid_off),
            format_cents(result.total_interest)
        );
    }
    println!();
    println!("Advice: {}", comparison.advice);
}

fn print_plan(plan: &BudgetPlan) {
    println!("Budget Plan - Salary {}", format_cents(plan.salary));
    println!("  Savings:  {:>12}", format_cents(plan.buckets.savings));
    println!("  Debt:     {:>12}", format_cents(plan.buckets.debt));
    println!("  Expenses: {:>12}", format_cents(plan.buckets.expenses));
    println!();

    match plan.expense_status {
        ExpenseStatus::WithinBudget { spare } => println!(
            "Expenses within budget ({}). Spare: {}",
            format_cents(plan.total_expenses),
            format_cents(spare)
        ),
        ExpenseStatus::OverBudget { excess } => println!(
            "Warning: expenses ({}) exceed budget ({}) by {}",
            format_cents(plan.total_expenses),
            format_cents(plan.buckets.expenses),
            format_cents(excess)
        ),
    }

    if !plan.loans.is_empty() {
        println!();
        print_comparison(&plan.strategies);
    }
}

fn months_label(months: u32, paid_off: bool) -> String {
    if paid_off {
        months.to_string()
    } else {
        format!("{}+", months)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .context("Invalid time")
}

/// Accepts a bare date or a full RFC 3339 timestamp.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_date(s)
}

/// Parse NAME:BALANCE:RATE:MIN_PAYMENT. The name may itself contain colons.
fn parse_loan(input: &str) -> Result<Loan> {
    let mut parts = input.rsplitn(4, ':');
    let (Some(min), Some(rate), Some(balance), Some(name)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        anyhow::bail!(
            "Invalid loan '{}'. Use NAME:BALANCE:RATE:MIN_PAYMENT",
            input
        );
    };

    Ok(Loan::new(
        name.trim(),
        parse_cents(balance).with_context(|| format!("Invalid balance for loan '{}'", name))?,
        rate.trim()
            .parse::<f64>()
            .with_context(|| format!("Invalid interest rate for loan '{}'", name))?,
        parse_cents(min).with_context(|| format!("Invalid minimum payment for loan '{}'", name))?,
    ))
}

fn parse_loans(inputs: &[String]) -> Result<Vec<Loan>> {
    inputs.iter().map(|s| parse_loan(s)).collect()
}

fn parse_expenses(inputs: &[String]) -> Result<Vec<Expense>> {
    inputs
        .iter()
        .map(|input| {
            let (label, amount) = input
                .rsplit_once('=')
                .with_context(|| format!("Invalid expense '{}'. Use LABEL=AMOUNT", input))?;
            let amount = parse_cents(amount)
                .with_context(|| format!("Invalid amount for expense '{}'", label))?;
            Ok(Expense::new(label.trim(), amount))
        })
        .collect()
}

fn parse_split(split: &str) -> Result<Allocation> {
    let parts: Vec<u8> = split
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("Invalid split '{}'. Use SAVINGS,DEBT,EXPENSES percentages", split))?;

    match parts.as_slice() {
        &[savings_pct, debt_pct, expenses_pct] => Ok(Allocation::Split {
            savings_pct,
            debt_pct,
            expenses_pct,
        }),
        _ => anyhow::bail!("Invalid split '{}'. Expected three percentages", split),
    }
}
