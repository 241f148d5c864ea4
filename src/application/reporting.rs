use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BudgetRecord, Cents, Summary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: usize,
    pub average: Cents,
    /// Share of the summed absolute category totals
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyFlow {
    /// Calendar month as "YYYY-MM"
    pub month: String,
    pub inflow: Cents,
    pub outflow: Cents,
    pub net: Cents,
}

/// Everything the dashboard shows, computed from one ledger snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarySnapshot {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub categories: Vec<CategorySummary>,
    pub cash_flow: Vec<MonthlyFlow>,
}

impl SummarySnapshot {
    pub fn from_records(records: &[BudgetRecord], generated_at: DateTime<Utc>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at,
            summary: crate::domain::summarize(records),
            categories: category_breakdown(records),
            cash_flow: monthly_cash_flow(records),
        }
    }
}

/// Per-category totals, largest absolute total first.
pub fn category_breakdown(records: &[BudgetRecord]) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<&str, (Cents, usize)> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(record.category.trim()).or_insert((0, 0));
        entry.0 += record.amount_cents;
        entry.1 += 1;
    }

    let volume: Cents = groups.values().map(|(total, _)| total.abs()).sum();

    let mut categories: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(category, (total, count))| CategorySummary {
            category: category.to_string(),
            total,
            count,
            average: total / count as Cents,
            percentage: if volume == 0 {
                0.0
            } else {
                total.abs() as f64 / volume as f64 * 100.0
            },
        })
        .collect();

    categories.sort_by(|a, b| {
        b.total
            .abs()
            .cmp(&a.total.abs())
            .then_with(|| a.category.cmp(&b.category))
    });
    categories
}

/// Inflow, outflow and net per calendar month, oldest month first.
pub fn monthly_cash_flow(records: &[BudgetRecord]) -> Vec<MonthlyFlow> {
    let mut months: BTreeMap<String, MonthlyFlow> = BTreeMap::new();

    for record in records {
        let month = record.timestamp.format("%Y-%m").to_string();
        let flow = months.entry(month.clone()).or_insert_with(|| MonthlyFlow {
            month,
            inflow: 0,
            outflow: 0,
            net: 0,
        });
        if record.is_inflow() {
            flow.inflow += record.amount_cents;
        } else {
            flow.outflow -= record.amount_cents;
        }
        flow.net += record.amount_cents;
    }

    months.into_values().collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(month: u32, category: &str, amount: Cents) -> BudgetRecord {
        BudgetRecord::new(
            Utc.with_ymd_and_hms(2024, month, 10, 12, 0, 0).unwrap(),
            category,
            amount,
        )
    }

    #[test]
    fn test_category_breakdown() {
        let records = vec![
            record(1, "income", 100000),
            record(1, "rent", -50000),
            record(2, "rent", -50000),
            record(2, "food", -20000),
        ];

        let categories = category_breakdown(&records);

        let names: Vec<&str> = categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["income", "rent", "food"]);

        let rent = &categories[1];
        assert_eq!(rent.total, -100000);
        assert_eq!(rent.count, 2);
        assert_eq!(rent.average, -50000);
        assert!((rent.percentage - 45.4545).abs() < 0.01);
    }

    #[test]
    fn test_category_breakdown_empty() {
        assert!(category_breakdown(&[]).is_empty());
    }

    #[test]
    fn test_monthly_cash_flow() {
        let records = vec![
            record(1, "income", 100000),
            record(1, "rent", -50000),
            record(3, "food", -20000),
            record(3, "refund", 5000),
        ];

        let flow = monthly_cash_flow(&records);

        assert_eq!(
            flow,
            vec![
                MonthlyFlow {
                    month: "2024-01".into(),
                    inflow: 100000,
                    outflow: 50000,
                    net: 50000,
                },
                MonthlyFlow {
                    month: "2024-03".into(),
                    inflow: 5000,
                    outflow: 20000,
                    net: -15000,
                },
            ]
        );
    }

    #[test]
    fn test_snapshot_from_records() {
        let records = vec![record(1, "income", 100000), record(1, "rent", -60000)];
        let snapshot = SummarySnapshot::from_records(&records, Utc::now());

        assert_eq!(snapshot.summary.net_balance, 40000);
        assert_eq!(snapshot.categories.len(), 2);
        assert_eq!(snapshot.cash_flow.len(), 1);
    }
}
