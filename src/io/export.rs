use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use std::io::Write;

use crate::application::{BudgetService, CategorySummary, MonthlyFlow, SummarySnapshot};
use crate::domain::{format_cents, BalancePoint, BudgetRecord};
use crate::storage::{to_row, LEDGER_HEADER};

/// Exporter for converting ledger data to shareable formats
pub struct Exporter<'a> {
    service: &'a BudgetService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a BudgetService) -> Self {
        Self { service }
    }

    /// Export the history as CSV, in the same layout as the ledger file
    pub fn export_records_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let records = self.service.records()?;
        write_records_csv(&records, writer)?;
        Ok(records.len())
    }

    /// Export the monthly cash flow as CSV
    pub fn export_cash_flow_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let flow = self.service.monthly_cash_flow()?;
        write_cash_flow_csv(&flow, writer)?;
        Ok(flow.len())
    }

    /// Export totals, categories and cash flow as a JSON snapshot
    pub fn export_summary_json<W: Write>(&self, mut writer: W) -> Result<SummarySnapshot> {
        let snapshot = self.service.snapshot(Utc::now())?;

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}

/// Write records with the ledger header. Free-text fields are quoted as needed.
pub fn write_records_csv<W: Write>(records: &[BudgetRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(LEDGER_HEADER)?;
    for record in records {
        csv_writer.write_record(&to_row(record))?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_cash_flow_csv<W: Write>(flow: &[MonthlyFlow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["month", "inflow", "outflow", "net"])?;
    for month in flow {
        csv_writer.write_record(&[
            month.month.clone(),
            format_cents(month.inflow),
            format_cents(month.outflow),
            format_cents(month.net),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_balance_csv<W: Write>(points: &[BalancePoint], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["timestamp", "category", "amount", "balance"])?;
    for point in points {
        csv_writer.write_record(&[
            point.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            point.category.clone(),
            format_cents(point.amount_cents),
            format_cents(point.balance),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_categories_csv<W: Write>(categories: &[CategorySummary], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["category", "total", "count", "average", "percentage"])?;
    for cat in categories {
        csv_writer.write_record(&[
            cat.category.clone(),
            format_cents(cat.total),
            cat.count.to_string(),
            format_cents(cat.average),
            format!("{:.2}", cat.percentage),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
