// 📤 CSV export of the expense list

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::models::{parse_day, Expense};

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Notes")]
    notes: &'a str,
    #[serde(rename = "Id")]
    id: &'a str,
}

impl<'a> From<&'a Expense> for ExportRow<'a> {
    fn from(expense: &'a Expense) -> Self {
        // Normalized when readable, otherwise whatever the server sent
        let date = parse_day(&expense.date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| expense.date.clone());
        Self {
            date,
            category: expense.category.as_str(),
            amount: expense.amount,
            notes: &expense.notes,
            id: &expense.id,
        }
    }
}

/// Write rows with a header line; returns the number of rows written.
pub fn write_expenses<'a, W, I>(writer: W, expenses: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Expense>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    let mut written = 0;

    for expense in expenses {
        wtr.serialize(ExportRow::from(expense))
            .context("Failed to serialize expense")?;
        written += 1;
    }

    // serialize() only emits the header with the first row
    if written == 0 {
        wtr.write_record(["Date", "Category", "Amount", "Notes", "Id"])?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(written)
}

pub fn export_csv<'a, I>(path: &Path, expenses: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let written = write_expenses(file, expenses)?;
    tracing::info!("exported {} expenses to {}", written, path.display());
    Ok(written)
}
