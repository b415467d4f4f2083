use std::path::Path;

use bal_ledger::BalanceRow;
use bal_types::Balance;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::error::{ReportError, ReportResult};

pub const SHEET_NAME: &str = "Balances";
pub const SHEET_HEADER: [&str; 3] = ["Owner", "Address", "Balance"];

/// Largest balance an `f64` cell holds without rounding.
const MAX_EXACT_NUMBER: Balance = 1 << 53;

/// A spreadsheet cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn balance(balance: Balance) -> Self {
        if balance <= MAX_EXACT_NUMBER {
            Cell::Number(balance as f64)
        } else {
            Cell::Text(balance.to_string())
        }
    }
}

/// The data rows of the balance sheet, header excluded, in row order.
pub fn balance_table(rows: &[BalanceRow]) -> Vec<[Cell; 3]> {
    rows.iter()
        .map(|r| {
            [
                Cell::Text(r.owner.clone()),
                Cell::Text(r.address.as_str().to_string()),
                Cell::balance(r.balance),
            ]
        })
        .collect()
}

fn fill(worksheet: &mut Worksheet, rows: &[BalanceRow]) -> Result<(), XlsxError> {
    worksheet.set_name(SHEET_NAME)?;
    let bold = Format::new().set_bold();
    for (col, title) in (0u16..).zip(SHEET_HEADER) {
        worksheet.write_string_with_format(0, col, title, &bold)?;
    }

    for (row, cells) in (1u32..).zip(balance_table(rows)) {
        for (col, cell) in (0u16..).zip(cells) {
            match cell {
                Cell::Text(s) => worksheet.write_string(row, col, s)?,
                Cell::Number(n) => worksheet.write_number(row, col, n)?,
            };
        }
    }
    worksheet.set_column_width(1, 48)?;
    Ok(())
}

/// Write the balance rows to an XLSX workbook with a single `Balances` sheet.
pub fn write_balance_xlsx(path: &Path, rows: &[BalanceRow]) -> ReportResult<()> {
    let spreadsheet_err = |e: XlsxError| ReportError::Spreadsheet {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ReportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut workbook = Workbook::new();
    fill(workbook.add_worksheet(), rows).map_err(spreadsheet_err)?;
    workbook.save(path).map_err(spreadsheet_err)?;

    info!(path = %path.display(), rows = rows.len(), "wrote balance spreadsheet");
    Ok(())
}
