use std::path::Path;

use bal_ledger::BalanceRow;
use bal_types::{Address, Balance};
use serde::Deserialize;
use tracing::info;

use crate::error::ReportResult;
use crate::json;

#[derive(Deserialize)]
struct StoredRow {
    owner: String,
    address: Address,
    balance: Balance,
}

/// Write the balance rows as a JSON array of `{owner, address, balance}`.
pub fn write_balance_json(path: &Path, rows: &[BalanceRow]) -> ReportResult<()> {
    json::write_pretty(path, rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote balance report");
    Ok(())
}

pub fn read_balance_json(path: &Path) -> ReportResult<Vec<BalanceRow>> {
    let stored: Vec<StoredRow> = json::read(path)?;
    Ok(stored
        .into_iter()
        .map(|r| BalanceRow { owner: r.owner, address: r.address, balance: r.balance })
        .collect())
}
