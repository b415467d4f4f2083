use std::collections::BTreeMap;

use bal_types::{Address, Balance, DecodedValue, RecordId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::decode::DecodedRecord;
use crate::entry::{EntryDefect, LedgerEntry};
use crate::error::{LedgerError, LedgerResult};
use crate::owner::OwnerMapping;

/// What to do with a structured record that lacks a usable address or amount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Leave it out of the balances and list it in [`BalanceSheet::skipped`].
    #[default]
    Skip,
    /// Abort aggregation at the first such record.
    Reject,
}

/// One line of the balance report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceRow {
    pub owner: String,
    pub address: Address,
    pub balance: Balance,
}

/// A structured record left out of aggregation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub id: RecordId,
    pub reason: String,
}

/// Ordered balances plus the bookkeeping needed to audit them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BalanceSheet {
    pub rows: Vec<BalanceRow>,
    /// Structured records that became ledger entries.
    pub entries: u64,
    /// Text and opaque records, which never carry entries.
    pub non_structured: u64,
    pub skipped: Vec<SkippedRecord>,
    /// Sum of every row's balance.
    pub total: Balance,
}

/// Reduce ledger entries to one row per address.
///
/// Rows are ordered by owner name, then by address, both in byte-wise string
/// order. Addresses missing from `owners` get the owner `"unknown"`.
pub fn summarize<'a, I>(entries: I, owners: &OwnerMapping) -> LedgerResult<Vec<BalanceRow>>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut by_address: BTreeMap<&Address, Balance> = BTreeMap::new();
    for entry in entries {
        let balance = by_address.entry(&entry.address).or_insert(0);
        *balance = balance
            .checked_add(Balance::from(entry.amount))
            .ok_or_else(|| LedgerError::BalanceOverflow { address: entry.address.clone() })?;
    }

    let mut rows: Vec<BalanceRow> = by_address
        .into_iter()
        .map(|(address, balance)| BalanceRow {
            owner: owners.resolve(address.as_str()).to_string(),
            address: address.clone(),
            balance,
        })
        .collect();
    rows.sort_by(|a, b| a.owner.cmp(&b.owner).then_with(|| a.address.cmp(&b.address)));
    Ok(rows)
}

/// Filters decoded records down to ledger entries and summarizes them.
#[derive(Clone, Debug, Default)]
pub struct Aggregator {
    policy: MalformedPolicy,
}

impl Aggregator {
    pub fn new(policy: MalformedPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MalformedPolicy {
        self.policy
    }

    /// Extract ledger entries from every structured record, applying the
    /// malformed-record policy. Returns the entries, the skipped records and
    /// the count of non-structured records.
    pub fn collect_entries<'a, I>(
        &self,
        records: I,
    ) -> LedgerResult<(Vec<LedgerEntry>, Vec<SkippedRecord>, u64)>
    where
        I: IntoIterator<Item = &'a DecodedRecord>,
    {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        let mut non_structured = 0u64;

        for record in records {
            let DecodedValue::Structured(value) = &record.value else {
                non_structured += 1;
                continue;
            };
            match LedgerEntry::from_structured(record.id.clone(), value) {
                Ok(entry) => entries.push(entry),
                Err(defect) => self.on_defect(&record.id, defect, &mut skipped)?,
            }
        }
        Ok((entries, skipped, non_structured))
    }

    fn on_defect(
        &self,
        id: &RecordId,
        defect: EntryDefect,
        skipped: &mut Vec<SkippedRecord>,
    ) -> LedgerResult<()> {
        match self.policy {
            MalformedPolicy::Reject => Err(LedgerError::MalformedRecord { id: id.clone(), defect }),
            MalformedPolicy::Skip => {
                warn!(record = %id, %defect, "skipping malformed ledger record");
                skipped.push(SkippedRecord { id: id.clone(), reason: defect.to_string() });
                Ok(())
            }
        }
    }

    /// Build the full balance sheet for a decoded record set.
    pub fn aggregate<'a, I>(&self, records: I, owners: &OwnerMapping) -> LedgerResult<BalanceSheet>
    where
        I: IntoIterator<Item = &'a DecodedRecord>,
    {
        let (entries, skipped, non_structured) = self.collect_entries(records)?;
        debug!(entries = entries.len(), skipped = skipped.len(), non_structured, "entries collected");

        let rows = summarize(&entries, owners)?;
        let total = rows.iter().map(|r| r.balance).sum();

        info!(addresses = rows.len(), entries = entries.len(), skipped = skipped.len(), "aggregated balances");
        Ok(BalanceSheet {
            rows,
            entries: entries.len() as u64,
            non_structured,
            skipped,
            total,
        })
    }
}
