use std::path::Path;

use bal_ledger::OwnerMapping;
use tracing::info;

use crate::error::ReportResult;
use crate::json;

/// Load the address → owner document, a flat JSON object of strings.
pub fn load_owner_mapping(path: &Path) -> ReportResult<OwnerMapping> {
    let owners: OwnerMapping = json::read(path)?;
    info!(path = %path.display(), owners = owners.len(), "loaded owner mapping");
    Ok(owners)
}
