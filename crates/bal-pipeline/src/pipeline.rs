use std::path::{Path, PathBuf};

use bal_ledger::{decode_record, Aggregator, BalanceSheet, DecodeTally};
use bal_mirror::{Credentials, MirrorReport, RemoteEndpoint, RemoteTree, Replicator, SftpTree};
use bal_report::{load_owner_mapping, write_balance_json, write_balance_xlsx, DecodeDump};
use bal_store::{ScanOptions, StoreSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, Stage};

/// Outcome of the scan and decode stages.
#[derive(Clone, Debug, Serialize)]
pub struct ScanSummary {
    pub store: PathBuf,
    pub dump: PathBuf,
    pub records: u64,
    pub tally: DecodeTally,
}

/// Outcome of the aggregation and report stages.
#[derive(Clone, Debug, Serialize)]
pub struct BalanceSummary {
    pub balance_json: PathBuf,
    pub balance_xlsx: Option<PathBuf>,
    pub sheet: BalanceSheet,
}

/// Everything a full run did.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub mirror: MirrorReport,
    pub scan: ScanSummary,
    pub balance: BalanceSummary,
}

/// Runs the balance lookup stages against one configuration.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Open an SFTP session to the configured remote host.
    pub fn connect(&self) -> PipelineResult<SftpTree> {
        self.config.validate_remote()?;
        let remote = &self.config.remote;
        let credentials = Credentials::load(&remote.private_key, remote.passphrase.clone())?;
        let endpoint = RemoteEndpoint::new(remote.host.as_str(), remote.port, remote.username.as_str());
        Ok(SftpTree::connect(&endpoint, &credentials)?)
    }

    /// Replicate `remote_root` from `tree` into the mirror destination.
    ///
    /// The tree is closed afterwards whether or not replication succeeded.
    pub fn mirror(&self, tree: &mut dyn RemoteTree, remote_root: &str) -> PipelineResult<MirrorReport> {
        self.config.validate_mirror()?;
        let replicator = Replicator::new(self.config.mirror.policy);
        let result = replicator.replicate(&mut *tree, remote_root, &self.config.mirror.destination);

        let closed = tree.close();
        let report = result?;
        closed?;
        Ok(report)
    }

    /// Read every record from the store and decode it.
    pub fn scan(&self) -> PipelineResult<DecodeDump> {
        self.config.validate_scan()?;
        let options = ScanOptions { database: self.config.store.database.clone() };
        let snapshot = StoreSnapshot::open(self.config.store_path(), &options)?;
        let txn = snapshot.begin()?;

        let mut records = txn.records()?;
        let mut decoded = Vec::new();
        for record in records.by_ref() {
            decoded.push(decode_record(&record?));
        }
        info!(stage = %Stage::Scan, records = records.yielded(), "store scanned");

        Ok(DecodeDump::from_records(decoded))
    }

    /// Scan and decode the store, then persist the decode dump.
    pub fn scan_and_dump(&self) -> PipelineResult<(DecodeDump, ScanSummary)> {
        let dump = self.scan()?;
        let dump_path = &self.config.output.decode_dump;
        dump.write(dump_path).map_err(PipelineError::persist(Stage::Decode))?;

        let tally = dump.tally();
        if tally.structured == 0 && !dump.is_empty() {
            warn!(records = dump.len(), "no record decoded as structured data");
        }
        let summary = ScanSummary {
            store: self.config.store_path().to_path_buf(),
            dump: dump_path.clone(),
            records: dump.len() as u64,
            tally,
        };
        Ok((dump, summary))
    }

    /// Aggregate a decoded record set and write the balance reports.
    pub fn balance(&self, dump: &DecodeDump) -> PipelineResult<BalanceSummary> {
        self.config.validate_balance()?;
        let output = &self.config.output;

        let owners = load_owner_mapping(&output.owner_mapping)
            .map_err(PipelineError::persist(Stage::Aggregation))?;
        let sheet = Aggregator::new(self.config.aggregate.malformed).aggregate(dump.records(), &owners)?;

        write_balance_json(&output.balance_json, &sheet.rows)
            .map_err(PipelineError::persist(Stage::Report))?;
        if let Some(xlsx) = &output.balance_xlsx {
            write_balance_xlsx(xlsx, &sheet.rows).map_err(PipelineError::persist(Stage::Report))?;
        }

        Ok(BalanceSummary {
            balance_json: output.balance_json.clone(),
            balance_xlsx: output.balance_xlsx.clone(),
            sheet,
        })
    }

    /// Recompute balances from a persisted decode dump.
    ///
    /// `dump` overrides the configured dump path.
    pub fn balance_from_dump(&self, dump: Option<&Path>) -> PipelineResult<BalanceSummary> {
        let path = dump.unwrap_or(&self.config.output.decode_dump);
        let dump = DecodeDump::load(path).map_err(PipelineError::persist(Stage::Aggregation))?;
        self.balance(&dump)
    }

    /// All stages in order: replicate, scan and decode, aggregate and report.
    pub fn run(&self, tree: &mut dyn RemoteTree, remote_root: &str) -> PipelineResult<RunSummary> {
        info!(remote_root, destination = %self.config.mirror.destination.display(), "starting run");
        let mirror = self.mirror(tree, remote_root)?;
        let (dump, scan) = self.scan_and_dump()?;
        let balance = self.balance(&dump)?;

        info!(
            files = mirror.files,
            records = scan.records,
            addresses = balance.sheet.rows.len(),
            "run complete"
        );
        Ok(RunSummary { generated_at: Utc::now(), mirror, scan, balance })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use bal_ledger::{LedgerError, MalformedPolicy};
    use bal_mirror::{LocalTree, MirrorError, MirrorPolicy, MirrorResult, RemoteEntry};
    use bal_report::read_balance_json;
    use lmdb::{Environment, Transaction, WriteFlags};
    use serde_json::Value;

    use super::*;

    fn write_store(dir: &Path, pairs: &[(&[u8], &[u8])]) {
        fs::create_dir_all(dir).unwrap();
        let env = Environment::new().open(dir).unwrap();
        let db = env.open_db(None).unwrap();
        let mut txn = env.begin_rw_txn().unwrap();
        for (k, v) in pairs {
            txn.put(db, k, v, WriteFlags::empty()).unwrap();
        }
        txn.commit().unwrap();
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        remote_root: PathBuf,
        config: PipelineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let remote_root = dir.path().join("remote").join("utxo");
            write_store(
                &remote_root,
                &[
                    (b"\x01", br#"{"address":"addrA","amount":5,"output_id":"t1","output_index":0}"#),
                    (b"\x02", br#"{"address":"addrB","amount":3}"#),
                    (b"\x03", b"schema 2"),
                    (b"\x04", &[0xff, 0xfe]),
                    (b"\x05", br#"{"address":"addrA","amount":7}"#),
                    (b"\x06", br#"{"address":"addrC"}"#),
                ],
            );

            let owners = dir.path().join("owners.json");
            fs::write(&owners, r#"{"addrA": "Alice", "addrB": "Bob"}"#).unwrap();

            let mut config = PipelineConfig::default();
            config.mirror.destination = dir.path().join("mirror");
            config.output.decode_dump = dir.path().join("out").join("entries.json");
            config.output.owner_mapping = owners;
            config.output.balance_json = dir.path().join("out").join("balance.json");
            config.output.balance_xlsx = Some(dir.path().join("out").join("balance.xlsx"));

            Self { _dir: dir, remote_root, config }
        }

        fn root(&self) -> &str {
            self.remote_root.to_str().unwrap()
        }
    }

    #[test]
    fn full_run_with_local_source() {
        let fx = Fixture::new();
        let pipeline = Pipeline::new(fx.config.clone());
        let summary = pipeline.run(&mut LocalTree::new(), fx.root()).unwrap();

        assert!(summary.mirror.files >= 1);
        assert!(fx.config.mirror.destination.join("data.mdb").is_file());
        assert_eq!(summary.scan.records, 6);
        assert_eq!(summary.scan.tally, DecodeTally { structured: 4, text: 1, opaque: 1 });

        let sheet = &summary.balance.sheet;
        assert_eq!(sheet.total, 15);
        assert_eq!(sheet.entries, 3);
        assert_eq!(sheet.non_structured, 2);
        assert_eq!(sheet.skipped.len(), 1);
        assert_eq!(sheet.skipped[0].id.to_hex(), "06");

        let rows = read_balance_json(&fx.config.output.balance_json).unwrap();
        let triples: Vec<(&str, &str, u128)> =
            rows.iter().map(|r| (r.owner.as_str(), r.address.as_str(), r.balance)).collect();
        assert_eq!(triples, vec![("Alice", "addrA", 12), ("Bob", "addrB", 3)]);
        assert!(fx.config.output.balance_xlsx.as_ref().unwrap().is_file());
    }

    #[test]
    fn dump_contains_every_record() {
        let fx = Fixture::new();
        let pipeline = Pipeline::new(fx.config.clone());
        pipeline.mirror(&mut LocalTree::new(), fx.root()).unwrap();
        let (_, summary) = pipeline.scan_and_dump().unwrap();
        assert_eq!(summary.records, 6);

        let text = fs::read_to_string(&fx.config.output.decode_dump).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["01", "02", "03", "04", "05", "06"]);
        assert_eq!(doc["03"], "schema 2");
        assert_eq!(doc["04"], "fffe");
    }

    #[test]
    fn balance_from_dump_matches_run() {
        let fx = Fixture::new();
        let pipeline = Pipeline::new(fx.config.clone());
        let run = pipeline.run(&mut LocalTree::new(), fx.root()).unwrap();
        let again = pipeline.balance_from_dump(None).unwrap();
        assert_eq!(again.sheet, run.balance.sheet);
    }

    #[test]
    fn reject_policy_fails_in_aggregation() {
        let mut fx = Fixture::new();
        fx.config.aggregate.malformed = MalformedPolicy::Reject;
        let pipeline = Pipeline::new(fx.config.clone());
        let err = pipeline.run(&mut LocalTree::new(), fx.root()).unwrap_err();
        assert_eq!(err.stage(), Stage::Aggregation);
        assert!(matches!(err, PipelineError::Aggregation(LedgerError::MalformedRecord { .. })));
        assert!(!fx.config.output.balance_json.exists());
    }

    #[test]
    fn missing_store_fails_in_scan() {
        let fx = Fixture::new();
        let pipeline = Pipeline::new(fx.config.clone());
        let err = pipeline.scan_and_dump().unwrap_err();
        assert_eq!(err.stage(), Stage::Scan);
        assert!(!fx.config.output.decode_dump.exists());
    }

    #[test]
    fn missing_owner_mapping_fails_in_aggregation() {
        let mut fx = Fixture::new();
        fx.config.output.owner_mapping = fx.remote_root.join("absent.json");
        let pipeline = Pipeline::new(fx.config.clone());
        let err = pipeline.run(&mut LocalTree::new(), fx.root()).unwrap_err();
        assert_eq!(err.stage(), Stage::Aggregation);
    }

    #[test]
    fn prune_policy_flows_through() {
        let mut fx = Fixture::new();
        fx.config.mirror.policy = MirrorPolicy::Prune;
        let stale = fx.config.mirror.destination.join("stale.bin");
        fs::create_dir_all(&fx.config.mirror.destination).unwrap();
        fs::write(&stale, b"old").unwrap();

        let pipeline = Pipeline::new(fx.config.clone());
        let report = pipeline.mirror(&mut LocalTree::new(), fx.root()).unwrap();
        assert_eq!(report.pruned, 1);
        assert!(!stale.exists());
    }

    #[test]
    fn missing_destination_is_config_error() {
        let mut fx = Fixture::new();
        fx.config.mirror.destination = PathBuf::new();
        let err = Pipeline::new(fx.config.clone())
            .mirror(&mut LocalTree::new(), fx.root())
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Config);
    }

    #[test]
    fn connect_requires_remote_settings() {
        let fx = Fixture::new();
        let err = Pipeline::new(fx.config).connect().unwrap_err();
        assert_eq!(err.to_string(), "config stage failed: missing required setting `remote.host`");
    }

    struct BrokenTree {
        closed: bool,
    }

    impl RemoteTree for BrokenTree {
        fn list_dir(&mut self, path: &str) -> MirrorResult<Vec<RemoteEntry>> {
            if path == "/r" {
                Ok(vec![RemoteEntry::file("data.mdb")])
            } else {
                Ok(Vec::new())
            }
        }

        fn fetch_file(&mut self, path: &str, sink: &mut dyn Write) -> MirrorResult<u64> {
            sink.write_all(b"partial").ok();
            Err(MirrorError::Transfer { path: path.to_string(), reason: "connection reset".into() })
        }

        fn close(&mut self) -> MirrorResult<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn failed_replication_still_closes_tree() {
        let fx = Fixture::new();
        let mut tree = BrokenTree { closed: false };
        let err = Pipeline::new(fx.config.clone()).run(&mut tree, "/r").unwrap_err();
        assert_eq!(err.stage(), Stage::Replication);
        assert!(tree.closed);
        assert!(!fx.config.output.decode_dump.exists());
    }

    #[test]
    fn run_summary_serializes() {
        let fx = Fixture::new();
        let summary = Pipeline::new(fx.config.clone()).run(&mut LocalTree::new(), fx.root()).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["generated_at"].is_string());
        assert_eq!(json["balance"]["sheet"]["total"], 15);
        assert_eq!(json["scan"]["tally"]["opaque"], 1);
    }
}
