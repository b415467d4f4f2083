use std::fmt;
use std::path::{Path, PathBuf};

use bal_ledger::MalformedPolicy;
use bal_mirror::MirrorPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting `{0}`")]
    MissingField(&'static str),
}

/// Complete pipeline configuration, one section per stage.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub remote: RemoteConfig,
    pub mirror: MirrorConfig,
    pub store: StoreConfig,
    pub aggregate: AggregateConfig,
    pub output: OutputConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub private_key: PathBuf,
    pub passphrase: Option<String>,
    /// Directory on the remote host holding the store.
    pub root: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: String::new(),
            private_key: PathBuf::new(),
            passphrase: None,
            root: String::new(),
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("private_key", &self.private_key)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field("root", &self.root)
            .finish()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub destination: PathBuf,
    pub policy: MirrorPolicy,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store to scan. Falls back to the mirror destination.
    pub path: Option<PathBuf>,
    pub database: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub malformed: MalformedPolicy,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub decode_dump: PathBuf,
    pub owner_mapping: PathBuf,
    pub balance_json: PathBuf,
    pub balance_xlsx: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            decode_dump: PathBuf::from("utxo_lmdb_entries.json"),
            owner_mapping: PathBuf::from("address_to_user.json"),
            balance_json: PathBuf::from("balance.json"),
            balance_xlsx: Some(PathBuf::from("balance.xlsx")),
        }
    }
}

impl PipelineConfig {
    /// Read and parse a TOML config file, expanding `~/` in the key path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let mut config: Self = toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.remote.private_key = expand_home(&config.remote.private_key);
        Ok(config)
    }

    /// The store scanned by the pipeline.
    pub fn store_path(&self) -> &Path {
        self.store.path.as_deref().unwrap_or(&self.mirror.destination)
    }

    /// Settings needed to reach the remote host.
    pub fn validate_remote(&self) -> Result<(), ConfigError> {
        require(!self.remote.host.is_empty(), "remote.host")?;
        require(self.remote.port != 0, "remote.port")?;
        require(!self.remote.username.is_empty(), "remote.username")?;
        require(!self.remote.private_key.as_os_str().is_empty(), "remote.private_key")?;
        require(!self.remote.root.is_empty(), "remote.root")
    }

    pub fn validate_mirror(&self) -> Result<(), ConfigError> {
        require(!self.mirror.destination.as_os_str().is_empty(), "mirror.destination")
    }

    /// Settings needed to scan the store and write the decode dump.
    pub fn validate_scan(&self) -> Result<(), ConfigError> {
        require(!self.store_path().as_os_str().is_empty(), "store.path")?;
        if let Some(name) = &self.store.database {
            require(!name.is_empty(), "store.database")?;
        }
        require(!self.output.decode_dump.as_os_str().is_empty(), "output.decode_dump")
    }

    /// Settings needed to aggregate balances and write the reports.
    pub fn validate_balance(&self) -> Result<(), ConfigError> {
        require(!self.output.decode_dump.as_os_str().is_empty(), "output.decode_dump")?;
        require(!self.output.owner_mapping.as_os_str().is_empty(), "output.owner_mapping")?;
        require(!self.output.balance_json.as_os_str().is_empty(), "output.balance_json")?;
        if let Some(path) = &self.output.balance_xlsx {
            require(!path.as_os_str().is_empty(), "output.balance_xlsx")?;
        }
        Ok(())
    }

    /// Every setting a full run needs. Reports the first missing one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_remote()?;
        self.validate_mirror()?;
        self.validate_scan()?;
        self.validate_balance()
    }
}

fn require(present: bool, field: &'static str) -> Result<(), ConfigError> {
    if present {
        Ok(())
    } else {
        Err(ConfigError::MissingField(field))
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[remote]
host = "203.0.113.7"
username = "root"
private_key = "/keys/id_ed25519"
passphrase = "hunter2"
root = "/home/node/utxo"

[mirror]
destination = "./data"
policy = "prune"

[store]
database = "utxo"

[aggregate]
malformed = "reject"

[output]
decode_dump = "out/entries.json"
owner_mapping = "owners.json"
balance_json = "out/balance.json"
balance_xlsx = "out/balance.xlsx"
"#;

    fn parse(text: &str) -> PipelineConfig {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn parses_full_config() {
        let c = parse(FULL);
        assert_eq!(c.remote.host, "203.0.113.7");
        assert_eq!(c.remote.port, 22);
        assert_eq!(c.remote.passphrase.as_deref(), Some("hunter2"));
        assert_eq!(c.mirror.policy, MirrorPolicy::Prune);
        assert_eq!(c.store.database.as_deref(), Some("utxo"));
        assert_eq!(c.aggregate.malformed, MalformedPolicy::Reject);
        assert_eq!(c.output.balance_xlsx, Some(PathBuf::from("out/balance.xlsx")));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.remote.port, 22);
        assert_eq!(c.mirror.policy, MirrorPolicy::Additive);
        assert_eq!(c.aggregate.malformed, MalformedPolicy::Skip);
        assert_eq!(c.output.decode_dump, PathBuf::from("utxo_lmdb_entries.json"));
        assert_eq!(c.output.owner_mapping, PathBuf::from("address_to_user.json"));
        assert_eq!(c.output.balance_json, PathBuf::from("balance.json"));
        assert_eq!(c.output.balance_xlsx, Some(PathBuf::from("balance.xlsx")));
    }

    #[test]
    fn spreadsheet_written_unless_overridden() {
        let c = parse("[output]\nbalance_json = \"out/balance.json\"\n");
        assert_eq!(c.output.balance_json, PathBuf::from("out/balance.json"));
        assert_eq!(c.output.balance_xlsx, Some(PathBuf::from("balance.xlsx")));
    }

    #[test]
    fn store_path_falls_back_to_destination() {
        let c = parse(FULL);
        assert_eq!(c.store_path(), Path::new("./data"));

        let c = parse("[mirror]\ndestination = \"m\"\n[store]\npath = \"s\"\n");
        assert_eq!(c.store_path(), Path::new("s"));
    }

    #[test]
    fn missing_fields_named_by_dotted_path() {
        let err = parse("").validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("remote.host")));

        let mut c = parse(FULL);
        c.remote.root.clear();
        assert!(matches!(c.validate().unwrap_err(), ConfigError::MissingField("remote.root")));

        let mut c = parse(FULL);
        c.mirror.destination = PathBuf::new();
        assert!(matches!(c.validate().unwrap_err(), ConfigError::MissingField("mirror.destination")));
        assert!(matches!(c.validate_scan().unwrap_err(), ConfigError::MissingField("store.path")));
    }

    #[test]
    fn balance_stage_needs_only_outputs() {
        assert!(PipelineConfig::default().validate_balance().is_ok());
        assert!(PipelineConfig::default().validate_remote().is_err());
        assert!(PipelineConfig::default().validate_mirror().is_err());
    }

    #[test]
    fn unknown_policy_rejected() {
        assert!(toml::from_str::<PipelineConfig>("[mirror]\npolicy = \"mirror\"\n").is_err());
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bal.toml");
        std::fs::write(&path, "[remote\nhost = 1").unwrap();
        assert!(matches!(PipelineConfig::load(&path).unwrap_err(), ConfigError::Parse { .. }));
        assert!(matches!(
            PipelineConfig::load(&dir.path().join("absent.toml")).unwrap_err(),
            ConfigError::Read { .. }
        ));
    }

    #[test]
    fn load_expands_home_in_key_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bal.toml");
        std::fs::write(&path, "[remote]\nprivate_key = \"~/.ssh/id_ed25519\"\n").unwrap();
        let c = PipelineConfig::load(&path).unwrap();
        match std::env::var_os("HOME") {
            Some(home) => assert_eq!(c.remote.private_key, PathBuf::from(home).join(".ssh/id_ed25519")),
            None => assert_eq!(c.remote.private_key, PathBuf::from("~/.ssh/id_ed25519")),
        }
    }

    #[test]
    fn debug_redacts_passphrase() {
        let shown = format!("{:?}", parse(FULL).remote);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }
}
