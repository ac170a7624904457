// config/src/lib.rs

//! Layered configuration for the indexer: compiled-in defaults, an optional
//! TOML file, `IDX_`-prefixed environment variables, and CLI flags, merged
//! in that order of increasing precedence and validated as a unit.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading, merging, or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid rpc_url {0:?}: must be an http or https URL")]
    InvalidRpcUrl(String),
    #[error("backoff_jitter must be in [0, 1], got {0}")]
    InvalidJitter(f64),
    #[error("`to` ({to}) is less than `from` ({from})")]
    ToBeforeFrom { from: u64, to: u64 },
    #[error("unknown sink kind {0:?}")]
    UnknownSink(String),
    #[error("sink kind {0:?} is recognized but not implemented")]
    UnsupportedSink(String),
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: i64 },
    #[error("postgres sink requires `pg.host` and `pg.database` to be set")]
    MissingPgFields,
}

/// Top-level configuration record, mirroring the configuration surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub range: RangeConfig,
    pub concurrency: ConcurrencyConfig,
    pub sink: SinkConfig,
    pub pg: PgConfig,
}

/// RPC endpoint and transport tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub rpc_url: String,
    pub timeout_ms: u64,
    pub rps: f64,
    pub retries: u32,
    pub backoff_ms: u64,
    pub backoff_jitter: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            timeout_ms: 5000,
            rps: 150.0,
            retries: 3,
            backoff_ms: 250,
            backoff_jitter: 0.3,
        }
    }
}

/// Height range, resume, and follow-mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    pub from: Option<u64>,
    pub to: Option<ToHeight>,
    pub resume: bool,
    /// Floor applied when no resume checkpoint and no explicit `from` are
    /// available: the runner never starts earlier than this height even if
    /// the node reports an earlier `earliest_block_height`.
    pub first_block: u64,
    pub follow: bool,
    pub follow_interval_ms: u64,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            resume: false,
            first_block: 5_200_792,
            follow: false,
            follow_interval_ms: 5000,
        }
    }
}

/// Either an explicit height or the literal `latest`.
///
/// Accepted on the wire (TOML/env/CLI) as either the bare string `"latest"`
/// or a decimal integer (as a TOML integer or a numeric string); always
/// serialized back out as a string so round-tripping through TOML or JSON
/// never depends on the reader already knowing which variant to expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToHeight {
    Latest,
    Height(u64),
}

impl std::str::FromStr for ToHeight {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            Ok(ToHeight::Latest)
        } else {
            Ok(ToHeight::Height(s.parse()?))
        }
    }
}

impl std::fmt::Display for ToHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToHeight::Latest => write!(f, "latest"),
            ToHeight::Height(h) => write!(f, "{h}"),
        }
    }
}

impl Serialize for ToHeight {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ToHeight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(u64),
            Str(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Int(n) => Ok(ToHeight::Height(n)),
            Repr::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Concurrency, timeout, and progress-reporting knobs for the range runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub concurrency: usize,
    pub block_timeout_ms: u64,
    pub max_block_retries: u32,
    pub progress_every_blocks: u64,
    pub progress_interval_sec: u64,
    pub case_mode: CaseMode,
    pub pool_size: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            concurrency: 48,
            block_timeout_ms: 30_000,
            max_block_retries: 3,
            progress_every_blocks: 1000,
            progress_interval_sec: 15,
            case_mode: CaseMode::Snake,
            pool_size: 16,
        }
    }
}

/// Case convention applied to decoded message payload keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMode {
    Snake,
    Camel,
}

/// Which sink backend receives row sets, and its shared knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub sink_kind: SinkKind,
    pub out_path: Option<PathBuf>,
    pub flush_every: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            sink_kind: SinkKind::Stdout,
            out_path: None,
            flush_every: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Stdout,
    File,
    Postgres,
    Null,
    Clickhouse,
}

impl std::str::FromStr for SinkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(SinkKind::Stdout),
            "file" => Ok(SinkKind::File),
            "postgres" => Ok(SinkKind::Postgres),
            "null" => Ok(SinkKind::Null),
            "clickhouse" => Ok(SinkKind::Clickhouse),
            other => Err(ConfigError::UnknownSink(other.to_string())),
        }
    }
}

/// Postgres connection and batching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub ssl: bool,
    pub mode: PgMode,
    pub batch_blocks: usize,
    pub batch_txs: usize,
    pub batch_msgs: usize,
    pub batch_events: usize,
    pub batch_attrs: usize,
    pub pool_size: u32,
    pub progress_id: String,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 5432,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            ssl: false,
            mode: PgMode::BatchInsert,
            batch_blocks: 1000,
            batch_txs: 2000,
            batch_msgs: 5000,
            batch_events: 10_000,
            batch_attrs: 30_000,
            pool_size: 16,
            progress_id: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PgMode {
    BatchInsert,
    BlockAtomic,
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save this configuration as a pretty-printed TOML file at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file search path: `{config_dir()}/indexer/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("indexer").join("config.toml"))
    }

    /// Merge a TOML file (if `file` is `Some` and exists) with `IDX_`-prefixed
    /// environment variable overrides, on top of `Config::default()`.
    ///
    /// Environment keys use `__` to address nested fields, e.g.
    /// `IDX_PG__HOST=db.internal` sets `pg.host`.
    pub fn from_sources(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match file {
            Some(path) if path.exists() => Config::from_file(path)?,
            _ => Config::default(),
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        let env_str = |key: &str| std::env::var(key).ok();

        if let Some(v) = env_str("IDX_SOURCE__RPC_URL") {
            self.source.rpc_url = v;
        }
        if let Some(v) = env_str("IDX_SOURCE__TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.source.timeout_ms = v;
        }
        if let Some(v) = env_str("IDX_SOURCE__RPS").and_then(|v| v.parse().ok()) {
            self.source.rps = v;
        }
        if let Some(v) = env_str("IDX_SOURCE__RETRIES").and_then(|v| v.parse().ok()) {
            self.source.retries = v;
        }
        if let Some(v) = env_str("IDX_RANGE__FROM").and_then(|v| v.parse().ok()) {
            self.range.from = Some(v);
        }
        if let Some(v) = env_str("IDX_RANGE__TO").and_then(|v| v.parse().ok()) {
            self.range.to = Some(v);
        }
        if let Some(v) = env_str("IDX_RANGE__RESUME").and_then(|v| v.parse().ok()) {
            self.range.resume = v;
        }
        if let Some(v) = env_str("IDX_RANGE__FOLLOW").and_then(|v| v.parse().ok()) {
            self.range.follow = v;
        }
        if let Some(v) = env_str("IDX_CONCURRENCY__CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.concurrency.concurrency = v;
        }
        if let Some(v) = env_str("IDX_SINK__SINK_KIND").and_then(|v| v.parse().ok()) {
            self.sink.sink_kind = v;
        }
        if let Some(v) = env_str("IDX_PG__HOST") {
            self.pg.host = v;
        }
        if let Some(v) = env_str("IDX_PG__PORT").and_then(|v| v.parse().ok()) {
            self.pg.port = v;
        }
        if let Some(v) = env_str("IDX_PG__USER") {
            self.pg.user = v;
        }
        if let Some(v) = env_str("IDX_PG__PASSWORD") {
            self.pg.password = v;
        }
        if let Some(v) = env_str("IDX_PG__DATABASE") {
            self.pg.database = v;
        }
        if let Some(v) = env_str("IDX_PG__PROGRESS_ID") {
            self.pg.progress_id = v;
        }
    }

    /// Validate the merged configuration, surfacing every fatal
    /// misconfiguration as a `ConfigError` before any RPC call is attempted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.source.rpc_url.starts_with("http://") || self.source.rpc_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidRpcUrl(self.source.rpc_url.clone()));
        }
        if !(0.0..=1.0).contains(&self.source.backoff_jitter) {
            return Err(ConfigError::InvalidJitter(self.source.backoff_jitter));
        }
        if self.source.rps <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "source.rps",
                value: self.source.rps as i64,
            });
        }
        if let (Some(from), Some(ToHeight::Height(to))) = (self.range.from, self.range.to) {
            if to < from {
                return Err(ConfigError::ToBeforeFrom { from, to });
            }
        }
        if self.concurrency.concurrency == 0 {
            return Err(ConfigError::NotPositive {
                field: "concurrency.concurrency",
                value: 0,
            });
        }
        match self.sink.sink_kind {
            SinkKind::Clickhouse => {
                return Err(ConfigError::UnsupportedSink("clickhouse".to_string()))
            }
            SinkKind::Postgres => {
                if self.pg.host.is_empty() || self.pg.database.is_empty() {
                    return Err(ConfigError::MissingPgFields);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            range: RangeConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            sink: SinkConfig::default(),
            pg: PgConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_internally_valid_given_an_rpc_url() {
        let mut cfg = Config::default();
        cfg.source.rpc_url = "http://localhost:26657".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_missing_rpc_url() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidRpcUrl(_))
        ));
    }

    #[test]
    fn rejects_to_before_from() {
        let mut cfg = Config::default();
        cfg.source.rpc_url = "http://localhost:26657".to_string();
        cfg.range.from = Some(200);
        cfg.range.to = Some(ToHeight::Height(100));
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ToBeforeFrom { from: 200, to: 100 })
        ));
    }

    #[test]
    fn rejects_jitter_out_of_range() {
        let mut cfg = Config::default();
        cfg.source.rpc_url = "http://localhost:26657".to_string();
        cfg.source.backoff_jitter = 1.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidJitter(_))));
    }

    #[test]
    fn rejects_clickhouse_sink() {
        let mut cfg = Config::default();
        cfg.source.rpc_url = "http://localhost:26657".to_string();
        cfg.sink.sink_kind = SinkKind::Clickhouse;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::UnsupportedSink(_))
        ));
    }

    #[test]
    fn rejects_postgres_sink_without_host() {
        let mut cfg = Config::default();
        cfg.source.rpc_url = "http://localhost:26657".to_string();
        cfg.sink.sink_kind = SinkKind::Postgres;
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingPgFields)));
    }

    #[test]
    fn from_file_round_trips() {
        let temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
            [source]
            rpc_url = "http://127.0.0.1:26657"
            rps = 200.0

            [range]
            from = 100
            to = "200"

            [sink]
            sink_kind = "postgres"

            [pg]
            host = "localhost"
            database = "indexer"
        "#;
        fs::write(&temp_file, toml_content).unwrap();

        let cfg = Config::from_file(&temp_file).unwrap();
        assert_eq!(cfg.source.rpc_url, "http://127.0.0.1:26657");
        assert_eq!(cfg.source.rps, 200.0);
        assert_eq!(cfg.range.from, Some(100));
        assert_eq!(cfg.pg.host, "localhost");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn env_overrides_take_precedence_over_file() {
        std::env::set_var("IDX_SOURCE__RPC_URL", "http://override:26657");
        let cfg = Config::from_sources(None).unwrap();
        assert_eq!(cfg.source.rpc_url, "http://override:26657");
        std::env::remove_var("IDX_SOURCE__RPC_URL");
    }

    #[test]
    fn to_height_parses_latest_and_numeric() {
        assert_eq!("latest".parse::<ToHeight>().unwrap(), ToHeight::Latest);
        assert_eq!(
            "12345".parse::<ToHeight>().unwrap(),
            ToHeight::Height(12345)
        );
        assert!("not-a-number".parse::<ToHeight>().is_err());
    }
}
