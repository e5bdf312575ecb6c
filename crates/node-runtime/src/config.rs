//! # Node Configuration
//!
//! Loaded from an optional TOML file, then overridden from the environment,
//! then validated before any state is written.
//!
//! ```toml
//! n_shards = 4
//! topology = "NeighbouringShardTopology"
//!
//! [collator]
//! tick_ms = 2000
//! attempt_timeout_ms = 10000
//! max_batch = 100
//!
//! [replay]
//! shard = 2
//! block = 7
//!
//! [execution]
//! deploy_gas = 10000
//! call_gas = 1000
//! system_wallet = "0x00001f3d4b2a90115c7e3a826d440be1c905773b"
//!
//! [network]
//! enabled = true
//!
//! [logging]
//! level = "info"
//! json = false
//!
//! [[genesis.accounts]]
//! address = "0x0001000000000000000000000000000000000001"
//! balance = 1000000
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `SC_NSHARDS` | `n_shards` |
//! | `SC_TOPOLOGY` | `topology` |
//! | `SC_COLLATOR_TICK_MS` | `collator.tick_ms` |
//! | `SC_REPLAY_SHARD` | `replay.shard` |
//! | `SC_REPLAY_BLOCK` | `replay.block` |

use sc_01_topology::{ShardTopology, TopologyError};
use sc_03_execution::{AccountState, GasSchedule};
use sc_04_collator::{CollatorConfig, ReplayConfig};
use serde::Deserialize;
use shared_types::{Address, BlockNumber, Gas, ShardId, MAIN_SHARD_ID, MAIN_WALLET_ADDRESS, U256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors. Raised before any state is written.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path:?}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`NodeConfig`].
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },

    /// Unknown topology id.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// At least one shard is required.
    #[error("n_shards must be at least 1")]
    NoShards,

    /// A duration is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// `max_batch` is zero.
    #[error("collator.max_batch must be greater than zero")]
    ZeroBatch,

    /// Only one of `replay.shard` / `replay.block` is set.
    #[error("replay needs both a shard and a block")]
    IncompleteReplay,

    /// Replay of the main shard was requested.
    #[error("replay of the main shard is not supported")]
    ReplayMainShard,

    /// Replay of block zero was requested.
    #[error("cannot replay zerostate-block of shard {0}")]
    ReplayZeroStateBlock(ShardId),

    /// A shard id is outside `0..n_shards`.
    #[error("shard {shard_id} out of range for {n_shards} shards")]
    ShardOutOfRange {
        /// Shard id.
        shard_id: ShardId,
        /// Configured shard count.
        n_shards: u16,
    },

    /// An address does not parse.
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    /// Account code is not hex.
    #[error("invalid code for account {address}: {source}")]
    InvalidCode {
        /// Account.
        address: String,
        /// Decode error.
        #[source]
        source: hex::FromHexError,
    },
}

/// Result alias for configuration handling.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete node configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Number of shards, main shard included.
    pub n_shards: u16,
    /// Topology id (see [`ShardTopology::from_id`]).
    pub topology: String,
    /// Collation timing.
    pub collator: CollatorSection,
    /// Optional block replay.
    pub replay: ReplaySection,
    /// Execution parameters.
    pub execution: ExecutionSection,
    /// Block propagation.
    pub network: NetworkSection,
    /// Genesis state.
    pub genesis: GenesisSection,
    /// Log output.
    pub logging: LoggingSection,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            n_shards: 2,
            topology: ShardTopology::default().id().to_string(),
            collator: CollatorSection::default(),
            replay: ReplaySection::default(),
            execution: ExecutionSection::default(),
            network: NetworkSection::default(),
            genesis: GenesisSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

/// `[collator]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollatorSection {
    /// Interval between collation attempts.
    pub tick_ms: u64,
    /// Bound on one attempt.
    pub attempt_timeout_ms: u64,
    /// Pool messages per block.
    pub max_batch: usize,
}

impl Default for CollatorSection {
    fn default() -> Self {
        Self {
            tick_ms: sc_04_collator::config::DEFAULT_COLLATOR_TICK.as_millis() as u64,
            attempt_timeout_ms: sc_04_collator::config::DEFAULT_ATTEMPT_TIMEOUT.as_millis() as u64,
            max_batch: sc_04_collator::config::DEFAULT_MAX_BATCH,
        }
    }
}

/// `[replay]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplaySection {
    /// Shard to replay.
    pub shard: Option<ShardId>,
    /// Block to replay.
    pub block: Option<BlockNumber>,
}

/// `[execution]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionSection {
    /// Gas charged per deployment.
    pub deploy_gas: u64,
    /// Gas charged per call.
    pub call_gas: u64,
    /// Only sender allowed to deploy onto the main shard (hex).
    pub system_wallet: Option<String>,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        let schedule = GasSchedule::default();
        Self {
            deploy_gas: schedule.deploy_gas.0,
            call_gas: schedule.call_gas.0,
            system_wallet: None,
        }
    }
}

/// `[network]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSection {
    /// Publish and listen for blocks.
    pub enabled: bool,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// `[genesis]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenesisSection {
    /// Accounts present from block zero.
    pub accounts: Vec<GenesisAccount>,
}

/// One `[[genesis.accounts]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisAccount {
    /// Address (hex, shard in the first two bytes).
    pub address: String,
    /// Initial balance.
    #[serde(default)]
    pub balance: u64,
    /// Contract code (hex).
    #[serde(default)]
    pub code: Option<String>,
}

/// `[logging]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl NodeConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// File (if any), then process environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `SC_*` overrides looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("SC_NSHARDS") {
            self.n_shards = parse_env("SC_NSHARDS", value)?;
        }
        if let Some(value) = lookup("SC_TOPOLOGY") {
            self.topology = value;
        }
        if let Some(value) = lookup("SC_COLLATOR_TICK_MS") {
            self.collator.tick_ms = parse_env("SC_COLLATOR_TICK_MS", value)?;
        }
        if let Some(value) = lookup("SC_REPLAY_SHARD") {
            self.replay.shard = Some(parse_env("SC_REPLAY_SHARD", value)?);
        }
        if let Some(value) = lookup("SC_REPLAY_BLOCK") {
            self.replay.block = Some(parse_env("SC_REPLAY_BLOCK", value)?);
        }
        Ok(())
    }

    /// Rejects configurations the node cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.n_shards == 0 {
            return Err(ConfigError::NoShards);
        }
        self.topology()?;
        if self.collator.tick_ms == 0 {
            return Err(ConfigError::ZeroDuration("collator.tick_ms"));
        }
        if self.collator.attempt_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("collator.attempt_timeout_ms"));
        }
        if self.collator.max_batch == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        self.replay_config()?;
        self.system_wallet()?;
        self.genesis_accounts()?;
        Ok(())
    }

    /// The configured topology.
    pub fn topology(&self) -> Result<ShardTopology> {
        Ok(ShardTopology::from_id(&self.topology)?)
    }

    /// Only sender allowed to deploy onto the main shard.
    pub fn system_wallet(&self) -> Result<Address> {
        match &self.execution.system_wallet {
            Some(value) => parse_address(value),
            None => Ok(MAIN_WALLET_ADDRESS),
        }
    }

    /// Gas charged by the execution engine.
    pub fn gas_schedule(&self) -> GasSchedule {
        GasSchedule {
            deploy_gas: Gas(self.execution.deploy_gas),
            call_gas: Gas(self.execution.call_gas),
        }
    }

    /// Collator settings for `shard_id`.
    pub fn collator_config(&self, shard_id: ShardId) -> Result<CollatorConfig> {
        Ok(CollatorConfig {
            topology: self.topology()?,
            tick: Duration::from_millis(self.collator.tick_ms),
            attempt_timeout: Duration::from_millis(self.collator.attempt_timeout_ms),
            max_batch: self.collator.max_batch,
            system_wallet: self.system_wallet()?,
            ..CollatorConfig::new(shard_id, self.n_shards)
        })
    }

    /// The requested replay, if any.
    pub fn replay_config(&self) -> Result<Option<ReplayConfig>> {
        let (shard_id, block) = match (self.replay.shard, self.replay.block) {
            (None, None) => return Ok(None),
            (Some(shard_id), Some(block)) => (shard_id, block),
            _ => return Err(ConfigError::IncompleteReplay),
        };
        if shard_id == MAIN_SHARD_ID {
            return Err(ConfigError::ReplayMainShard);
        }
        if shard_id >= self.n_shards {
            return Err(ConfigError::ShardOutOfRange {
                shard_id,
                n_shards: self.n_shards,
            });
        }
        if block == 0 {
            return Err(ConfigError::ReplayZeroStateBlock(shard_id));
        }
        Ok(Some(ReplayConfig {
            attempt_timeout: Duration::from_millis(self.collator.attempt_timeout_ms),
            ..ReplayConfig::new(shard_id, block)
        }))
    }

    /// Genesis accounts, parsed.
    pub fn genesis_accounts(&self) -> Result<Vec<(Address, AccountState)>> {
        self.genesis
            .accounts
            .iter()
            .map(|entry| {
                let address = parse_address(&entry.address)?;
                if address.shard_id() >= self.n_shards {
                    return Err(ConfigError::ShardOutOfRange {
                        shard_id: address.shard_id(),
                        n_shards: self.n_shards,
                    });
                }
                let code = match &entry.code {
                    Some(code) => hex::decode(code.trim_start_matches("0x")).map_err(|source| {
                        ConfigError::InvalidCode {
                            address: entry.address.clone(),
                            source,
                        }
                    })?,
                    None => Vec::new(),
                };
                let account = AccountState {
                    code,
                    ..AccountState::with_balance(U256::from(entry.balance))
                };
                Ok((address, account))
            })
            .collect()
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

fn parse_address(value: &str) -> Result<Address> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidAddress(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.topology().unwrap(), ShardTopology::Neighbouring);
        assert!(config.replay_config().unwrap().is_none());
        assert_eq!(config.system_wallet().unwrap(), MAIN_WALLET_ADDRESS);
    }

    #[test]
    fn test_parse_full_document() {
        let config = NodeConfig::from_toml_str(
            r#"
            n_shards = 4
            topology = "trivial"

            [collator]
            tick_ms = 500
            max_batch = 10

            [replay]
            shard = 2
            block = 7

            [[genesis.accounts]]
            address = "0x0001000000000000000000000000000000000001"
            balance = 5000
            code = "0xc0de"
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.topology().unwrap(), ShardTopology::Trivial);
        let collator = config.collator_config(3).unwrap();
        assert_eq!(collator.tick, Duration::from_millis(500));
        assert_eq!(collator.max_batch, 10);
        assert_eq!(collator.n_shards, 4);

        let replay = config.replay_config().unwrap().unwrap();
        assert_eq!((replay.shard_id, replay.block), (2, 7));

        let accounts = config.genesis_accounts().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].0.shard_id(), 1);
        assert_eq!(accounts[0].1.balance, U256::from(5000));
        assert_eq!(accounts[0].1.code, vec![0xc0, 0xde]);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(matches!(
            NodeConfig::from_toml_str("shards = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = NodeConfig::default();
        config
            .apply_env(env(&[
                ("SC_NSHARDS", "5"),
                ("SC_TOPOLOGY", "TrivialShardTopology"),
                ("SC_COLLATOR_TICK_MS", "250"),
                ("SC_REPLAY_SHARD", "3"),
                ("SC_REPLAY_BLOCK", "9"),
            ]))
            .unwrap();
        config.validate().unwrap();

        assert_eq!(config.n_shards, 5);
        assert_eq!(config.topology().unwrap(), ShardTopology::Trivial);
        assert_eq!(config.collator.tick_ms, 250);
        let replay = config.replay_config().unwrap().unwrap();
        assert_eq!((replay.shard_id, replay.block), (3, 9));
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = NodeConfig::default();
        let err = config.apply_env(env(&[("SC_NSHARDS", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "SC_NSHARDS", .. }));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = NodeConfig::default();
        config.n_shards = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoShards)));

        let mut config = NodeConfig::default();
        config.topology = "mesh".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Topology(_))));

        let mut config = NodeConfig::default();
        config.collator.attempt_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDuration(_))));

        let mut config = NodeConfig::default();
        config.replay.shard = Some(MAIN_SHARD_ID);
        config.replay.block = Some(3);
        assert!(matches!(config.validate(), Err(ConfigError::ReplayMainShard)));

        let mut config = NodeConfig::default();
        config.replay.shard = Some(1);
        config.replay.block = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("zerostate-block"));

        let mut config = NodeConfig::default();
        config.replay.block = Some(4);
        assert!(matches!(config.validate(), Err(ConfigError::IncompleteReplay)));
    }

    #[test]
    fn test_genesis_account_on_missing_shard() {
        let mut config = NodeConfig::default();
        config.genesis.accounts.push(GenesisAccount {
            address: "0x0009000000000000000000000000000000000001".to_string(),
            balance: 1,
            code: None,
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ShardOutOfRange { shard_id: 9, .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n_shards = 3\n[network]\nenabled = false").unwrap();

        let config = NodeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.n_shards, 3);
        assert!(!config.network.enabled);
        assert!(matches!(
            NodeConfig::from_file(Path::new("/nonexistent/node.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
