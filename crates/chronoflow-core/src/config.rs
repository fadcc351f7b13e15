//! Network configuration and per-network address books.
//!
//! Addresses are never process-wide globals: callers resolve a
//! [`NetworkConfig`] and pass its [`AddressBook`] to the client factory.
//! The one built-in network, `somnia-testnet`, carries fallback addresses
//! that should be replaced by the operator's own deployment.
//!
//! # Example `chronoflow.yaml`
//! ```yaml
//! default_network: local
//! networks:
//!   local:
//!     rpc_url: http://127.0.0.1:8545
//!     chain_id: 31337
//!     addresses_file: ignition/deployments/chain-31337/deployed_addresses.json
//! deploy:
//!   artifacts_dir: artifacts
//!   poll_interval_ms: 500
//! log:
//!   level: info
//!   components:
//!     chronoflow-deploy: debug
//! ```

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::registry::ContractKind;

/// Name of the built-in fallback network.
pub const DEFAULT_NETWORK: &str = "somnia-testnet";
/// JSON-RPC endpoint of the fallback network.
pub const DEFAULT_RPC_URL: &str = "https://dream-rpc.somnia.network";
/// Chain id of the fallback network.
pub const DEFAULT_CHAIN_ID: u64 = 50312;
/// Environment variable selecting the network.
pub const ENV_NETWORK: &str = "CHRONOFLOW_NETWORK";
/// Environment variable overriding the selected network's RPC URL.
pub const ENV_RPC_URL: &str = "CHRONOFLOW_RPC_URL";
/// Deployment module whose keys win in a deployed-addresses map.
pub const DEPLOYMENT_MODULE: &str = "ChronoFlowModule";

/// Deployed address of each ChronoFlow contract on one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    #[serde(rename = "StreamNFT")]
    pub stream_nft: Address,
    #[serde(rename = "ChronoFlowCore")]
    pub core: Address,
    #[serde(rename = "ChronoFlowMarketplace")]
    pub marketplace: Address,
}

impl AddressBook {
    /// Fallback addresses of the public Somnia testnet deployment.
    pub fn somnia_testnet() -> Self {
        Self {
            stream_nft: address!("75a0d486ce7730fA3752f91D3101997ABc942297"),
            core: address!("5803335a6B851C0438281c7F37E95480f7fc586a"),
            marketplace: address!("6ff1561da1cce79765E2F541196894F9EF0BC170"),
        }
    }

    pub fn get(&self, kind: ContractKind) -> Address {
        match kind {
            ContractKind::StreamNft => self.stream_nft,
            ContractKind::Core => self.core,
            ContractKind::Marketplace => self.marketplace,
        }
    }

    pub fn set(&mut self, kind: ContractKind, address: Address) {
        match kind {
            ContractKind::StreamNft => self.stream_nft = address,
            ContractKind::Core => self.core = address,
            ContractKind::Marketplace => self.marketplace = address,
        }
    }

    /// Read a deployed-addresses map as written by a deployment run.
    ///
    /// Keys are `"<Module>#<Contract>"`; bare contract names are accepted too.
    /// A bare name or a [`DEPLOYMENT_MODULE`] key is used first. Otherwise the
    /// contract must appear under exactly one other module.
    pub fn from_deployed(
        source: &str,
        entries: &BTreeMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |kind: ContractKind| -> Result<Address, ConfigError> {
            let name = kind.name();
            let preferred = [name.to_string(), format!("{DEPLOYMENT_MODULE}#{name}")];
            if let Some(raw) = preferred.iter().find_map(|k| entries.get(k)) {
                return parse_address(raw);
            }

            let suffix = format!("#{name}");
            let mut found = entries.iter().filter(|(k, _)| k.ends_with(&suffix));
            match (found.next(), found.next()) {
                (Some((_, raw)), None) => parse_address(raw),
                (None, _) => Err(ConfigError::MissingAddress {
                    network: source.to_string(),
                    contract: name,
                }),
                (Some(_), Some(_)) => Err(ConfigError::AmbiguousAddress {
                    origin: source.to_string(),
                    contract: name,
                    keys: entries
                        .keys()
                        .filter(|k| k.ends_with(&suffix))
                        .cloned()
                        .collect(),
                }),
            }
        };
        Ok(Self {
            stream_nft: lookup(ContractKind::StreamNft)?,
            core: lookup(ContractKind::Core)?,
            marketplace: lookup(ContractKind::Marketplace)?,
        })
    }

    /// Load a `deployed_addresses.json` file.
    pub fn load_deployed(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&raw)?;
        Self::from_deployed(&path.display().to_string(), &entries)
    }

    /// Render as a deployed-addresses map keyed `"<module>#<Contract>"`.
    pub fn to_deployed(&self, module: &str) -> BTreeMap<String, String> {
        ContractKind::ALL
            .iter()
            .map(|k| (format!("{module}#{}", k.name()), self.get(*k).to_checksum(None)))
            .collect()
    }

    /// Write a `deployed_addresses.json` file, creating parent directories.
    pub fn write_deployed(&self, module: &str, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.to_deployed(module))?;
        std::fs::write(path, json + "\n").map_err(|e| ConfigError::io(path, e))
    }
}

/// Parse a 0x-prefixed address. The checksum is not enforced.
pub fn parse_address(raw: &str) -> Result<Address, ConfigError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| ConfigError::InvalidAddress {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Connection settings for one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Filled from the map key when loaded from a config file.
    #[serde(default)]
    pub name: String,
    pub rpc_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Inline address book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<AddressBook>,
    /// A deployed-addresses file; takes precedence over `addresses`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses_file: Option<PathBuf>,
}

impl NetworkConfig {
    pub fn new(name: impl Into<String>, rpc_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rpc_url: rpc_url.into(),
            chain_id: None,
            addresses: None,
            addresses_file: None,
        }
    }

    /// The built-in fallback network.
    pub fn somnia_testnet() -> Self {
        Self {
            chain_id: Some(DEFAULT_CHAIN_ID),
            addresses: Some(AddressBook::somnia_testnet()),
            ..Self::new(DEFAULT_NETWORK, DEFAULT_RPC_URL)
        }
    }

    pub fn with_addresses(mut self, book: AddressBook) -> Self {
        self.addresses = Some(book);
        self
    }

    /// Resolve this network's address book.
    pub fn address_book(&self) -> Result<AddressBook, ConfigError> {
        if let Some(path) = &self.addresses_file {
            return AddressBook::load_deployed(path);
        }
        match self.addresses {
            Some(book) => {
                if self.name == DEFAULT_NETWORK && book == AddressBook::somnia_testnet() {
                    tracing::warn!(
                        network = %self.name,
                        "using built-in fallback addresses; configure your own deployment"
                    );
                }
                Ok(book)
            }
            None => Err(ConfigError::MissingAddress {
                network: self.name.clone(),
                contract: ContractKind::StreamNft.name(),
            }),
        }
    }
}

/// Settings for `chronoflow deploy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Directory searched for compiled contract artifacts.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    /// Receipt polling interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Deployer account; defaults to the node's first account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Where to write the deployed-addresses file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses_out: Option<PathBuf>,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}
fn default_poll_interval_ms() -> u64 {
    1_000
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            from: None,
            addresses_out: None,
        }
    }
}

impl DeployConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Log level per component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Override per component: crate name → level
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// Emit JSON structured logs instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: BTreeMap::new(),
            json: false,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronoFlowConfig {
    #[serde(default = "default_network_name")]
    pub default_network: String,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_network_name() -> String {
    DEFAULT_NETWORK.to_string()
}

impl Default for ChronoFlowConfig {
    fn default() -> Self {
        let mut cfg = Self {
            default_network: default_network_name(),
            networks: BTreeMap::new(),
            deploy: DeployConfig::default(),
            log: LogConfig::default(),
        };
        cfg.normalize();
        cfg
    }
}

impl ChronoFlowConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let mut cfg: Self = serde_yaml::from_str(raw)?;
        cfg.normalize();
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_yaml_str(&raw)
    }

    /// Name networks after their keys and make the fallback network available.
    fn normalize(&mut self) {
        for (key, net) in self.networks.iter_mut() {
            net.name = key.clone();
        }
        self.networks
            .entry(DEFAULT_NETWORK.to_string())
            .or_insert_with(NetworkConfig::somnia_testnet);
    }

    /// Select a network and/or override its RPC URL.
    pub fn apply_overrides(&mut self, network: Option<String>, rpc_url: Option<String>) {
        if let Some(name) = network {
            self.default_network = name;
        }
        if let Some(url) = rpc_url {
            let name = self.default_network.clone();
            self.networks
                .entry(name.clone())
                .and_modify(|n| n.rpc_url = url.clone())
                .or_insert_with(|| NetworkConfig::new(name, url));
        }
    }

    /// Apply command-line overrides layered over `CHRONOFLOW_NETWORK` /
    /// `CHRONOFLOW_RPC_URL`.
    pub fn apply_env(&mut self, network: Option<String>, rpc_url: Option<String>) {
        self.apply_layered(network, rpc_url, |key| std::env::var(key).ok());
    }

    /// Flags win over the environment, which wins over the file. The network
    /// is settled first so the RPC URL only ever lands on the selected one.
    pub fn apply_layered(
        &mut self,
        network: Option<String>,
        rpc_url: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());
        let network = network.or_else(|| env(ENV_NETWORK));
        let rpc_url = rpc_url.or_else(|| env(ENV_RPC_URL));
        self.apply_overrides(network, rpc_url);
    }

    /// Look up `name`, or the default network.
    pub fn network(&self, name: Option<&str>) -> Result<NetworkConfig, ConfigError> {
        let name = name.unwrap_or(&self.default_network);
        self.networks
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownNetwork {
                name: name.to_string(),
                known: self.networks.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }
}
