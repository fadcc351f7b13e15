//! Hook-generation manifest.
//!
//! A declarative description of the three contracts (name, ABI, address),
//! the output path and generator plugins, handed to an external code
//! generator that emits typed UI hooks. Nothing here runs at call time.

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{AddressBook, NetworkConfig};
use crate::error::ConfigError;
use crate::registry::ContractKind;

/// Default location of the generated hooks.
pub const DEFAULT_OUT: &str = "generated/wagmi.ts";

/// Generator plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookPlugin {
    React,
}

/// One contract entry of the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestContract {
    pub name: String,
    pub abi: JsonAbi,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookManifest {
    pub out: PathBuf,
    pub plugins: Vec<HookPlugin>,
    pub contracts: Vec<ManifestContract>,
}

impl HookManifest {
    pub fn new(book: &AddressBook) -> Self {
        Self {
            out: PathBuf::from(DEFAULT_OUT),
            plugins: vec![HookPlugin::React],
            contracts: ContractKind::ALL
                .iter()
                .map(|&kind| ManifestContract {
                    name: kind.name().to_string(),
                    abi: kind.interface().abi().clone(),
                    address: book.get(kind),
                })
                .collect(),
        }
    }

    pub fn from_network(network: &NetworkConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(&network.address_book()?))
    }

    pub fn with_out(mut self, out: impl Into<PathBuf>) -> Self {
        self.out = out.into();
        self
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        std::fs::write(path, self.to_json()? + "\n").map_err(|e| ConfigError::io(path, e))?;
        tracing::info!(
            path = %path.display(),
            contracts = self.contracts.len(),
            "wrote hook manifest"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_lists_all_contracts() {
        let book = AddressBook::somnia_testnet();
        let manifest = HookManifest::new(&book);
        let names: Vec<_> = manifest.contracts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["StreamNFT", "ChronoFlowCore", "ChronoFlowMarketplace"]);
        assert_eq!(manifest.contracts[1].address, book.core);
        assert_eq!(manifest.out, PathBuf::from(DEFAULT_OUT));
    }

    #[test]
    fn manifest_json_shape() {
        let manifest = HookManifest::new(&AddressBook::somnia_testnet()).with_out("web/hooks.ts");
        let value: serde_json::Value = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(value["plugins"][0], "react");
        assert_eq!(value["out"], "web/hooks.ts");
        assert!(value["contracts"][2]["abi"].as_array().unwrap().len() >= 9);

        let back: HookManifest = serde_json::from_value(value).unwrap();
        assert_eq!(back.contracts[0].address, manifest.contracts[0].address);
    }

    #[test]
    fn manifest_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/manifest.json");
        HookManifest::new(&AddressBook::somnia_testnet()).write(&path).unwrap();
        assert!(path.exists());
    }
}
