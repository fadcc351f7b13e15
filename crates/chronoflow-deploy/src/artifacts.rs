//! Compiled contract artifacts.
//!
//! Both Hardhat (`"bytecode": "0x..."`) and Foundry
//! (`"bytecode": { "object": "0x..." }`) JSON layouts are accepted. An
//! artifact is matched to a contract by its file name, e.g. `StreamNFT.json`.

use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use chronoflow_core::{ContractKind, Interface};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ArtifactError;

/// Creation bytecode of one contract.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ContractKind,
    pub bytecode: Bytes,
    pub abi: Option<JsonAbi>,
    pub path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct RawArtifact {
    #[serde(default)]
    abi: Option<JsonAbi>,
    #[serde(default)]
    bytecode: Option<Value>,
}

/// Artifacts for the three ChronoFlow contracts.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    root: Option<PathBuf>,
    artifacts: BTreeMap<ContractKind, Artifact>,
}

impl ArtifactStore {
    /// Scan `dir` recursively for `<Contract>.json` files.
    ///
    /// Contracts without an artifact are not an error here; [`bytecode`]
    /// reports them when a deployment needs them.
    ///
    /// [`bytecode`]: Self::bytecode
    pub fn from_dir(dir: &Path) -> Result<Self, ArtifactError> {
        let mut store = Self {
            root: Some(dir.to_path_buf()),
            artifacts: BTreeMap::new(),
        };
        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = entry.map_err(|e| ArtifactError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(kind) = kind_for_file(entry.path()) else {
                continue;
            };
            if let Some(existing) = store.artifacts.get(&kind) {
                tracing::warn!(
                    contract = kind.name(),
                    kept = ?existing.path,
                    ignored = %entry.path().display(),
                    "duplicate artifact"
                );
                continue;
            }
            let artifact = load_artifact(kind, entry.path())?;
            tracing::debug!(
                contract = kind.name(),
                path = %entry.path().display(),
                size = artifact.bytecode.len(),
                "loaded artifact"
            );
            store.artifacts.insert(kind, artifact);
        }
        Ok(store)
    }

    /// Store built from bytecode already in memory.
    pub fn from_bytecodes(items: impl IntoIterator<Item = (ContractKind, Bytes)>) -> Self {
        let artifacts = items
            .into_iter()
            .map(|(kind, bytecode)| {
                (
                    kind,
                    Artifact {
                        kind,
                        bytecode,
                        abi: None,
                        path: None,
                    },
                )
            })
            .collect();
        Self {
            root: None,
            artifacts,
        }
    }

    pub fn get(&self, kind: ContractKind) -> Option<&Artifact> {
        self.artifacts.get(&kind)
    }

    pub fn bytecode(&self, kind: ContractKind) -> Result<&Bytes, ArtifactError> {
        self.artifacts
            .get(&kind)
            .map(|a| &a.bytecode)
            .ok_or_else(|| ArtifactError::NotFound {
                contract: kind.name(),
                dir: self.root.clone().unwrap_or_default(),
            })
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

fn kind_for_file(path: &Path) -> Option<ContractKind> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(".json")?;
    ContractKind::ALL.into_iter().find(|k| k.name() == stem)
}

fn load_artifact(kind: ContractKind, path: &Path) -> Result<Artifact, ArtifactError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: RawArtifact = serde_json::from_str(&raw).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let hex = match &parsed.bytecode {
        Some(Value::String(s)) => s.as_str(),
        Some(Value::Object(obj)) => obj
            .get("object")
            .and_then(Value::as_str)
            .ok_or(ArtifactError::MissingBytecode {
                contract: kind.name(),
            })?,
        _ => {
            return Err(ArtifactError::MissingBytecode {
                contract: kind.name(),
            })
        }
    };
    let bytecode = parse_bytecode(kind, hex)?;

    if let Some(abi) = &parsed.abi {
        let drift = abi_drift(Interface::get(kind), abi);
        if !drift.is_empty() {
            tracing::warn!(
                contract = kind.name(),
                path = %path.display(),
                differences = ?drift,
                "artifact ABI differs from the registered interface"
            );
        }
    }

    Ok(Artifact {
        kind,
        bytecode,
        abi: parsed.abi,
        path: Some(path.to_path_buf()),
    })
}

fn parse_bytecode(kind: ContractKind, hex: &str) -> Result<Bytes, ArtifactError> {
    let body = hex.strip_prefix("0x").unwrap_or(hex);
    if body.is_empty() {
        return Err(ArtifactError::MissingBytecode {
            contract: kind.name(),
        });
    }
    // Solidity leaves `__$<hash>$__` where library addresses must be linked.
    if body.contains("__") {
        return Err(ArtifactError::UnlinkedLibraries {
            contract: kind.name(),
        });
    }
    hex.parse::<Bytes>()
        .map_err(|e| ArtifactError::InvalidBytecode {
            contract: kind.name(),
            reason: e.to_string(),
        })
}

/// Function and event signatures present on one side only.
pub fn abi_drift(registered: &Interface, artifact: &JsonAbi) -> Vec<String> {
    let signatures = |abi: &JsonAbi| -> BTreeSet<String> {
        abi.functions()
            .map(|f| f.signature())
            .chain(abi.events().map(|e| e.signature()))
            .collect()
    };
    let ours = signatures(registered.abi());
    let theirs = signatures(artifact);
    ours.symmetric_difference(&theirs)
        .map(|sig| {
            let side = if ours.contains(sig) { "-" } else { "+" };
            format!("{side}{sig}")
        })
        .collect()
}
