//! Interface registry: the ABI of every ChronoFlow contract.
//!
//! The ABI JSON files under `abi/` are embedded at compile time and parsed
//! once per process. They are trusted as-is: nothing here can check them
//! against the bytecode actually deployed at an address.

use alloy_json_abi::{Constructor, Event, Function, JsonAbi, StateMutability};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::CodecError;

/// One of the three ChronoFlow contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContractKind {
    #[serde(rename = "StreamNFT")]
    StreamNft,
    #[serde(rename = "ChronoFlowCore")]
    Core,
    #[serde(rename = "ChronoFlowMarketplace")]
    Marketplace,
}

impl ContractKind {
    /// All contracts, in deployment order of their creation steps.
    pub const ALL: [ContractKind; 3] = [Self::StreamNft, Self::Core, Self::Marketplace];

    /// Contract name as compiled (also the artifact file stem).
    pub fn name(self) -> &'static str {
        match self {
            Self::StreamNft => "StreamNFT",
            Self::Core => "ChronoFlowCore",
            Self::Marketplace => "ChronoFlowMarketplace",
        }
    }

    /// The cached, parsed interface of this contract.
    pub fn interface(self) -> &'static Interface {
        Interface::get(self)
    }

    fn abi_json(self) -> &'static str {
        match self {
            Self::StreamNft => include_str!("../abi/StreamNFT.json"),
            Self::Core => include_str!("../abi/ChronoFlowCore.json"),
            Self::Marketplace => include_str!("../abi/ChronoFlowMarketplace.json"),
        }
    }

    fn index(self) -> usize {
        match self {
            Self::StreamNft => 0,
            Self::Core => 1,
            Self::Marketplace => 2,
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContractKind {
    type Err = String;

    /// Accepts the compiled name (any case) or a short alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "streamnft" | "stream-nft" | "nft" => Ok(Self::StreamNft),
            "chronoflowcore" | "core" => Ok(Self::Core),
            "chronoflowmarketplace" | "marketplace" | "market" => Ok(Self::Marketplace),
            other => Err(format!(
                "unknown contract '{other}' \
                 (expected StreamNFT, ChronoFlowCore or ChronoFlowMarketplace)"
            )),
        }
    }
}

/// Direction of an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Creation-time entry point, only reached through deployment.
    Constructor,
    /// `pure` / `view` function: callable without a signing credential.
    Query,
    /// `nonpayable` / `payable` function: requires a transaction.
    Action,
    /// Event notification emitted by the contract.
    Event,
    /// Custom error a call may revert with.
    Error,
}

/// A single typed parameter of an entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamShape {
    pub name: String,
    pub ty: String,
    /// Only meaningful for event fields.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub indexed: bool,
}

/// Summary of one callable entry point or event of an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub name: String,
    pub direction: Direction,
    /// `None` for events and errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutability: Option<StateMutability>,
    pub inputs: Vec<ParamShape>,
    pub outputs: Vec<ParamShape>,
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |params: &[ParamShape]| {
            params
                .iter()
                .map(|p| {
                    let mut s = p.ty.clone();
                    if p.indexed {
                        s.push_str(" indexed");
                    }
                    if !p.name.is_empty() {
                        s.push(' ');
                        s.push_str(&p.name);
                    }
                    s
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self.direction {
            Direction::Event => write!(f, "event {}({})", self.name, join(&self.inputs)),
            Direction::Error => write!(f, "error {}({})", self.name, join(&self.inputs)),
            Direction::Constructor => {
                write!(f, "constructor({})", join(&self.inputs))?;
                if let Some(m) = self.mutability {
                    write!(f, " {}", mutability_str(m))?;
                }
                Ok(())
            }
            Direction::Query | Direction::Action => {
                write!(f, "function {}({})", self.name, join(&self.inputs))?;
                if let Some(m) = self.mutability {
                    write!(f, " {}", mutability_str(m))?;
                }
                if !self.outputs.is_empty() {
                    write!(f, " returns ({})", join(&self.outputs))?;
                }
                Ok(())
            }
        }
    }
}

/// Solidity keyword for a mutability class.
pub fn mutability_str(m: StateMutability) -> &'static str {
    match m {
        StateMutability::Pure => "pure",
        StateMutability::View => "view",
        StateMutability::NonPayable => "nonpayable",
        StateMutability::Payable => "payable",
    }
}

/// Returns `true` for functions that can be served by `eth_call` alone.
pub fn is_read_only(func: &Function) -> bool {
    matches!(
        func.state_mutability,
        StateMutability::Pure | StateMutability::View
    )
}

/// A parsed contract interface.
#[derive(Debug, Clone)]
pub struct Interface {
    kind: ContractKind,
    abi: JsonAbi,
}

impl Interface {
    /// Parse the embedded ABI of `kind`.
    pub fn parse(kind: ContractKind) -> Result<Self, CodecError> {
        let abi: JsonAbi =
            serde_json::from_str(kind.abi_json()).map_err(|e| CodecError::InvalidAbi {
                contract: kind.name(),
                reason: e.to_string(),
            })?;
        Ok(Self { kind, abi })
    }

    /// Cached interface for `kind`, parsed on first use.
    pub fn get(kind: ContractKind) -> &'static Interface {
        static CELL: OnceLock<[Interface; 3]> = OnceLock::new();
        let all = CELL.get_or_init(|| {
            // The embedded ABIs are checked by the registry tests.
            ContractKind::ALL.map(|k| {
                Interface::parse(k).unwrap_or_else(|e| panic!("embedded ABI is invalid: {e}"))
            })
        });
        &all[kind.index()]
    }

    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.abi.constructor()
    }

    /// All overloads of `name` (empty slice when absent).
    pub fn functions_named(&self, name: &str) -> &[Function] {
        self.abi.function(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find `name` taking exactly `arity` inputs.
    ///
    /// Arity is enough to tell apart every overload these contracts declare
    /// (`safeTransferFrom` with and without `bytes data`).
    pub fn function(&self, name: &str, arity: usize) -> Result<&Function, CodecError> {
        self.functions_named(name)
            .iter()
            .find(|f| f.inputs.len() == arity)
            .ok_or_else(|| CodecError::FunctionNotFound {
                contract: self.name(),
                name: name.to_string(),
                arity,
            })
    }

    /// Find a function by its 4-byte selector.
    pub fn function_by_selector(&self, selector: [u8; 4]) -> Option<&Function> {
        self.abi.functions().find(|f| f.selector().0 == selector)
    }

    pub fn event(&self, name: &str) -> Result<&Event, CodecError> {
        self.abi
            .event(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| CodecError::EventNotFound {
                contract: self.name(),
                name: name.to_string(),
            })
    }

    /// Find a non-anonymous event by its `topics[0]` hash.
    pub fn event_by_topic(&self, topic: &alloy_primitives::B256) -> Option<&Event> {
        self.abi
            .events()
            .find(|e| !e.anonymous && e.selector() == *topic)
    }

    /// Declared custom errors, by name.
    pub fn errors(&self) -> impl Iterator<Item = &alloy_json_abi::Error> {
        self.abi.errors()
    }

    pub fn error_by_selector(&self, selector: [u8; 4]) -> Option<&alloy_json_abi::Error> {
        self.abi.errors().find(|e| e.selector().0 == selector)
    }

    /// Ordered summary: constructor, functions (by name, overloads in
    /// declaration order), events, then custom errors.
    pub fn entry_points(&self) -> Vec<EntryPoint> {
        let shape = |p: &alloy_json_abi::Param| ParamShape {
            name: p.name.clone(),
            ty: p.selector_type().into_owned(),
            indexed: false,
        };

        let constructor = self.constructor().map(|c| EntryPoint {
            name: "constructor".to_string(),
            direction: Direction::Constructor,
            mutability: Some(c.state_mutability),
            inputs: c.inputs.iter().map(shape).collect(),
            outputs: vec![],
        });

        let functions = self.abi.functions().map(|f| EntryPoint {
            name: f.name.clone(),
            direction: if is_read_only(f) {
                Direction::Query
            } else {
                Direction::Action
            },
            mutability: Some(f.state_mutability),
            inputs: f.inputs.iter().map(shape).collect(),
            outputs: f.outputs.iter().map(shape).collect(),
        });

        let events = self.abi.events().map(|e| EntryPoint {
            name: e.name.clone(),
            direction: Direction::Event,
            mutability: None,
            inputs: e
                .inputs
                .iter()
                .map(|p| ParamShape {
                    name: p.name.clone(),
                    ty: p.selector_type().into_owned(),
                    indexed: p.indexed,
                })
                .collect(),
            outputs: vec![],
        });

        let errors = self.abi.errors().map(|e| EntryPoint {
            name: e.name.clone(),
            direction: Direction::Error,
            mutability: None,
            inputs: e.inputs.iter().map(shape).collect(),
            outputs: vec![],
        });

        constructor
            .into_iter()
            .chain(functions)
            .chain(events)
            .chain(errors)
            .collect()
    }
}
