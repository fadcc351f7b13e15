//! chronoflow-core: interface registry and shared types for ChronoFlow.
//!
//! # Overview
//!
//! ChronoFlow is a set of three EVM contracts: `StreamNFT` (an ERC-721 whose
//! tokens represent payment streams), `ChronoFlowCore` (the streaming-payment
//! contract) and `ChronoFlowMarketplace` (trading of stream tokens). This crate
//! holds everything about them that does not touch the network:
//!
//! - [`registry`]: the bit-exact ABI of each contract ([`ContractKind`], [`Interface`])
//! - [`codec`]: calldata encoding, output and event-log decoding
//! - [`revert`]: revert payload decoding (`Error(string)`, `Panic(uint256)`, custom errors)
//! - [`config`]: network configuration and per-network [`AddressBook`]
//! - [`types`]: typed views of the contracts' stream and listing records
//! - [`manifest`]: the hook-generation manifest consumed by UI code generators

pub mod codec;
pub mod config;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod revert;
pub mod types;

pub use config::{AddressBook, ChronoFlowConfig, DeployConfig, LogConfig, NetworkConfig};
pub use error::{CodecError, ConfigError};
pub use manifest::HookManifest;
pub use registry::{ContractKind, Direction, EntryPoint, Interface};
pub use revert::RevertReason;
pub use types::{CreateStreamParams, ListingRecord, StreamRecord};

/// Re-exported so downstream crates share one set of primitive types.
pub use alloy_core::dyn_abi::DynSolValue;
pub use alloy_primitives::{Address, Bytes, B256, U256};
