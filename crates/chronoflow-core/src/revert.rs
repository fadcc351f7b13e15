//! Revert payload decoding.
//!
//! A reverted call returns one of:
//! - `Error(string)`: `0x08c379a0 ++ abi(string)`, from `require(cond, "msg")`
//! - `Panic(uint256)`: `0x4e487b71 ++ abi(uint256)`, from failed asserts and arithmetic
//! - a custom error declared in the contract's ABI, e.g. `OwnableUnauthorizedAccount(address)`

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Bytes;
use std::fmt;

use crate::codec::{resolve_params, to_json};
use crate::registry::Interface;

/// The 4-byte selector for `Error(string)`.
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// The 4-byte selector for `Panic(uint256)`.
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Why a contract call reverted.
#[derive(Debug, Clone, PartialEq)]
pub enum RevertReason {
    Message(String),
    Panic { code: u64, meaning: &'static str },
    Custom {
        name: String,
        inputs: Vec<(String, DynSolValue)>,
    },
    /// Empty or unrecognised payload.
    Unknown(Bytes),
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(msg) => write!(f, "reverted: {msg}"),
            Self::Panic { code, meaning } => write!(f, "panic 0x{code:02x}: {meaning}"),
            Self::Custom { name, inputs } => {
                let args: Vec<_> = inputs
                    .iter()
                    .map(|(n, v)| format!("{n}: {}", to_json(v)))
                    .collect();
                write!(f, "{name}({})", args.join(", "))
            }
            Self::Unknown(data) if data.is_empty() => write!(f, "reverted without data"),
            Self::Unknown(data) => write!(f, "reverted with unknown data {data}"),
        }
    }
}

/// Decode revert data, consulting `iface` for custom errors.
pub fn decode_revert(data: &[u8], iface: Option<&Interface>) -> RevertReason {
    if let Some(msg) = decode_error_string(data) {
        return RevertReason::Message(msg);
    }
    if let Some(code) = decode_panic(data) {
        return RevertReason::Panic {
            code,
            meaning: panic_meaning(code),
        };
    }
    if let Some(reason) = iface.and_then(|i| decode_custom(data, i)) {
        return reason;
    }
    RevertReason::Unknown(Bytes::copy_from_slice(data))
}

fn selector(data: &[u8]) -> Option<[u8; 4]> {
    data.get(..4)?.try_into().ok()
}

pub fn decode_error_string(data: &[u8]) -> Option<String> {
    if selector(data)? != ERROR_STRING_SELECTOR {
        return None;
    }
    match DynSolType::String.abi_decode(&data[4..]) {
        Ok(DynSolValue::String(s)) => Some(s),
        _ => None,
    }
}

pub fn decode_panic(data: &[u8]) -> Option<u64> {
    if selector(data)? != PANIC_SELECTOR {
        return None;
    }
    match DynSolType::Uint(256).abi_decode(&data[4..]) {
        Ok(DynSolValue::Uint(v, _)) => Some(v.saturating_to::<u64>()),
        _ => None,
    }
}

/// Map a Solidity panic code to a description.
pub fn panic_meaning(code: u64) -> &'static str {
    match code {
        0x00 => "generic compiler-inserted panic",
        0x01 => "assert() called with false condition",
        0x11 => "arithmetic overflow or underflow",
        0x12 => "division or modulo by zero",
        0x21 => "invalid enum value",
        0x22 => "corrupted storage byte array",
        0x31 => ".pop() on empty array",
        0x32 => "out-of-bounds array access",
        0x41 => "too much memory allocated",
        0x51 => "called zero-initialized internal function pointer",
        _ => "unknown panic code",
    }
}

fn decode_custom(data: &[u8], iface: &Interface) -> Option<RevertReason> {
    let error = iface.error_by_selector(selector(data)?)?;
    if error.inputs.is_empty() {
        return Some(RevertReason::Custom {
            name: error.name.clone(),
            inputs: vec![],
        });
    }
    let types = resolve_params(&error.inputs).ok()?;
    let values = match DynSolType::Tuple(types).abi_decode_params(&data[4..]).ok()? {
        DynSolValue::Tuple(vals) => vals,
        single => vec![single],
    };
    Some(RevertReason::Custom {
        name: error.name.clone(),
        inputs: error
            .inputs
            .iter()
            .map(|p| p.name.clone())
            .zip(values)
            .collect(),
    })
}
