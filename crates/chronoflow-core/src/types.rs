//! Typed views of records owned by the ChronoFlow contracts.
//!
//! These are read-only from our side: the contracts alone mutate them. The
//! shapes mirror the `streams(uint256)` and `listings(uint256)` getters.

use alloy_core::dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::codec::{as_address, as_uint};
use crate::error::CodecError;

/// A payment stream as stored by `ChronoFlowCore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    pub payer: Address,
    pub recipient: Address,
    pub deposit: U256,
    pub token: Address,
    pub start_time: U256,
    pub stop_time: U256,
    pub remaining_balance: U256,
    pub withdrawn_amount: U256,
}

impl StreamRecord {
    /// Build from the eight outputs of `streams(uint256)`.
    pub fn from_outputs(values: &[DynSolValue]) -> Result<Self, CodecError> {
        if values.len() != 8 {
            return Err(CodecError::AbiDecodeFailed {
                reason: format!("streams: expected 8 outputs, got {}", values.len()),
            });
        }
        Ok(Self {
            payer: as_address(&values[0], "payer")?,
            recipient: as_address(&values[1], "recipient")?,
            deposit: as_uint(&values[2], "deposit")?,
            token: as_address(&values[3], "token")?,
            start_time: as_uint(&values[4], "startTime")?,
            stop_time: as_uint(&values[5], "stopTime")?,
            remaining_balance: as_uint(&values[6], "remainingBalance")?,
            withdrawn_amount: as_uint(&values[7], "withdrawnAmount")?,
        })
    }

    /// A stream id that was never created reads back as all zeroes.
    pub fn exists(&self) -> bool {
        self.payer != Address::ZERO
    }

    pub fn duration(&self) -> U256 {
        self.stop_time.saturating_sub(self.start_time)
    }
}

/// A marketplace listing for one StreamNFT token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub seller: Address,
    pub price: U256,
}

impl ListingRecord {
    pub fn from_outputs(values: &[DynSolValue]) -> Result<Self, CodecError> {
        if values.len() != 2 {
            return Err(CodecError::AbiDecodeFailed {
                reason: format!("listings: expected 2 outputs, got {}", values.len()),
            });
        }
        Ok(Self {
            seller: as_address(&values[0], "seller")?,
            price: as_uint(&values[1], "price")?,
        })
    }

    /// Unlisted (or sold) tokens have a zero seller.
    pub fn is_active(&self) -> bool {
        self.seller != Address::ZERO
    }
}

/// Arguments of `createStream`. The payer is the transaction sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamParams {
    pub recipient: Address,
    pub deposit: U256,
    pub token: Address,
    pub start_time: U256,
    pub stop_time: U256,
}

impl CreateStreamParams {
    pub fn to_args(&self) -> Vec<DynSolValue> {
        vec![
            DynSolValue::Address(self.recipient),
            DynSolValue::Uint(self.deposit, 256),
            DynSolValue::Address(self.token),
            DynSolValue::Uint(self.start_time, 256),
            DynSolValue::Uint(self.stop_time, 256),
        ]
    }
}
