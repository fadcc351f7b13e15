//! ABI codec for ChronoFlow calls, return values and event logs.
//!
//! Calldata for a function is `selector ++ abi_encode_params(args)`;
//! constructor arguments are the bare parameter encoding appended to the
//! creation bytecode. Values cross this boundary as alloy [`DynSolValue`]s.

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_dyn_abi::Specifier;
use alloy_json_abi::{Event, Function, Param};
use alloy_primitives::{Address, B256, U256};
use serde_json::{json, Value};

use crate::error::CodecError;
use crate::registry::Interface;

/// A decoded event log.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    pub event: String,
    /// Fields in declaration order. Indexed reference types hold the raw
    /// 32-byte topic since their preimage is not recoverable.
    pub fields: Vec<(String, DynSolValue)>,
}

impl DecodedLog {
    pub fn field(&self, name: &str) -> Option<&DynSolValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Resolve ABI parameters into alloy types.
pub fn resolve_params(params: &[Param]) -> Result<Vec<DynSolType>, CodecError> {
    params
        .iter()
        .map(|p| {
            p.resolve().map_err(|e| CodecError::InvalidType {
                ty: p.ty.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn type_checked(
    function: &str,
    params: &[Param],
    args: &[DynSolValue],
) -> Result<Vec<DynSolValue>, CodecError> {
    if args.len() != params.len() {
        return Err(CodecError::ArgumentCount {
            function: function.to_string(),
            expected: params.len(),
            got: args.len(),
        });
    }
    let types = resolve_params(params)?;
    for ((param, ty), arg) in params.iter().zip(&types).zip(args) {
        if !ty.matches(arg) {
            return Err(CodecError::Argument {
                function: function.to_string(),
                param: param.name.clone(),
                reason: format!("value does not match type {}", param.ty),
            });
        }
    }
    Ok(args.to_vec())
}

/// Encode a function call to calldata.
pub fn encode_call(func: &Function, args: &[DynSolValue]) -> Result<Vec<u8>, CodecError> {
    let values = type_checked(&func.name, &func.inputs, args)?;
    let mut calldata = func.selector().to_vec();
    calldata.extend_from_slice(&DynSolValue::Tuple(values).abi_encode_params());
    Ok(calldata)
}

/// Encode constructor arguments (no selector) for `iface`.
pub fn encode_constructor(iface: &Interface, args: &[DynSolValue]) -> Result<Vec<u8>, CodecError> {
    let params = iface.constructor().map(|c| c.inputs.as_slice()).unwrap_or(&[]);
    let values = type_checked("constructor", params, args)?;
    if values.is_empty() {
        return Ok(vec![]);
    }
    Ok(DynSolValue::Tuple(values).abi_encode_params())
}

/// Decode the return data of `func` into its output values.
pub fn decode_output(func: &Function, data: &[u8]) -> Result<Vec<DynSolValue>, CodecError> {
    if func.outputs.is_empty() {
        return Ok(vec![]);
    }
    let types = resolve_params(&func.outputs)?;
    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(data)
        .map_err(|e| CodecError::AbiDecodeFailed {
            reason: format!("{} output: {e}", func.name),
        })?;
    Ok(match decoded {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    })
}

/// Parse textual arguments (as typed on a command line) against `func`'s inputs.
pub fn coerce_args(func: &Function, args: &[String]) -> Result<Vec<DynSolValue>, CodecError> {
    if args.len() != func.inputs.len() {
        return Err(CodecError::ArgumentCount {
            function: func.name.clone(),
            expected: func.inputs.len(),
            got: args.len(),
        });
    }
    let types = resolve_params(&func.inputs)?;
    func.inputs
        .iter()
        .zip(types)
        .zip(args)
        .map(|((param, ty), raw)| {
            ty.coerce_str(raw).map_err(|e| CodecError::Argument {
                function: func.name.clone(),
                param: param.name.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Decode a log emitted by a contract of `iface`.
///
/// Returns `Ok(None)` when `topics[0]` matches no event of the interface.
pub fn decode_log(
    iface: &Interface,
    topics: &[B256],
    data: &[u8],
) -> Result<Option<DecodedLog>, CodecError> {
    let Some(first) = topics.first() else {
        return Ok(None);
    };
    let Some(event) = iface.event_by_topic(first) else {
        return Ok(None);
    };
    decode_event(event, &topics[1..], data).map(Some)
}

fn decode_event(event: &Event, topics: &[B256], data: &[u8]) -> Result<DecodedLog, CodecError> {
    let mut indexed_types = Vec::new();
    let mut data_types = Vec::new();
    for p in &event.inputs {
        let ty = p.resolve().map_err(|e| CodecError::InvalidType {
            ty: p.ty.clone(),
            reason: e.to_string(),
        })?;
        if p.indexed {
            indexed_types.push(ty);
        } else {
            data_types.push(ty);
        }
    }

    if topics.len() != indexed_types.len() {
        return Err(CodecError::AbiDecodeFailed {
            reason: format!(
                "{}: expected {} indexed topics, got {}",
                event.name,
                indexed_types.len(),
                topics.len()
            ),
        });
    }

    let mut indexed_values = Vec::with_capacity(topics.len());
    for (ty, topic) in indexed_types.iter().zip(topics) {
        indexed_values.push(decode_topic(ty, topic)?);
    }

    let data_values = if data_types.is_empty() {
        vec![]
    } else {
        match DynSolType::Tuple(data_types)
            .abi_decode_params(data)
            .map_err(|e| CodecError::AbiDecodeFailed {
                reason: format!("{} data: {e}", event.name),
            })? {
            DynSolValue::Tuple(vals) => vals,
            other => vec![other],
        }
    };

    let mut indexed_iter = indexed_values.into_iter();
    let mut data_iter = data_values.into_iter();
    let mut fields = Vec::with_capacity(event.inputs.len());
    for p in &event.inputs {
        let value = if p.indexed {
            indexed_iter.next()
        } else {
            data_iter.next()
        };
        let value = value.ok_or_else(|| CodecError::AbiDecodeFailed {
            reason: format!("{}: missing value for '{}'", event.name, p.name),
        })?;
        fields.push((p.name.clone(), value));
    }

    Ok(DecodedLog {
        event: event.name.clone(),
        fields,
    })
}

/// Indexed value types are stored padded in the topic; reference types are
/// stored as their keccak hash and come back as raw `bytes32`.
fn decode_topic(ty: &DynSolType, topic: &B256) -> Result<DynSolValue, CodecError> {
    match ty {
        DynSolType::String
        | DynSolType::Bytes
        | DynSolType::Array(_)
        | DynSolType::FixedArray(..)
        | DynSolType::Tuple(_) => Ok(DynSolValue::FixedBytes(*topic, 32)),
        _ => ty
            .abi_decode(topic.as_slice())
            .map_err(|e| CodecError::AbiDecodeFailed {
                reason: format!("topic decode: {e}"),
            }),
    }
}

pub fn as_address(val: &DynSolValue, field: &str) -> Result<Address, CodecError> {
    val.as_address().ok_or_else(|| CodecError::UnexpectedValue {
        field: field.to_string(),
        expected: "address",
    })
}

pub fn as_uint(val: &DynSolValue, field: &str) -> Result<U256, CodecError> {
    val.as_uint()
        .map(|(u, _)| u)
        .ok_or_else(|| CodecError::UnexpectedValue {
            field: field.to_string(),
            expected: "uint",
        })
}

pub fn as_bool(val: &DynSolValue, field: &str) -> Result<bool, CodecError> {
    val.as_bool().ok_or_else(|| CodecError::UnexpectedValue {
        field: field.to_string(),
        expected: "bool",
    })
}

pub fn as_string(val: &DynSolValue, field: &str) -> Result<String, CodecError> {
    val.as_str()
        .map(str::to_owned)
        .ok_or_else(|| CodecError::UnexpectedValue {
            field: field.to_string(),
            expected: "string",
        })
}

/// Take exactly one output value.
pub fn single(mut values: Vec<DynSolValue>, function: &str) -> Result<DynSolValue, CodecError> {
    if values.len() != 1 {
        return Err(CodecError::AbiDecodeFailed {
            reason: format!("{function}: expected 1 output, got {}", values.len()),
        });
    }
    Ok(values.remove(0))
}

/// Render a value as JSON for display: integers as decimal strings,
/// addresses checksummed, bytes as 0x-hex.
pub fn to_json(val: &DynSolValue) -> Value {
    match val {
        DynSolValue::Bool(b) => json!(b),
        DynSolValue::Int(i, _) => json!(i.to_string()),
        DynSolValue::Uint(u, _) => json!(u.to_string()),
        DynSolValue::FixedBytes(b, size) => json!(format!("0x{}", hex::encode(&b[..*size]))),
        DynSolValue::Bytes(b) => json!(format!("0x{}", hex::encode(b))),
        DynSolValue::String(s) => json!(s),
        DynSolValue::Address(a) => json!(a.to_checksum(None)),
        DynSolValue::Function(f) => json!(format!("0x{}", hex::encode(f.as_slice()))),
        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) | DynSolValue::Tuple(vals) => {
            Value::Array(vals.iter().map(to_json).collect())
        }
    }
}

/// Render named outputs as a JSON object; unnamed outputs use their position.
pub fn outputs_to_json(func: &Function, values: &[DynSolValue]) -> Value {
    if values.len() == 1 && func.outputs.first().map_or(true, |p| p.name.is_empty()) {
        return to_json(&values[0]);
    }
    let map = func
        .outputs
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (p, v))| {
            let key = if p.name.is_empty() {
                i.to_string()
            } else {
                p.name.clone()
            };
            (key, to_json(v))
        })
        .collect::<serde_json::Map<_, _>>();
    Value::Object(map)
}
