//! `chronoflow interface | read | write`: generic access to any entry point.

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Context, Result};
use chronoflow_client::{Client, ContractHandle};
use chronoflow_core::codec::{self, DecodedLog};
use chronoflow_core::{ContractKind, Direction, NetworkConfig};
use serde_json::{json, Value};

/// Print the entry points of `kind`, or its raw ABI with `--json`.
pub fn interface(kind: ContractKind, as_json: bool) -> Result<()> {
    let iface = kind.interface();
    if as_json {
        println!("{}", serde_json::to_string_pretty(iface.abi())?);
        return Ok(());
    }
    println!("{}", kind.name());
    let entries = iface.entry_points();
    if let Some(ctor) = entries.iter().find(|e| e.direction == Direction::Constructor) {
        println!("  {ctor}");
    }
    for (heading, direction) in [
        ("queries", Direction::Query),
        ("actions", Direction::Action),
        ("events", Direction::Event),
        ("errors", Direction::Error),
    ] {
        println!("  {heading}:");
        for entry in entries.iter().filter(|e| e.direction == direction) {
            println!("    {entry}");
        }
    }
    Ok(())
}

fn handle(
    network: &NetworkConfig,
    kind: ContractKind,
    address: Option<Address>,
    from: Option<Address>,
) -> Result<ContractHandle> {
    let address = match address {
        Some(a) => a,
        None => network.address_book()?.get(kind),
    };
    let client = match from {
        Some(account) => Client::connect_wallet(network, account)?,
        None => Client::connect(network)?,
    };
    Ok(ContractHandle::new(client, kind, address))
}

/// Call a read-only function and print its outputs as JSON.
pub async fn read(
    network: &NetworkConfig,
    kind: ContractKind,
    function: &str,
    args: &[String],
    address: Option<Address>,
) -> Result<()> {
    let handle = handle(network, kind, address, None)?;
    let func = handle.interface().function(function, args.len())?;
    let values = codec::coerce_args(func, args)?;
    let outputs = handle
        .read(function, &values)
        .await
        .with_context(|| format!("{kind}.{function} at {}", handle.address()))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&codec::outputs_to_json(func, &outputs))?
    );
    Ok(())
}

/// Send a transaction, wait for it and print the receipt with decoded events.
pub async fn write(
    network: &NetworkConfig,
    kind: ContractKind,
    function: &str,
    args: &[String],
    address: Option<Address>,
    from: Address,
    value: Option<U256>,
) -> Result<()> {
    let handle = handle(network, kind, address, Some(from))?;
    let func = handle.interface().function(function, args.len())?;
    let values = codec::coerce_args(func, args)?;

    let pending = match value {
        Some(v) => handle.write_payable(function, &values, v).await,
        None => handle.write(function, &values).await,
    }
    .with_context(|| format!("{kind}.{function} at {}", handle.address()))?;
    eprintln!("sent {}", pending.hash());

    let receipt = pending.confirm().await?;
    let events = handle.decode_logs(&receipt)?;
    let out = json!({
        "transactionHash": receipt.transaction_hash,
        "blockNumber": receipt.block_number,
        "events": events.iter().map(event_json).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn event_json(log: &DecodedLog) -> Value {
    let fields: serde_json::Map<String, Value> = log
        .fields
        .iter()
        .map(|(name, v)| (name.clone(), codec::to_json(v)))
        .collect();
    json!({ "event": log.event, "fields": fields })
}

/// `"1.5"`-style amounts are not accepted; wei only.
pub fn parse_wei(raw: &str) -> Result<U256> {
    raw.parse::<U256>()
        .map_err(|e| anyhow!("invalid wei amount '{raw}': {e}"))
}
