//! chronoflow-client: bind a network client to a ChronoFlow interface.
//!
//! A [`Client`] is either public (read-only) or wallet-bound (carries the
//! node-managed account that signs writes). Binding it to an interface and
//! an address yields a [`ContractHandle`]; the typed wrappers in
//! [`contracts`] expose one method per ABI function.
//!
//! Nothing is validated when a handle is built. A wrong address, a stale
//! interface or a missing account only shows up when a call is made.
//!
//! # Quick start
//! ```rust,no_run
//! use chronoflow_client::{chrono_flow_core, Client};
//! use chronoflow_core::NetworkConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let network = NetworkConfig::somnia_testnet();
//! let client = Client::connect(&network)?;
//! let core = chrono_flow_core(&client, &network.address_book()?);
//! println!("next stream id: {}", core.next_stream_id().await?);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod contracts;
pub mod error;
pub mod handle;

pub use client::Client;
pub use contracts::{
    chrono_flow_core, chrono_flow_core_at, marketplace, marketplace_at, stream_nft, stream_nft_at,
    ChronoFlowContracts, ChronoFlowCore, CreatedStream, Marketplace, StreamNft,
};
pub use error::ClientError;
pub use handle::{ContractHandle, PendingTransaction};
