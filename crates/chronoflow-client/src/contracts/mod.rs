//! Client factory: typed handles for the three ChronoFlow contracts.
//!
//! Each factory binds a [`Client`] to one interface from the registry and the
//! address recorded for it in an [`AddressBook`]. The `*_at` variants take
//! an explicit address instead.

mod core_contract;
mod marketplace;
mod stream_nft;

pub use self::core_contract::{ChronoFlowCore, CreatedStream};
pub use self::marketplace::Marketplace;
pub use self::stream_nft::StreamNft;

use alloy_primitives::Address;
use chronoflow_core::{AddressBook, ContractKind};

use crate::client::Client;
use crate::handle::ContractHandle;

/// `StreamNFT` handle at the address in `book`.
pub fn stream_nft(client: &Client, book: &AddressBook) -> StreamNft {
    StreamNft::at(client.clone(), book.get(ContractKind::StreamNft))
}

/// `ChronoFlowCore` handle at the address in `book`.
pub fn chrono_flow_core(client: &Client, book: &AddressBook) -> ChronoFlowCore {
    ChronoFlowCore::at(client.clone(), book.get(ContractKind::Core))
}

/// `ChronoFlowMarketplace` handle at the address in `book`.
pub fn marketplace(client: &Client, book: &AddressBook) -> Marketplace {
    Marketplace::at(client.clone(), book.get(ContractKind::Marketplace))
}

pub fn stream_nft_at(client: &Client, address: Address) -> StreamNft {
    StreamNft::at(client.clone(), address)
}

pub fn chrono_flow_core_at(client: &Client, address: Address) -> ChronoFlowCore {
    ChronoFlowCore::at(client.clone(), address)
}

pub fn marketplace_at(client: &Client, address: Address) -> Marketplace {
    Marketplace::at(client.clone(), address)
}

/// Untyped handle for any registered contract.
pub fn handle(client: &Client, kind: ContractKind, book: &AddressBook) -> ContractHandle {
    ContractHandle::new(client.clone(), kind, book.get(kind))
}

/// All three handles sharing one client.
#[derive(Debug, Clone)]
pub struct ChronoFlowContracts {
    pub stream_nft: StreamNft,
    pub core: ChronoFlowCore,
    pub marketplace: Marketplace,
}

impl ChronoFlowContracts {
    pub fn new(client: &Client, book: &AddressBook) -> Self {
        Self {
            stream_nft: stream_nft(client, book),
            core: chrono_flow_core(client, book),
            marketplace: marketplace(client, book),
        }
    }

    pub fn address_book(&self) -> AddressBook {
        AddressBook {
            stream_nft: self.stream_nft.address(),
            core: self.core.address(),
            marketplace: self.marketplace.address(),
        }
    }
}
