//! The ChronoFlow deployment.
//!
//! `StreamNFT` and `ChronoFlowCore` each need the other's address. The NFT is
//! created first with the zero address, the core is created with the NFT's
//! address, and the NFT is then pointed at the core with `setCoreContract`.
//! The marketplace only needs the NFT.
//!
//! | stage | step                                         |
//! |-------|----------------------------------------------|
//! | 1     | create `StreamNFT(0x0)`                      |
//! | 2     | create `ChronoFlowCore(StreamNFT)`           |
//! | 3     | `StreamNFT.setCoreContract(ChronoFlowCore)`  |
//! | 4     | create `ChronoFlowMarketplace(StreamNFT)`    |
//! | 5     | return the three addresses                   |

use alloy_primitives::{Address, B256};
use chronoflow_client::{ChronoFlowContracts, Client};
use chronoflow_core::{AddressBook, ContractKind, DeployConfig, NetworkConfig};
use chronoflow_rpc::EthClient;
use std::path::{Path, PathBuf};

use crate::artifacts::ArtifactStore;
use crate::error::DeployError;
use crate::executor::{Deployer, DeploymentResult, Executor, RpcDeployer};
use crate::module::{Arg, ContractFuture, DeploymentModule, ModuleBuilder};

/// Module name used in future ids and the deployed-addresses file.
pub const MODULE_NAME: &str = chronoflow_core::config::DEPLOYMENT_MODULE;

/// The fixed ChronoFlow plan and handles to its three futures.
#[derive(Debug, Clone)]
pub struct ChronoFlowModule {
    pub module: DeploymentModule,
    pub stream_nft: ContractFuture,
    pub core: ContractFuture,
    pub marketplace: ContractFuture,
}

/// Build the four-step ChronoFlow plan.
pub fn chronoflow_module() -> Result<ChronoFlowModule, DeployError> {
    let mut m = ModuleBuilder::new(MODULE_NAME);
    let stream_nft = m.contract(ContractKind::StreamNft, [Arg::from(Address::ZERO)]);
    let core = m.contract(ContractKind::Core, [Arg::from(&stream_nft)]);
    m.call(&stream_nft, "setCoreContract", [Arg::from(&core)]);
    let marketplace = m.contract(ContractKind::Marketplace, [Arg::from(&stream_nft)]);
    Ok(ChronoFlowModule {
        module: m.build()?,
        stream_nft,
        core,
        marketplace,
    })
}

/// Outcome of a successful ChronoFlow deployment.
#[derive(Debug, Clone)]
pub struct ChronoFlowDeployment {
    pub addresses: AddressBook,
    /// Transaction of the `setCoreContract` link.
    pub link_tx: B256,
    pub result: DeploymentResult,
}

impl ChronoFlowDeployment {
    /// Typed handles for the deployed contracts.
    pub fn contracts(&self, client: &Client) -> ChronoFlowContracts {
        ChronoFlowContracts::new(client, &self.addresses)
    }

    /// Write the deployed-addresses file.
    pub fn write_addresses(&self, path: &Path) -> Result<(), DeployError> {
        self.addresses.write_deployed(&self.result.module, path)?;
        tracing::info!(path = %path.display(), "wrote deployed addresses");
        Ok(())
    }
}

/// Conventional location of the deployed-addresses file for `chain_id`.
pub fn default_addresses_path(chain_id: u64) -> PathBuf {
    PathBuf::from(format!(
        "ignition/deployments/chain-{chain_id}/deployed_addresses.json"
    ))
}

/// Run the ChronoFlow plan through `executor`.
pub async fn deploy_chronoflow<D: Deployer>(
    executor: &Executor<D>,
) -> Result<ChronoFlowDeployment, DeployError> {
    let plan = chronoflow_module()?;
    let result = executor.run(&plan.module).await?;

    let address = |f: &ContractFuture| {
        result
            .address(f)
            .ok_or(DeployError::MissingContract(f.kind().name()))
    };
    let addresses = AddressBook {
        stream_nft: address(&plan.stream_nft)?,
        core: address(&plan.core)?,
        marketplace: address(&plan.marketplace)?,
    };
    let link_id = format!("{}.setCoreContract", plan.stream_nft.id());
    let link_tx = *result
        .calls
        .get(&link_id)
        .ok_or(DeployError::MissingContract(ContractKind::StreamNft.name()))?;

    tracing::info!(
        stream_nft = %addresses.stream_nft,
        core = %addresses.core,
        marketplace = %addresses.marketplace,
        "ChronoFlow deployment completed"
    );
    Ok(ChronoFlowDeployment {
        addresses,
        link_tx,
        result,
    })
}

/// Read back the cross-contract references and check they agree with `book`.
///
/// `StreamNFT.coreContract()` must be the core (the stage 3 link), and both
/// `ChronoFlowCore.streamNFT()` and `ChronoFlowMarketplace.streamNFT()` must
/// be the NFT.
pub async fn verify_links(client: &Client, book: &AddressBook) -> Result<(), DeployError> {
    let contracts = ChronoFlowContracts::new(client, book);
    let check = |what: &'static str, expected: Address, actual: Address| {
        if expected == actual {
            Ok(())
        } else {
            Err(DeployError::LinkMismatch {
                what,
                expected,
                actual,
            })
        }
    };
    check(
        "StreamNFT.coreContract",
        book.core,
        contracts.stream_nft.core_contract().await?,
    )?;
    check(
        "ChronoFlowCore.streamNFT",
        book.stream_nft,
        contracts.core.stream_nft().await?,
    )?;
    check(
        "ChronoFlowMarketplace.streamNFT",
        book.stream_nft,
        contracts.marketplace.stream_nft().await?,
    )?;
    tracing::debug!("contract links verified");
    Ok(())
}

/// Deploy to `network` over HTTP using `config`, verify the links and write
/// the addresses file when `config.addresses_out` is set.
pub async fn deploy_network(
    network: &NetworkConfig,
    config: &DeployConfig,
) -> Result<ChronoFlowDeployment, DeployError> {
    let eth = EthClient::http(network.rpc_url.clone())?;
    let artifacts = ArtifactStore::from_dir(&config.artifacts_dir)?;
    let deployer = RpcDeployer::connect(eth.clone(), config.from, config.poll_interval()).await?;
    let account = deployer.account();

    tracing::info!(
        network = %network.name,
        url = %network.rpc_url,
        artifacts = artifacts.len(),
        "starting deployment"
    );
    let deployment = deploy_chronoflow(&Executor::new(artifacts, deployer)).await?;

    let client = Client::from_eth(eth, Some(account)).with_poll_interval(config.poll_interval());
    verify_links(&client, &deployment.addresses).await?;

    if let Some(path) = &config.addresses_out {
        deployment.write_addresses(path)?;
    }
    Ok(deployment)
}
