mod common;

use alloy_primitives::{Address, Bytes, U256};
use chronoflow_client::{ChronoFlowContracts, Client, ClientError};
use chronoflow_core::{AddressBook, ContractKind, CreateStreamParams, RevertReason};
use chronoflow_deploy::{
    deploy_chronoflow, verify_links, Arg, ArtifactStore, ChronoFlowDeployment, DeployError,
    Executor, ModuleBuilder, RpcDeployer, StepError,
};
use chronoflow_rpc::EthClient;
use common::{SimNode, ALICE, BOB, DEPLOYER};
use std::sync::Arc;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(1);

async fn deploy(node: &Arc<SimNode>) -> ChronoFlowDeployment {
    deploy_with(node, common::artifacts()).await.unwrap()
}

async fn deploy_with(
    node: &Arc<SimNode>,
    artifacts: ArtifactStore,
) -> Result<ChronoFlowDeployment, DeployError> {
    let eth = EthClient::new(node.clone());
    let deployer = RpcDeployer::connect(eth, None, POLL).await?;
    assert_eq!(deployer.account(), DEPLOYER);
    deploy_chronoflow(&Executor::new(artifacts, deployer)).await
}

fn public(node: &Arc<SimNode>, book: &AddressBook) -> ChronoFlowContracts {
    ChronoFlowContracts::new(&Client::public(node.clone()), book)
}

fn wallet(node: &Arc<SimNode>, account: Address, book: &AddressBook) -> ChronoFlowContracts {
    let client = Client::wallet(node.clone(), account).with_poll_interval(POLL);
    ChronoFlowContracts::new(&client, book)
}

#[tokio::test]
async fn deploys_three_distinct_linked_contracts() {
    let node = SimNode::new();
    let deployment = deploy(&node).await;
    let book = deployment.addresses;

    let all = [book.stream_nft, book.core, book.marketplace];
    assert!(all.iter().all(|a| *a != Address::ZERO));
    assert_ne!(book.stream_nft, book.core);
    assert_ne!(book.core, book.marketplace);
    assert_ne!(book.stream_nft, book.marketplace);
    assert_eq!(node.code_at(book.core), Some(ContractKind::Core));

    let contracts = public(&node, &book);
    assert_eq!(contracts.stream_nft.core_contract().await.unwrap(), book.core);
    assert_eq!(contracts.core.stream_nft().await.unwrap(), book.stream_nft);
    assert_eq!(contracts.marketplace.stream_nft().await.unwrap(), book.stream_nft);
    verify_links(&Client::public(node.clone()), &book).await.unwrap();

    assert_eq!(
        deployment.result.contracts["ChronoFlowModule#StreamNFT"],
        book.stream_nft
    );
    assert_eq!(
        deployment.result.calls["ChronoFlowModule#StreamNFT.setCoreContract"],
        deployment.link_tx
    );
}

#[tokio::test]
async fn next_stream_id_needs_no_account() {
    let node = SimNode::new();
    let book = deploy(&node).await.addresses;
    let id = public(&node, &book).core.next_stream_id().await.unwrap();
    assert_eq!(id, U256::from(1));
}

#[tokio::test]
async fn created_stream_reads_back_exactly() {
    let node = SimNode::new();
    let book = deploy(&node).await.addresses;
    let token = Address::repeat_byte(0x70);
    let params = CreateStreamParams {
        recipient: BOB,
        deposit: U256::from(3_600_000u64),
        token,
        start_time: U256::from(1_700_000_000u64),
        stop_time: U256::from(1_700_003_600u64),
    };

    let alice = wallet(&node, ALICE, &book);
    let created = alice.core.create_stream(&params).await.unwrap();
    assert_eq!(created.stream_id, U256::from(1));

    let reader = public(&node, &book);
    let stream = reader.core.streams(created.stream_id).await.unwrap();
    assert_eq!(stream.payer, ALICE);
    assert_eq!(stream.recipient, params.recipient);
    assert_eq!(stream.deposit, params.deposit);
    assert_eq!(stream.token, params.token);
    assert_eq!(stream.start_time, params.start_time);
    assert_eq!(stream.stop_time, params.stop_time);
    assert_eq!(stream.remaining_balance, params.deposit);
    assert_eq!(stream.withdrawn_amount, U256::ZERO);

    assert_eq!(reader.core.next_stream_id().await.unwrap(), U256::from(2));
    assert_eq!(
        reader.stream_nft.owner_of(created.stream_id).await.unwrap(),
        BOB
    );
}

#[tokio::test]
async fn recipient_withdraws_part_of_the_deposit() {
    let node = SimNode::new();
    let book = deploy(&node).await.addresses;
    let params = CreateStreamParams {
        recipient: BOB,
        deposit: U256::from(1_000),
        token: Address::repeat_byte(0x70),
        start_time: U256::from(10),
        stop_time: U256::from(20),
    };
    let id = wallet(&node, ALICE, &book)
        .core
        .create_stream(&params)
        .await
        .unwrap()
        .stream_id;

    let bob = wallet(&node, BOB, &book);
    bob.core
        .withdraw_from_stream(id, U256::from(400))
        .await
        .unwrap();
    let stream = bob.core.streams(id).await.unwrap();
    assert_eq!(stream.withdrawn_amount, U256::from(400));
    assert_eq!(stream.remaining_balance, U256::from(600));

    let err = bob
        .core
        .withdraw_from_stream(id, U256::from(601))
        .await
        .unwrap_err();
    assert_eq!(
        err.revert_reason(),
        Some(&RevertReason::Message(
            "Amount exceeds available balance".into()
        ))
    );
}

#[tokio::test]
async fn invalid_stream_surfaces_revert_message() {
    let node = SimNode::new();
    let book = deploy(&node).await.addresses;
    let err = wallet(&node, ALICE, &book)
        .core
        .create_stream(&CreateStreamParams {
            recipient: BOB,
            deposit: U256::from(1),
            token: Address::repeat_byte(0x70),
            start_time: U256::from(20),
            stop_time: U256::from(10),
        })
        .await
        .unwrap_err();
    match err {
        ClientError::CallReverted {
            contract,
            function,
            reason,
        } => {
            assert_eq!(contract, "ChronoFlowCore");
            assert_eq!(function, "createStream");
            assert_eq!(
                reason,
                RevertReason::Message("Stop time before start time".into())
            );
        }
        other => panic!("unexpected {other}"),
    }
}

#[tokio::test]
async fn custom_error_is_decoded() {
    let node = SimNode::new();
    let book = deploy(&node).await.addresses;
    let err = public(&node, &book)
        .stream_nft
        .owner_of(U256::from(42))
        .await
        .unwrap_err();
    match err.revert_reason() {
        Some(RevertReason::Custom { name, inputs }) => {
            assert_eq!(name, "ERC721NonexistentToken");
            assert_eq!(inputs.len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn listing_through_public_handle_fails_at_call_time() {
    let node = SimNode::new();
    let book = deploy(&node).await.addresses;
    let market = public(&node, &book).marketplace;
    let before = node.requests();

    let err = market
        .list_nft(U256::from(1), U256::from(100))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MissingAccount { .. }), "{err}");
    assert_eq!(node.requests(), before);
}

#[tokio::test]
async fn stream_token_trades_on_the_marketplace() {
    let node = SimNode::new();
    let book = deploy(&node).await.addresses;
    let id = wallet(&node, ALICE, &book)
        .core
        .create_stream(&CreateStreamParams {
            recipient: BOB,
            deposit: U256::from(500),
            token: Address::repeat_byte(0x70),
            start_time: U256::from(1),
            stop_time: U256::from(2),
        })
        .await
        .unwrap()
        .stream_id;

    let bob = wallet(&node, BOB, &book);
    let unapproved = bob
        .marketplace
        .list_nft(id, U256::from(50))
        .await
        .unwrap_err();
    assert!(unapproved.revert_reason().is_some());

    bob.stream_nft.approve(book.marketplace, id).await.unwrap();
    let receipt = bob.marketplace.list_nft(id, U256::from(50)).await.unwrap();
    let events = bob.marketplace.handle().decode_logs(&receipt).unwrap();
    assert_eq!(events[0].event, "Listed");

    let listing = bob.marketplace.listings(id).await.unwrap();
    assert!(listing.is_active());
    assert_eq!(listing.seller, BOB);
    assert_eq!(listing.price, U256::from(50));

    let alice = wallet(&node, ALICE, &book);
    alice.marketplace.buy_nft(id, U256::from(50)).await.unwrap();
    assert_eq!(alice.stream_nft.owner_of(id).await.unwrap(), ALICE);
    assert!(!alice.marketplace.listings(id).await.unwrap().is_active());
}

#[tokio::test]
async fn failed_stage_stops_the_run() {
    let node = SimNode::new();
    // Creation code the node does not recognise is mined with status 0.
    let artifacts = ArtifactStore::from_bytecodes([
        (ContractKind::StreamNft, common::creation_code(ContractKind::StreamNft)),
        (ContractKind::Core, common::creation_code(ContractKind::Core)),
        (ContractKind::Marketplace, Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x09])),
    ]);
    let err = deploy_with(&node, artifacts).await.unwrap_err();
    match &err {
        DeployError::StageFailed {
            stage,
            future,
            source,
            completed,
        } => {
            assert_eq!(*stage, 4);
            assert_eq!(future, "ChronoFlowModule#ChronoFlowMarketplace");
            assert!(matches!(source, StepError::Reverted { .. }));
            let names: Vec<_> = completed.iter().map(|c| c.future.as_str()).collect();
            assert_eq!(
                names,
                vec!["ChronoFlowModule#StreamNFT", "ChronoFlowModule#ChronoFlowCore"]
            );
        }
        other => panic!("unexpected {other}"),
    }
    assert!(err.to_string().contains("already created"));
}

#[tokio::test]
async fn unlinked_nft_fails_the_link_check() {
    let node = SimNode::new();
    let mut m = ModuleBuilder::new("UnlinkedModule");
    let nft = m.contract(ContractKind::StreamNft, [Arg::from(Address::ZERO)]);
    let core = m.contract(ContractKind::Core, [Arg::from(&nft)]);
    let market = m.contract(ContractKind::Marketplace, [Arg::from(&nft)]);
    let module = m.build().unwrap();

    let deployer = RpcDeployer::connect(EthClient::new(node.clone()), None, POLL)
        .await
        .unwrap();
    let result = Executor::new(common::artifacts(), deployer)
        .run(&module)
        .await
        .unwrap();
    assert!(result.calls.is_empty());
    let book = AddressBook {
        stream_nft: result.address(&nft).unwrap(),
        core: result.address(&core).unwrap(),
        marketplace: result.address(&market).unwrap(),
    };

    let err = verify_links(&Client::public(node.clone()), &book)
        .await
        .unwrap_err();
    match err {
        DeployError::LinkMismatch {
            what: "StreamNFT.coreContract",
            expected,
            actual,
        } => {
            assert_eq!(expected, book.core);
            assert_eq!(actual, Address::ZERO);
        }
        other => panic!("unexpected {other}"),
    }

    wallet(&node, DEPLOYER, &book)
        .stream_nft
        .set_core_contract(book.core)
        .await
        .unwrap();
    verify_links(&Client::public(node.clone()), &book).await.unwrap();
}

#[tokio::test]
async fn node_without_accounts_needs_an_explicit_deployer() {
    let node = SimNode::with_accounts(vec![]);
    let err = RpcDeployer::connect(EthClient::new(node.clone()), None, POLL)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::NoAccount));
    assert_eq!(node.requests(), 1);

    let deployer = RpcDeployer::connect(EthClient::new(node.clone()), Some(ALICE), POLL)
        .await
        .unwrap();
    assert_eq!(deployer.account(), ALICE);
    assert_eq!(node.requests(), 1);
}

#[tokio::test]
async fn creation_receipt_without_address_fails_stage_one() {
    let node = SimNode::new();
    node.omit_contract_address();
    let err = deploy_with(&node, common::artifacts()).await.unwrap_err();
    match err {
        DeployError::StageFailed {
            stage,
            source: StepError::NoContractAddress { .. },
            completed,
            ..
        } => {
            assert_eq!(stage, 1);
            assert!(completed.is_empty());
        }
        other => panic!("unexpected {other}"),
    }
}

#[tokio::test]
async fn link_from_a_foreign_account_is_rejected() {
    let node = SimNode::new();
    let book = deploy(&node).await.addresses;
    let err = wallet(&node, ALICE, &book)
        .stream_nft
        .set_core_contract(ALICE)
        .await
        .unwrap_err();
    match err.revert_reason() {
        Some(RevertReason::Custom { name, .. }) => assert_eq!(name, "OwnableUnauthorizedAccount"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        public(&node, &book).stream_nft.core_contract().await.unwrap(),
        book.core
    );
}

#[tokio::test]
async fn deployed_addresses_file_round_trips() {
    let node = SimNode::new();
    let deployment = deploy(&node).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain-31337/deployed_addresses.json");

    deployment.write_addresses(&path).unwrap();
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        raw["ChronoFlowModule#ChronoFlowCore"],
        deployment.addresses.core.to_checksum(None)
    );
    assert_eq!(
        AddressBook::load_deployed(&path).unwrap(),
        deployment.addresses
    );
}
