//! End-to-end catalogue scenarios over in-memory accounts: two simulated
//! shards, a registry on each, and the forwarded frames carried by hand
//! from one to the other the way the ledger layer would.

use std::sync::Arc;

use num_bigint::BigUint;

use dct_vm_common::builtins::{
    ActivationEpochs, BuiltinRegistry, RegistryArgs, FUNC_FREEZE, FUNC_LOCAL_BURN,
    FUNC_LOCAL_MINT, FUNC_MULTI_TRANSFER, FUNC_NFT_CREATE, FUNC_NFT_CREATE_ROLE_TRANSFER,
    FUNC_NFT_UPDATE_ATTRIBUTES, FUNC_WIPE,
};
use dct_vm_common::codec::CallArgsParser;
use dct_vm_common::config::TOKEN_SYSTEM_SC_ADDRESS;
use dct_vm_common::guard::{DisabledPauseHandler, StorageRolesHandler};
use dct_vm_common::token::roles::{
    load_roles, save_roles, ROLE_LOCAL_BURN, ROLE_LOCAL_MINT, ROLE_NFT_CREATE,
    ROLE_NFT_UPDATE_ATTRIBUTES,
};
use dct_vm_common::token::storage::{get_latest_nonce, token_key, TokenStore};
use dct_vm_common::token::types::RoleSet;
use dct_vm_common::vm::{big_to_bytes, u64_to_bytes, CallType, EpochProvider, ShardCoordinator};
use dct_vm_common::{
    Address, BuiltInCost, CallInput, DctError, GasCost, JsonMarshalizer, MemAccountsStore,
    ShardId,
};

const TOKEN: &[u8] = b"ART-7f3a9c";

/// Addresses map onto two shards by their first byte.
struct TwoShards {
    self_shard: ShardId,
}

impl ShardCoordinator for TwoShards {
    fn compute_shard(&self, address: &Address) -> ShardId {
        ShardId::from(address.as_bytes()[0] % 2)
    }

    fn self_shard(&self) -> ShardId {
        self.self_shard
    }
}

struct EpochZero;

impl EpochProvider for EpochZero {
    fn current_epoch(&self) -> u32 {
        0
    }
}

fn gas_cost() -> GasCost {
    GasCost {
        built_in: BuiltInCost {
            local_mint: 20,
            local_burn: 50,
            nft_create: 100,
            nft_update_attributes: 80,
            multi_transfer: 200,
        },
        base_op: dct_vm_common::BaseOperationCost {
            store_per_byte: 1,
            data_copy_per_byte: 1,
        },
    }
}

fn registry_for(accounts: &MemAccountsStore, self_shard: ShardId) -> BuiltinRegistry {
    let marshalizer = Arc::new(JsonMarshalizer);
    BuiltinRegistry::new(RegistryArgs {
        gas_cost: gas_cost(),
        marshalizer: marshalizer.clone(),
        pause_handler: Arc::new(DisabledPauseHandler),
        roles_handler: Arc::new(StorageRolesHandler::new(marshalizer)),
        accounts: Arc::new(accounts.clone()),
        shard_coordinator: Arc::new(TwoShards { self_shard }),
        epoch_provider: Arc::new(EpochZero),
        activation_epochs: ActivationEpochs::default(),
    })
}

fn test_store() -> TokenStore {
    TokenStore::new(Arc::new(JsonMarshalizer), Arc::new(DisabledPauseHandler))
}

fn grant_all_roles(accounts: &MemAccountsStore, address: Address) {
    let mut account = accounts.account(address);
    let mut roles = RoleSet::default();
    roles.grant(ROLE_LOCAL_MINT);
    roles.grant(ROLE_LOCAL_BURN);
    roles.grant(ROLE_NFT_CREATE);
    roles.grant(ROLE_NFT_UPDATE_ATTRIBUTES);
    save_roles(&JsonMarshalizer, &mut account, TOKEN, &roles).unwrap();
    account.commit().unwrap();
}

fn self_call(function: &str, caller: Address, arguments: Vec<Vec<u8>>, gas: u64) -> CallInput {
    let mut input = CallInput::direct(function, caller, caller);
    input.arguments = arguments;
    input.gas_provided = gas;
    input
}

#[test]
fn test_mint_burn_lifecycle() {
    let accounts = MemAccountsStore::new();
    let user = Address::new([2u8; 32]);
    grant_all_roles(&accounts, user);
    let registry = registry_for(&accounts, 0);

    let mut account = accounts.account(user);
    let input = self_call(
        FUNC_LOCAL_MINT,
        user,
        vec![TOKEN.to_vec(), big_to_bytes(&BigUint::from(1_000u32))],
        500,
    );
    let output = registry
        .process_builtin(Some(&mut account), None, &input)
        .unwrap();
    assert_eq!(output.gas_remaining, 480);

    let input = self_call(FUNC_LOCAL_BURN, user, vec![TOKEN.to_vec(), vec![1]], 500);
    let output = registry
        .process_builtin(Some(&mut account), None, &input)
        .unwrap();
    assert_eq!(output.gas_remaining, 450);

    let record = test_store()
        .load_record(&accounts.account(user), &token_key(TOKEN))
        .unwrap();
    assert_eq!(record.value, BigUint::from(999u32));
}

#[test]
fn test_freeze_wipe_lifecycle() {
    let accounts = MemAccountsStore::new();
    let user = Address::new([2u8; 32]);
    grant_all_roles(&accounts, user);
    let registry = registry_for(&accounts, 0);

    let mut account = accounts.account(user);
    let mint = self_call(
        FUNC_LOCAL_MINT,
        user,
        vec![TOKEN.to_vec(), vec![100]],
        500,
    );
    registry
        .process_builtin(Some(&mut account), None, &mint)
        .unwrap();

    // wiping before freezing must fail
    let mut wipe = CallInput::direct(FUNC_WIPE, TOKEN_SYSTEM_SC_ADDRESS, user);
    wipe.arguments = vec![TOKEN.to_vec()];
    let err = registry
        .process_builtin(None, Some(&mut account), &wipe)
        .unwrap_err();
    assert_eq!(err, DctError::CannotWipeAccountNotFrozen);

    let mut freeze = CallInput::direct(FUNC_FREEZE, TOKEN_SYSTEM_SC_ADDRESS, user);
    freeze.arguments = vec![TOKEN.to_vec()];
    registry
        .process_builtin(None, Some(&mut account), &freeze)
        .unwrap();

    registry
        .process_builtin(None, Some(&mut account), &wipe)
        .unwrap();
    assert_eq!(accounts.stored_value(&user, &token_key(TOKEN)), None);
}

#[test]
fn test_nft_create_update_and_cross_shard_transfer() {
    let shard0 = MemAccountsStore::new();
    let shard1 = MemAccountsStore::new();
    let creator = Address::new([2u8; 32]); // shard 0
    let collector = Address::new([3u8; 32]); // shard 1
    grant_all_roles(&shard0, creator);

    let registry0 = registry_for(&shard0, 0);
    let registry1 = registry_for(&shard1, 1);

    // mint a fungible balance and create an NFT on shard 0
    let mut creator_account = shard0.account(creator);
    registry0
        .process_builtin(
            Some(&mut creator_account),
            None,
            &self_call(
                FUNC_LOCAL_MINT,
                creator,
                vec![TOKEN.to_vec(), big_to_bytes(&BigUint::from(100u32))],
                10_000,
            ),
        )
        .unwrap();

    let create = self_call(
        FUNC_NFT_CREATE,
        creator,
        vec![
            TOKEN.to_vec(),
            vec![3], // quantity
            b"three of three".to_vec(),
            vec![0x01, 0xf4], // 5% royalties
            vec![0xab; 32],
            b"edition:3".to_vec(),
            b"ipfs://piece".to_vec(),
        ],
        10_000,
    );
    registry0
        .process_builtin(Some(&mut creator_account), None, &create)
        .unwrap();
    assert_eq!(get_latest_nonce(&creator_account, TOKEN).unwrap(), 1);

    // retouch the attributes before shipping
    let update = self_call(
        FUNC_NFT_UPDATE_ATTRIBUTES,
        creator,
        vec![TOKEN.to_vec(), vec![1], b"edition:3;signed".to_vec()],
        10_000,
    );
    registry0
        .process_builtin(Some(&mut creator_account), None, &update)
        .unwrap();

    // send 40 fungible units and 2 of the NFT across the shard boundary
    let initiation = self_call(
        FUNC_MULTI_TRANSFER,
        creator,
        vec![
            collector.to_vec(),
            vec![2],
            TOKEN.to_vec(),
            Vec::new(),
            big_to_bytes(&BigUint::from(40u32)),
            TOKEN.to_vec(),
            vec![1],
            vec![2],
        ],
        100_000,
    );
    let output = registry0
        .process_builtin(Some(&mut creator_account), None, &initiation)
        .unwrap();

    // sender-side state after the debit
    let store = test_store();
    let creator_view = shard0.account(creator);
    assert_eq!(
        store
            .load_record(&creator_view, &token_key(TOKEN))
            .unwrap()
            .value,
        BigUint::from(60u32)
    );
    assert_eq!(
        store
            .load_nft_record_on_sender(&creator_view, &token_key(TOKEN), 1)
            .unwrap()
            .value,
        BigUint::from(1u32)
    );

    // carry the forwarded frame to shard 1 the way the protocol would
    let transfers = &output.output_accounts[&collector].output_transfers;
    assert_eq!(transfers.len(), 1);
    let mut parser = CallArgsParser::new();
    parser
        .parse_data(&String::from_utf8(transfers[0].data.clone()).unwrap())
        .unwrap();
    assert_eq!(parser.function().unwrap(), FUNC_MULTI_TRANSFER);

    let mut delivery = CallInput::direct(FUNC_MULTI_TRANSFER, creator, collector);
    delivery.arguments = parser.arguments().unwrap().to_vec();
    delivery.gas_provided = transfers[0].gas_limit;
    delivery.call_type = CallType::AsynchronousCall;

    let mut collector_account = shard1.account(collector);
    registry1
        .process_builtin(None, Some(&mut collector_account), &delivery)
        .unwrap();

    // quantities conserved per (tokenID, nonce) across the boundary
    let collector_view = shard1.account(collector);
    assert_eq!(
        store
            .load_record(&collector_view, &token_key(TOKEN))
            .unwrap()
            .value,
        BigUint::from(40u32)
    );
    let delivered = store
        .load_nft_record_on_sender(&collector_view, &token_key(TOKEN), 1)
        .unwrap();
    assert_eq!(delivered.value, BigUint::from(2u32));
    let metadata = delivered.metadata.unwrap();
    assert_eq!(metadata.creator, creator);
    assert_eq!(metadata.attributes, b"edition:3;signed".to_vec());
    assert_eq!(metadata.hash, vec![0xab; 32]);
}

#[test]
fn test_create_role_hand_off_across_shards() {
    let shard0 = MemAccountsStore::new();
    let shard1 = MemAccountsStore::new();
    let current = Address::new([2u8; 32]); // shard 0
    let next = Address::new([3u8; 32]); // shard 1
    grant_all_roles(&shard0, current);

    let registry0 = registry_for(&shard0, 0);
    let registry1 = registry_for(&shard1, 1);

    // give the current holder a nonce history
    let mut holder = shard0.account(current);
    registry0
        .process_builtin(
            Some(&mut holder),
            None,
            &self_call(
                FUNC_NFT_CREATE,
                current,
                vec![
                    TOKEN.to_vec(),
                    vec![1],
                    b"first".to_vec(),
                    vec![0],
                    vec![0xcd; 32],
                    Vec::new(),
                    b"uri".to_vec(),
                ],
                10_000,
            ),
        )
        .unwrap();
    assert_eq!(get_latest_nonce(&holder, TOKEN).unwrap(), 1);

    // phase one: the system SC strips the role on shard 0
    let mut hand_off = CallInput::direct(
        FUNC_NFT_CREATE_ROLE_TRANSFER,
        TOKEN_SYSTEM_SC_ADDRESS,
        current,
    );
    hand_off.arguments = vec![TOKEN.to_vec(), next.to_vec()];
    let output = registry0
        .process_builtin(None, Some(&mut holder), &hand_off)
        .unwrap();

    assert_eq!(get_latest_nonce(&holder, TOKEN).unwrap(), 0);
    assert!(!load_roles(&JsonMarshalizer, &holder, TOKEN)
        .unwrap()
        .contains(ROLE_NFT_CREATE));

    // phase two: replay the forwarded frame on shard 1
    let frame = &output.output_accounts[&next].output_transfers[0];
    let mut parser = CallArgsParser::new();
    parser
        .parse_data(&String::from_utf8(frame.data.clone()).unwrap())
        .unwrap();
    let mut apply = CallInput::direct(parser.function().unwrap(), current, next);
    apply.arguments = parser.arguments().unwrap().to_vec();

    let mut gaining = shard1.account(next);
    registry1
        .process_builtin(None, Some(&mut gaining), &apply)
        .unwrap();

    assert_eq!(get_latest_nonce(&gaining, TOKEN).unwrap(), 1);
    assert!(load_roles(&JsonMarshalizer, &gaining, TOKEN)
        .unwrap()
        .contains(ROLE_NFT_CREATE));

    // the new holder continues the sequence without reusing nonce 1
    grant_all_roles(&shard1, next);
    let create = self_call(
        FUNC_NFT_CREATE,
        next,
        vec![
            TOKEN.to_vec(),
            vec![1],
            b"second".to_vec(),
            vec![0],
            vec![0xef; 32],
            Vec::new(),
            b"uri".to_vec(),
        ],
        10_000,
    );
    let mut gaining = shard1.account(next);
    registry1
        .process_builtin(Some(&mut gaining), None, &create)
        .unwrap();
    assert_eq!(get_latest_nonce(&gaining, TOKEN).unwrap(), 2);
}

#[test]
fn test_nonce_bytes_in_role_frame() {
    // the forwarded nonce is minimal big-endian, round-tripping through hex
    assert_eq!(u64_to_bytes(0), Vec::<u8>::new());
    assert_eq!(u64_to_bytes(256), vec![1, 0]);
}
