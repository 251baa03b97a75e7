//! Multi-asset transfer: move a batch of fungible amounts and NFT
//! quantities to one destination, same-shard or across a shard boundary.
//!
//! Two entry modes share the wire name. When caller and recipient are the
//! same address this is the initiation on the sender's shard: debit the
//! sender, credit a local destination directly, and for a remote one build
//! the forwarded frame that re-enters this builtin on the other side. When
//! they differ, this invocation *is* the cross-shard delivery and only
//! credits the destination: the sender was debited when the frame was
//! built, and the gas was paid there too.

use std::sync::Arc;
use std::sync::RwLock;

use log::debug;
use num_bigint::BigUint;
use num_traits::Zero;

use super::validation::{check_basic_arguments, must_verify_payable};
use super::{finalize_call, BuiltinFunction, FUNC_MULTI_TRANSFER};
use crate::account::{Account, AccountsAdapter};
use crate::config::{ARGUMENTS_PER_TRANSFER, METACHAIN_SHARD_ID};
use crate::error::{DctError, DctResult};
use crate::gas::{read_cell, write_cell, BaseOperationCost, GasCost};
use crate::guard::{check_frozen_and_paused, PayableHandler};
use crate::token::storage::{token_key, TokenStore};
use crate::token::types::TokenRecord;
use crate::vm::{
    add_direct_call, add_forwarded_call, big_to_bytes, nft_log_entry, u64_from_bytes,
    u64_to_bytes, Address, CallInput, CallOutput, EpochProvider, ShardCoordinator,
};

struct MultiTransferGas {
    per_transfer: u64,
    base_op: BaseOperationCost,
}

pub struct DctMultiTransfer {
    costs: RwLock<MultiTransferGas>,
    store: TokenStore,
    payable_handler: RwLock<Arc<dyn PayableHandler>>,
    accounts: Arc<dyn AccountsAdapter>,
    shard_coordinator: Arc<dyn ShardCoordinator>,
    epoch_provider: Arc<dyn EpochProvider>,
    activation_epoch: u32,
}

impl DctMultiTransfer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        func_gas_cost: u64,
        base_op: BaseOperationCost,
        store: TokenStore,
        payable_handler: Arc<dyn PayableHandler>,
        accounts: Arc<dyn AccountsAdapter>,
        shard_coordinator: Arc<dyn ShardCoordinator>,
        epoch_provider: Arc<dyn EpochProvider>,
        activation_epoch: u32,
    ) -> Self {
        Self {
            costs: RwLock::new(MultiTransferGas {
                per_transfer: func_gas_cost,
                base_op,
            }),
            store,
            payable_handler: RwLock::new(payable_handler),
            accounts,
            shard_coordinator,
            epoch_provider,
            activation_epoch,
        }
    }

    /// Install the host's payable check.
    pub fn set_payable_handler(&self, handler: Arc<dyn PayableHandler>) {
        *write_cell(&self.payable_handler) = handler;
    }

    fn execute(
        &self,
        sender: Option<&mut Account>,
        dest: Option<&mut Account>,
        input: &CallInput,
    ) -> DctResult<CallOutput> {
        let costs = read_cell(&self.costs);
        check_basic_arguments(input)?;

        if input.caller == input.recipient {
            return self.process_on_sender_shard(sender, input, &costs);
        }

        // a local account cannot simultaneously be the remote sender
        if sender.is_some() {
            return Err(DctError::InvalidRcvAddr);
        }
        let dest = dest.ok_or(DctError::InvalidRcvAddr)?;
        self.process_on_destination_shard(dest, input)
    }

    // ========================================
    // Same-shard initiation
    // ========================================

    fn process_on_sender_shard(
        &self,
        sender: Option<&mut Account>,
        input: &CallInput,
        costs: &MultiTransferGas,
    ) -> DctResult<CallOutput> {
        let dst_address = Address::from_slice(&input.arguments[0])
            .ok_or_else(|| DctError::invalid_arguments("not a valid destination address"))?;
        if dst_address == input.caller {
            return Err(DctError::invalid_arguments("cannot transfer to self"));
        }
        if self.shard_coordinator.compute_shard(&dst_address) == METACHAIN_SHARD_ID {
            return Err(DctError::InvalidRcvAddr);
        }

        let num_transfers = u64_from_bytes(&input.arguments[1]) as usize;
        if num_transfers == 0 {
            return Err(DctError::invalid_arguments("0 tokens to transfer"));
        }
        let min_arguments = num_transfers
            .checked_mul(ARGUMENTS_PER_TRANSFER)
            .and_then(|v| v.checked_add(2))
            .ok_or_else(|| DctError::invalid_arguments("invalid number of arguments"))?;
        if input.arguments.len() < min_arguments {
            return Err(DctError::invalid_arguments("invalid number of arguments"));
        }

        let transfer_cost = costs
            .per_transfer
            .checked_mul(num_transfers as u64)
            .ok_or(DctError::NotEnoughGas)?;
        if input.gas_provided < transfer_cost {
            return Err(DctError::NotEnoughGas);
        }

        let verify_payable = must_verify_payable(input, min_arguments);
        let sender = sender.ok_or(DctError::MissingAccount)?;
        let mut dst_account = self.load_account_if_in_shard(&dst_address)?;

        let mut output = CallOutput::with_gas(input.gas_provided - transfer_cost);
        let mut transfers: Vec<(Vec<u8>, TokenRecord)> = Vec::with_capacity(num_transfers);
        for i in 0..num_transfers {
            let index = 2 + i * ARGUMENTS_PER_TRANSFER;
            let token_id = &input.arguments[index];
            let nonce = u64_from_bytes(&input.arguments[index + 1]);
            let quantity = BigUint::from_bytes_be(&input.arguments[index + 2]);

            let transferred = self.transfer_one_token_on_sender_shard(
                sender,
                dst_account.as_mut(),
                dst_address,
                token_id,
                nonce,
                &quantity,
                verify_payable,
                input.return_call_after_error,
            )?;

            let mut entry = nft_log_entry(FUNC_MULTI_TRANSFER, input.caller, token_id, nonce);
            entry.topics.push(dst_address.to_vec());
            output.logs.push(entry);
            transfers.push((token_id.clone(), transferred));
        }

        self.create_output_transfers(input, &mut output, &transfers, dst_address, costs)?;

        // persisted last: everything fallible has already passed, so a
        // failed call leaves the destination exactly as loaded
        if let Some(mut dst_account) = dst_account {
            dst_account.commit()?;
            self.accounts.save_account(dst_account)?;
        }

        Ok(output)
    }

    #[allow(clippy::too_many_arguments)]
    fn transfer_one_token_on_sender_shard(
        &self,
        sender: &mut Account,
        dst_account: Option<&mut Account>,
        dst_address: Address,
        token_id: &[u8],
        nonce: u64,
        quantity: &BigUint,
        verify_payable: bool,
        is_return_call_after_error: bool,
    ) -> DctResult<TokenRecord> {
        if quantity.is_zero() {
            return Err(DctError::InvalidNftQuantity);
        }

        let key = token_key(token_id);
        let held = self.store.load_nft_record_on_sender(sender, &key, nonce)?;
        if held.value < *quantity {
            return Err(DctError::InvalidNftQuantity);
        }

        let mut debited = held.clone();
        debited.value -= quantity;
        self.store
            .save_nft_record(sender, &key, &debited, is_return_call_after_error)?;

        let mut transferred = held;
        transferred.value = quantity.clone();

        if let Some(dst_account) = dst_account {
            self.add_to_destination(
                dst_address,
                dst_account,
                &mut transferred,
                &key,
                verify_payable,
                is_return_call_after_error,
            )?;
        }

        Ok(transferred)
    }

    fn load_account_if_in_shard(&self, dst_address: &Address) -> DctResult<Option<Account>> {
        if self.shard_coordinator.self_shard() != self.shard_coordinator.compute_shard(dst_address)
        {
            return Ok(None);
        }
        Ok(Some(self.accounts.load_account(dst_address)?))
    }

    /// Build the forwarded frame: the transfer count, then per asset either
    /// `(tokenID, {0}, quantity)` or `(tokenID, nonce, marshaled record)`.
    /// Metadata rides inside the frame and costs data-copy gas.
    fn create_output_transfers(
        &self,
        input: &CallInput,
        output: &mut CallOutput,
        transfers: &[(Vec<u8>, TokenRecord)],
        dst_address: Address,
        costs: &MultiTransferGas,
    ) -> DctResult<()> {
        let mut frame_args: Vec<Vec<u8>> =
            Vec::with_capacity(transfers.len() * ARGUMENTS_PER_TRANSFER + 1);
        frame_args.push(big_to_bytes(&BigUint::from(transfers.len() as u64)));

        for (token_id, record) in transfers {
            frame_args.push(token_id.clone());
            if record.metadata.is_some() {
                let marshaled = self.store.marshal_record(record)?;
                let copy_gas = marshaled.len() as u64 * costs.base_op.data_copy_per_byte;
                if copy_gas > output.gas_remaining {
                    return Err(DctError::NotEnoughGas);
                }
                output.gas_remaining -= copy_gas;
                frame_args.push(u64_to_bytes(record.nonce()));
                frame_args.push(marshaled);
            } else {
                frame_args.push(vec![0]);
                frame_args.push(big_to_bytes(&record.value));
            }
        }

        let min_arguments = transfers.len() * ARGUMENTS_PER_TRANSFER + 2;
        if input.arguments.len() > min_arguments {
            frame_args.extend(input.arguments[min_arguments..].iter().cloned());
        }
        let sc_call_after =
            input.arguments.len() > min_arguments && dst_address.is_smart_contract();

        if self.shard_coordinator.self_shard()
            != self.shard_coordinator.compute_shard(&dst_address)
        {
            let mut gas_to_transfer = 0;
            if sc_call_after {
                gas_to_transfer = output.gas_remaining;
                output.gas_remaining = 0;
            }
            debug!(
                "forwarding {} assets to {} on shard {}",
                transfers.len(),
                dst_address,
                self.shard_coordinator.compute_shard(&dst_address),
            );
            add_forwarded_call(
                output,
                input.caller,
                dst_address,
                FUNC_MULTI_TRANSFER,
                &frame_args,
                input.gas_locked,
                gas_to_transfer,
                input.call_type,
            );
            return Ok(());
        }

        if sc_call_after {
            let function = &input.arguments[min_arguments];
            let call_args = if input.arguments.len() > min_arguments + 1 {
                &input.arguments[min_arguments + 1..]
            } else {
                &[][..]
            };
            add_direct_call(
                output,
                input.caller,
                dst_address,
                function,
                call_args,
                input.gas_locked,
                input.call_type,
            );
        }
        Ok(())
    }

    // ========================================
    // Cross-shard delivery
    // ========================================

    fn process_on_destination_shard(
        &self,
        dest: &mut Account,
        input: &CallInput,
    ) -> DctResult<CallOutput> {
        let num_transfers = u64_from_bytes(&input.arguments[0]) as usize;
        if num_transfers == 0 {
            return Err(DctError::invalid_arguments("0 tokens to transfer"));
        }
        let min_arguments = num_transfers
            .checked_mul(ARGUMENTS_PER_TRANSFER)
            .and_then(|v| v.checked_add(1))
            .ok_or_else(|| DctError::invalid_arguments("invalid number of arguments"))?;
        if input.arguments.len() < min_arguments {
            return Err(DctError::invalid_arguments("invalid number of arguments"));
        }

        let verify_payable = must_verify_payable(input, min_arguments);

        // the sender paid all gas when the frame was built
        let mut output = CallOutput::with_gas(input.gas_provided);
        for i in 0..num_transfers {
            let index = 1 + i * ARGUMENTS_PER_TRANSFER;
            let token_id = &input.arguments[index];
            let nonce = u64_from_bytes(&input.arguments[index + 1]);
            let key = token_key(token_id);

            if nonce > 0 {
                let mut incoming = self.store.unmarshal_record(&input.arguments[index + 2])?;
                self.add_to_destination(
                    input.recipient,
                    dest,
                    &mut incoming,
                    &key,
                    verify_payable,
                    input.return_call_after_error,
                )?;
            } else {
                let value = BigUint::from_bytes_be(&input.arguments[index + 2]);
                self.store
                    .add_to_balance(dest, &key, &value, input.return_call_after_error)?;
            }

            let mut entry = nft_log_entry(FUNC_MULTI_TRANSFER, input.caller, token_id, nonce);
            entry.topics.push(dest.address().to_vec());
            output.logs.push(entry);
        }

        if input.arguments.len() > min_arguments && input.recipient.is_smart_contract() {
            let function = &input.arguments[min_arguments];
            let call_args = if input.arguments.len() > min_arguments + 1 {
                &input.arguments[min_arguments + 1..]
            } else {
                &[][..]
            };
            add_direct_call(
                &mut output,
                input.caller,
                input.recipient,
                function,
                call_args,
                input.gas_locked,
                input.call_type,
            );
        }

        Ok(output)
    }

    /// Credit one record onto the destination, merging with whatever is
    /// already held at that nonce. Two different NFTs must never collide on
    /// the same nonce, so a content-hash mismatch aborts the call.
    fn add_to_destination(
        &self,
        dst_address: Address,
        dst_account: &mut Account,
        incoming: &mut TokenRecord,
        token_key: &[u8],
        verify_payable: bool,
        is_return_call_after_error: bool,
    ) -> DctResult<()> {
        if verify_payable {
            let payable_handler = read_cell(&self.payable_handler).clone();
            if !payable_handler.is_payable(&dst_address)? {
                return Err(DctError::AccountNotPayable);
            }
        }

        let nonce = incoming.nonce();
        let current = self
            .store
            .load_nft_record_on_destination(dst_account, token_key, nonce)?;
        let empty = TokenRecord::default();
        check_frozen_and_paused(
            dst_account.address(),
            token_key,
            current.as_ref().unwrap_or(&empty),
            self.store.pause_handler(),
            is_return_call_after_error,
        )?;

        if let Some(current) = current {
            if let (Some(held), Some(arrived)) =
                (current.metadata.as_ref(), incoming.metadata.as_ref())
            {
                if held.hash != arrived.hash {
                    return Err(DctError::WrongNftOnDestination);
                }
            }
            incoming.value += &current.value;
        }

        self.store
            .save_nft_record(dst_account, token_key, incoming, is_return_call_after_error)
    }
}

impl BuiltinFunction for DctMultiTransfer {
    fn process(
        &self,
        sender: Option<&mut Account>,
        dest: Option<&mut Account>,
        input: &CallInput,
    ) -> DctResult<CallOutput> {
        finalize_call(sender, dest, |sender, dest| {
            self.execute(sender, dest, input)
        })
    }

    fn set_new_gas_config(&self, gas_cost: Option<&GasCost>) {
        if let Some(gas_cost) = gas_cost {
            let mut costs = write_cell(&self.costs);
            costs.per_transfer = gas_cost.built_in.multi_transfer;
            costs.base_op = gas_cost.base_op;
        }
    }

    fn is_active(&self) -> bool {
        self.epoch_provider.current_epoch() >= self.activation_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::MemAccountsStore;
    use crate::codec::JsonMarshalizer;
    use crate::guard::{DisabledPauseHandler, DisabledPayableCheck};
    use crate::token::storage::nft_key;
    use crate::token::types::NftMetadata;
    use crate::vm::{FixedEpochProvider, ShardId};

    /// Two-shard coordinator keyed on the first address byte.
    struct FirstByteShards {
        self_shard: ShardId,
    }

    impl ShardCoordinator for FirstByteShards {
        fn compute_shard(&self, address: &Address) -> ShardId {
            ShardId::from(address.as_bytes()[0] % 2)
        }

        fn self_shard(&self) -> ShardId {
            self.self_shard
        }
    }

    fn test_store() -> TokenStore {
        TokenStore::new(Arc::new(JsonMarshalizer), Arc::new(DisabledPauseHandler))
    }

    fn transfer_fn(
        accounts: &MemAccountsStore,
        coordinator: Arc<dyn ShardCoordinator>,
        per_transfer: u64,
        data_copy_per_byte: u64,
    ) -> DctMultiTransfer {
        DctMultiTransfer::new(
            per_transfer,
            BaseOperationCost {
                store_per_byte: 0,
                data_copy_per_byte,
            },
            test_store(),
            Arc::new(DisabledPayableCheck),
            Arc::new(accounts.clone()),
            coordinator,
            Arc::new(FixedEpochProvider(0)),
            0,
        )
    }

    fn seed_fungible(accounts: &MemAccountsStore, address: Address, value: u32) {
        let mut account = accounts.account(address);
        test_store()
            .save_record(
                &mut account,
                &token_key(b"TKN-01"),
                &TokenRecord::fungible(BigUint::from(value)),
            )
            .unwrap();
        account.commit().unwrap();
    }

    fn nft_record(nonce: u64, quantity: u32, hash: u8, creator: Address) -> TokenRecord {
        TokenRecord::non_fungible(
            BigUint::from(quantity),
            NftMetadata {
                nonce,
                name: b"piece".to_vec(),
                creator,
                royalties: 100,
                hash: vec![hash; 32],
                uris: vec![b"uri".to_vec()],
                attributes: b"attrs".to_vec(),
            },
        )
    }

    fn seed_nft(accounts: &MemAccountsStore, address: Address, record: &TokenRecord) {
        let mut account = accounts.account(address);
        test_store()
            .save_nft_record(&mut account, &token_key(b"TKN-01"), record, false)
            .unwrap();
        account.commit().unwrap();
    }

    fn initiation_input(caller: Address, dst: Address, triples: &[(&[u8], u64, u32)]) -> CallInput {
        let mut input = CallInput::direct(FUNC_MULTI_TRANSFER, caller, caller);
        input.arguments = vec![dst.to_vec(), u64_to_bytes(triples.len() as u64)];
        for (token_id, nonce, quantity) in triples {
            input.arguments.push(token_id.to_vec());
            input.arguments.push(u64_to_bytes(*nonce));
            input
                .arguments
                .push(big_to_bytes(&BigUint::from(*quantity)));
        }
        input.gas_provided = 100_000;
        input
    }

    #[test]
    fn test_same_shard_fungible_conservation() {
        let accounts = MemAccountsStore::new();
        let sender_addr = Address::new([2u8; 32]);
        let dst_addr = Address::new([4u8; 32]);
        seed_fungible(&accounts, sender_addr, 100);
        seed_fungible(&accounts, dst_addr, 30);

        let transfer = transfer_fn(
            &accounts,
            Arc::new(FirstByteShards { self_shard: 0 }),
            10,
            0,
        );
        let mut sender = accounts.account(sender_addr);
        let input = initiation_input(sender_addr, dst_addr, &[(b"TKN-01", 0, 40)]);
        let output = transfer.process(Some(&mut sender), None, &input).unwrap();
        assert_eq!(output.gas_remaining, 100_000 - 10);
        assert_eq!(output.logs.len(), 1);

        let store = test_store();
        let sender_record = store
            .load_record(&accounts.account(sender_addr), &token_key(b"TKN-01"))
            .unwrap();
        let dst_record = store
            .load_record(&accounts.account(dst_addr), &token_key(b"TKN-01"))
            .unwrap();
        assert_eq!(sender_record.value, BigUint::from(60u32));
        assert_eq!(dst_record.value, BigUint::from(70u32));
        // conserved
        assert_eq!(
            &sender_record.value + &dst_record.value,
            BigUint::from(130u32)
        );
    }

    #[test]
    fn test_same_shard_nft_moves_whole_quantity() {
        let accounts = MemAccountsStore::new();
        let sender_addr = Address::new([2u8; 32]);
        let dst_addr = Address::new([4u8; 32]);
        seed_nft(&accounts, sender_addr, &nft_record(3, 1, 7, sender_addr));

        let transfer = transfer_fn(
            &accounts,
            Arc::new(FirstByteShards { self_shard: 0 }),
            0,
            0,
        );
        let mut sender = accounts.account(sender_addr);
        let input = initiation_input(sender_addr, dst_addr, &[(b"TKN-01", 3, 1)]);
        transfer.process(Some(&mut sender), None, &input).unwrap();

        // drained sender record deleted, destination holds the piece
        assert_eq!(
            accounts.stored_value(&sender_addr, &nft_key(&token_key(b"TKN-01"), 3)),
            None
        );
        let dst_record = test_store()
            .load_nft_record_on_sender(&accounts.account(dst_addr), &token_key(b"TKN-01"), 3)
            .unwrap();
        assert_eq!(dst_record.value, BigUint::from(1u32));
        assert_eq!(dst_record.metadata.unwrap().hash, vec![7u8; 32]);
    }

    #[test]
    fn test_failed_call_persists_nothing() {
        let accounts = MemAccountsStore::new();
        let sender_addr = Address::new([2u8; 32]);
        let dst_addr = Address::new([4u8; 32]);
        seed_fungible(&accounts, sender_addr, 100);

        let transfer = transfer_fn(
            &accounts,
            Arc::new(FirstByteShards { self_shard: 0 }),
            0,
            0,
        );
        let mut sender = accounts.account(sender_addr);
        // second triple references a token the sender does not hold
        let input = initiation_input(
            sender_addr,
            dst_addr,
            &[(b"TKN-01", 0, 50), (b"TKN-02", 0, 10)],
        );
        let err = transfer.process(Some(&mut sender), None, &input).unwrap_err();
        assert_eq!(err, DctError::NftTokenDoesNotExist);

        // the first debit never reached storage
        let sender_record = test_store()
            .load_record(&accounts.account(sender_addr), &token_key(b"TKN-01"))
            .unwrap();
        assert_eq!(sender_record.value, BigUint::from(100u32));
        assert_eq!(
            accounts.stored_value(&dst_addr, &token_key(b"TKN-01")),
            None
        );
    }

    #[test]
    fn test_cross_shard_initiation_builds_frame_and_charges_copy_gas() {
        let accounts = MemAccountsStore::new();
        let sender_addr = Address::new([2u8; 32]); // shard 0
        let dst_addr = Address::new([3u8; 32]); // shard 1
        let record = nft_record(5, 2, 9, sender_addr);
        seed_nft(&accounts, sender_addr, &record);

        let transfer = transfer_fn(
            &accounts,
            Arc::new(FirstByteShards { self_shard: 0 }),
            100,
            1,
        );
        let mut sender = accounts.account(sender_addr);
        let input = initiation_input(sender_addr, dst_addr, &[(b"TKN-01", 5, 2)]);
        let output = transfer.process(Some(&mut sender), None, &input).unwrap();

        // sender fully debited
        assert_eq!(
            accounts.stored_value(&sender_addr, &nft_key(&token_key(b"TKN-01"), 5)),
            None
        );

        // one forwarded frame to the destination
        let transfers = &output.output_accounts[&dst_addr].output_transfers;
        assert_eq!(transfers.len(), 1);
        let data = String::from_utf8(transfers[0].data.clone()).unwrap();
        let mut parser = crate::codec::CallArgsParser::new();
        parser.parse_data(&data).unwrap();
        assert_eq!(parser.function().unwrap(), FUNC_MULTI_TRANSFER);
        let args = parser.arguments().unwrap();
        assert_eq!(args.len(), 4);
        assert_eq!(args[0], vec![1]); // one transfer
        assert_eq!(args[1], b"TKN-01".to_vec());
        assert_eq!(args[2], vec![5]); // nonce
        let carried = test_store().unmarshal_record(&args[3]).unwrap();
        assert_eq!(carried.value, BigUint::from(2u32));

        // copy gas charged for the marshaled record
        assert_eq!(
            output.gas_remaining,
            100_000 - 100 - args[3].len() as u64
        );
    }

    #[test]
    fn test_cross_shard_frame_copy_gas_exhaustion() {
        let accounts = MemAccountsStore::new();
        let sender_addr = Address::new([2u8; 32]);
        let dst_addr = Address::new([3u8; 32]);
        seed_nft(&accounts, sender_addr, &nft_record(5, 2, 9, sender_addr));

        let transfer = transfer_fn(
            &accounts,
            Arc::new(FirstByteShards { self_shard: 0 }),
            100,
            1_000_000,
        );
        let mut sender = accounts.account(sender_addr);
        let input = initiation_input(sender_addr, dst_addr, &[(b"TKN-01", 5, 2)]);
        let err = transfer.process(Some(&mut sender), None, &input).unwrap_err();
        assert_eq!(err, DctError::NotEnoughGas);

        // the debit was rolled back with the rest of the call
        assert!(accounts
            .stored_value(&sender_addr, &nft_key(&token_key(b"TKN-01"), 5))
            .is_some());
    }

    #[test]
    fn test_delivery_merges_same_hash() {
        let accounts = MemAccountsStore::new();
        let caller = Address::new([2u8; 32]);
        let dst_addr = Address::new([3u8; 32]);
        seed_nft(&accounts, dst_addr, &nft_record(5, 1, 9, caller));

        let transfer = transfer_fn(
            &accounts,
            Arc::new(FirstByteShards { self_shard: 1 }),
            0,
            0,
        );
        let incoming = nft_record(5, 2, 9, caller);
        let marshaled = test_store().marshal_record(&incoming).unwrap();

        let mut input = CallInput::direct(FUNC_MULTI_TRANSFER, caller, dst_addr);
        input.arguments = vec![vec![1], b"TKN-01".to_vec(), vec![5], marshaled];
        input.gas_provided = 77;

        let mut dest = accounts.account(dst_addr);
        let output = transfer.process(None, Some(&mut dest), &input).unwrap();
        assert_eq!(output.gas_remaining, 77); // destination pays nothing

        let merged = test_store()
            .load_nft_record_on_sender(&accounts.account(dst_addr), &token_key(b"TKN-01"), 5)
            .unwrap();
        assert_eq!(merged.value, BigUint::from(3u32));
    }

    #[test]
    fn test_delivery_rejects_wrong_hash() {
        let accounts = MemAccountsStore::new();
        let caller = Address::new([2u8; 32]);
        let dst_addr = Address::new([3u8; 32]);
        seed_nft(&accounts, dst_addr, &nft_record(5, 1, 9, caller));

        let transfer = transfer_fn(
            &accounts,
            Arc::new(FirstByteShards { self_shard: 1 }),
            0,
            0,
        );
        let incoming = nft_record(5, 2, 8, caller); // different hash
        let marshaled = test_store().marshal_record(&incoming).unwrap();

        let mut input = CallInput::direct(FUNC_MULTI_TRANSFER, caller, dst_addr);
        input.arguments = vec![vec![1], b"TKN-01".to_vec(), vec![5], marshaled];

        let mut dest = accounts.account(dst_addr);
        let err = transfer.process(None, Some(&mut dest), &input).unwrap_err();
        assert_eq!(err, DctError::WrongNftOnDestination);

        // the held quantity is untouched
        let held = test_store()
            .load_nft_record_on_sender(&accounts.account(dst_addr), &token_key(b"TKN-01"), 5)
            .unwrap();
        assert_eq!(held.value, BigUint::from(1u32));
    }

    #[test]
    fn test_delivery_requires_absent_sender() {
        let accounts = MemAccountsStore::new();
        let caller = Address::new([2u8; 32]);
        let dst_addr = Address::new([3u8; 32]);

        let transfer = transfer_fn(
            &accounts,
            Arc::new(FirstByteShards { self_shard: 1 }),
            0,
            0,
        );
        let mut input = CallInput::direct(FUNC_MULTI_TRANSFER, caller, dst_addr);
        input.arguments = vec![vec![1], b"TKN-01".to_vec(), vec![0], vec![1]];

        let mut sender = accounts.account(caller);
        let mut dest = accounts.account(dst_addr);
        let err = transfer
            .process(Some(&mut sender), Some(&mut dest), &input)
            .unwrap_err();
        assert_eq!(err, DctError::InvalidRcvAddr);
    }

    #[test]
    fn test_initiation_rejections() {
        let accounts = MemAccountsStore::new();
        let sender_addr = Address::new([2u8; 32]);
        seed_fungible(&accounts, sender_addr, 100);
        let transfer = transfer_fn(
            &accounts,
            Arc::new(FirstByteShards { self_shard: 0 }),
            10,
            0,
        );

        // self transfer
        let mut sender = accounts.account(sender_addr);
        let input = initiation_input(sender_addr, sender_addr, &[(b"TKN-01", 0, 1)]);
        let err = transfer.process(Some(&mut sender), None, &input).unwrap_err();
        assert!(matches!(err, DctError::InvalidArguments(_)));

        // zero transfers
        let mut sender = accounts.account(sender_addr);
        let mut input =
            initiation_input(sender_addr, Address::new([4u8; 32]), &[(b"TKN-01", 0, 1)]);
        input.arguments[1] = Vec::new();
        let err = transfer.process(Some(&mut sender), None, &input).unwrap_err();
        assert!(matches!(err, DctError::InvalidArguments(_)));

        // not enough gas for the per-transfer cost
        let mut sender = accounts.account(sender_addr);
        let mut input =
            initiation_input(sender_addr, Address::new([4u8; 32]), &[(b"TKN-01", 0, 1)]);
        input.gas_provided = 9;
        let err = transfer.process(Some(&mut sender), None, &input).unwrap_err();
        assert_eq!(err, DctError::NotEnoughGas);
    }

    #[test]
    fn test_same_shard_contract_destination_with_trailing_call() {
        let accounts = MemAccountsStore::new();
        let sender_addr = Address::new([2u8; 32]);
        let mut dst_bytes = [0u8; 32];
        dst_bytes[30] = 4; // contract-shaped, shard 0
        let dst_addr = Address::new(dst_bytes);
        seed_fungible(&accounts, sender_addr, 100);

        let transfer = transfer_fn(
            &accounts,
            Arc::new(FirstByteShards { self_shard: 0 }),
            10,
            0,
        );
        let mut sender = accounts.account(sender_addr);
        let mut input = initiation_input(sender_addr, dst_addr, &[(b"TKN-01", 0, 5)]);
        input.arguments.push(b"acceptFunds".to_vec());
        input.arguments.push(vec![0x01]);
        input.gas_locked = 33;
        let output = transfer.process(Some(&mut sender), None, &input).unwrap();

        let transfers = &output.output_accounts[&dst_addr].output_transfers;
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].data, b"acceptFunds@01".to_vec());
        assert_eq!(transfers[0].gas_locked, 33);
        // remaining gas moved into the call
        assert_eq!(output.gas_remaining, 0);
        assert_eq!(transfers[0].gas_limit, 100_000 - 10);
    }
}
