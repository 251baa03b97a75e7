//! NFT create-role transfer: move the right to create new nonces of a
//! token from one account to another, across shards if needed.
//!
//! Role state is shard-local, so the move runs in two phases. The shard
//! losing the role (entered by the token system SC) zeroes its latest-nonce
//! counter and strips the role; the shard gaining it applies the forwarded
//! nonce and grants the role. When both accounts live on the same shard the
//! second phase is applied directly and the forwarded frame still goes out
//! so the ledger layer records the hand-off.

use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;

use super::validation::check_basic_arguments;
use super::{finalize_call, BuiltinFunction, FUNC_NFT_CREATE_ROLE_TRANSFER};
use crate::account::{Account, AccountsAdapter};
use crate::codec::{encode_call_data, Marshalizer};
use crate::config::TOKEN_SYSTEM_SC_ADDRESS;
use crate::error::{DctError, DctResult};
use crate::token::roles::{load_roles, save_roles, ROLE_NFT_CREATE};
use crate::token::storage::{get_latest_nonce, save_latest_nonce};
use crate::vm::{
    u64_from_bytes, u64_to_bytes, Address, CallInput, CallOutput, CallType, OutputTransfer,
    ShardCoordinator,
};

pub struct DctNftCreateRoleTransfer {
    marshalizer: Arc<dyn Marshalizer>,
    accounts: Arc<dyn AccountsAdapter>,
    shard_coordinator: Arc<dyn ShardCoordinator>,
}

impl DctNftCreateRoleTransfer {
    pub fn new(
        marshalizer: Arc<dyn Marshalizer>,
        accounts: Arc<dyn AccountsAdapter>,
        shard_coordinator: Arc<dyn ShardCoordinator>,
    ) -> Self {
        Self {
            marshalizer,
            accounts,
            shard_coordinator,
        }
    }

    fn execute(
        &self,
        sender: Option<&mut Account>,
        dest: Option<&mut Account>,
        input: &CallInput,
    ) -> DctResult<CallOutput> {
        check_basic_arguments(input)?;
        if sender.is_some() {
            return Err(DctError::invalid_arguments(
                "sender account must not be local",
            ));
        }
        let dest = dest.ok_or(DctError::MissingAccount)?;

        if input.caller == TOKEN_SYSTEM_SC_ADDRESS {
            self.transfer_at_current_owner(dest, input)
        } else {
            self.transfer_at_next_owner(dest, input)
        }
    }

    /// Phase one, on the shard losing the role.
    fn transfer_at_current_owner(
        &self,
        dest: &mut Account,
        input: &CallInput,
    ) -> DctResult<CallOutput> {
        if input.arguments.len() != 2 {
            return Err(DctError::invalid_arguments("expected exactly 2 arguments"));
        }
        let token_id = &input.arguments[0];
        let destination = Address::from_slice(&input.arguments[1])
            .ok_or_else(|| DctError::invalid_arguments("malformed destination address"))?;

        let nonce = get_latest_nonce(dest, token_id)?;
        save_latest_nonce(dest, token_id, 0)?;
        self.revoke_create_role(dest, token_id)?;

        if self.shard_coordinator.compute_shard(&destination)
            == self.shard_coordinator.self_shard()
        {
            let mut new_owner = self.accounts.load_account(&destination)?;
            save_latest_nonce(&mut new_owner, token_id, nonce)?;
            self.grant_create_role(&mut new_owner, token_id)?;
            new_owner.commit()?;
            self.accounts.save_account(new_owner)?;
        }

        let mut output = CallOutput::default();
        let frame = encode_call_data(
            FUNC_NFT_CREATE_ROLE_TRANSFER,
            &[token_id.clone(), u64_to_bytes(nonce)],
        );
        output
            .output_accounts
            .entry(destination)
            .or_default()
            .output_transfers
            .push(OutputTransfer {
                value: BigUint::zero(),
                gas_limit: 0,
                gas_locked: 0,
                data: frame.into_bytes(),
                call_type: CallType::DirectCall,
                sender: input.caller,
            });
        Ok(output)
    }

    /// Phase two, on the shard gaining the role.
    fn transfer_at_next_owner(
        &self,
        dest: &mut Account,
        input: &CallInput,
    ) -> DctResult<CallOutput> {
        if input.arguments.len() != 2 {
            return Err(DctError::invalid_arguments("expected exactly 2 arguments"));
        }
        let token_id = &input.arguments[0];
        let nonce = u64_from_bytes(&input.arguments[1]);

        save_latest_nonce(dest, token_id, nonce)?;
        self.grant_create_role(dest, token_id)?;
        Ok(CallOutput::default())
    }

    fn revoke_create_role(&self, account: &mut Account, token_id: &[u8]) -> DctResult<()> {
        let mut roles = load_roles(self.marshalizer.as_ref(), account, token_id)?;
        roles.revoke(ROLE_NFT_CREATE);
        save_roles(self.marshalizer.as_ref(), account, token_id, &roles)
    }

    fn grant_create_role(&self, account: &mut Account, token_id: &[u8]) -> DctResult<()> {
        let mut roles = load_roles(self.marshalizer.as_ref(), account, token_id)?;
        if roles.contains(ROLE_NFT_CREATE) {
            return Ok(());
        }
        roles.grant(ROLE_NFT_CREATE);
        save_roles(self.marshalizer.as_ref(), account, token_id, &roles)
    }
}

impl BuiltinFunction for DctNftCreateRoleTransfer {
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
}
