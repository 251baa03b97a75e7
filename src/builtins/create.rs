//! NFT create: allocate the next nonce of a token identifier and store a
//! fresh non-fungible record with its metadata on the creator's account.
//!
//! Arguments: tokenID, quantity, name, royalties, hash, attributes, then
//! one or more URIs.

use std::sync::Arc;
use std::sync::RwLock;

use num_bigint::BigUint;
use num_traits::Zero;

use super::validation::{account_view, check_nft_action};
use super::{finalize_call, BuiltinFunction, FUNC_NFT_CREATE};
use crate::account::Account;
use crate::config::MAX_ROYALTIES;
use crate::error::{DctError, DctResult};
use crate::gas::{read_cell, write_cell, BaseOperationCost, GasCost};
use crate::guard::RolesHandler;
use crate::token::roles::ROLE_NFT_CREATE;
use crate::token::storage::{get_latest_nonce, save_latest_nonce, token_key, TokenStore};
use crate::token::types::{NftMetadata, TokenRecord};
use crate::vm::{nft_log_entry, u64_from_bytes, CallInput, CallOutput};

const MIN_CREATE_ARGUMENTS: usize = 7;

struct CreateGas {
    base: u64,
    base_op: BaseOperationCost,
}

pub struct DctNftCreate {
    costs: RwLock<CreateGas>,
    store: TokenStore,
    roles_handler: Arc<dyn RolesHandler>,
}

impl DctNftCreate {
    pub fn new(
        func_gas_cost: u64,
        base_op: BaseOperationCost,
        store: TokenStore,
        roles_handler: Arc<dyn RolesHandler>,
    ) -> Self {
        Self {
            costs: RwLock::new(CreateGas {
                base: func_gas_cost,
                base_op,
            }),
            store,
            roles_handler,
        }
    }

    fn execute(&self, sender: Option<&mut Account>, input: &CallInput) -> DctResult<CallOutput> {
        let costs = read_cell(&self.costs);
        check_nft_action(account_view(&sender), input, costs.base)?;
        if input.arguments.len() < MIN_CREATE_ARGUMENTS {
            return Err(DctError::invalid_arguments(
                "expected at least 7 arguments",
            ));
        }

        let token_id = &input.arguments[0];
        let sender = sender.ok_or(DctError::MissingAccount)?;
        self.roles_handler
            .check_allowed_to_execute(sender, token_id, ROLE_NFT_CREATE)?;

        let total_bytes: u64 = input.arguments.iter().map(|a| a.len() as u64).sum();
        let store_gas = total_bytes * costs.base_op.store_per_byte;
        if input.gas_provided < costs.base + store_gas {
            return Err(DctError::NotEnoughGas);
        }

        let quantity = BigUint::from_bytes_be(&input.arguments[1]);
        if quantity.is_zero() {
            return Err(DctError::InvalidNftQuantity);
        }
        let royalties = u64_from_bytes(&input.arguments[3]);
        if royalties > u64::from(MAX_ROYALTIES) {
            return Err(DctError::invalid_arguments("royalties above 10000"));
        }

        let nonce = get_latest_nonce(sender, token_id)?
            .checked_add(1)
            .ok_or_else(|| DctError::invalid_arguments("nonce counter overflow"))?;
        let metadata = NftMetadata {
            nonce,
            name: input.arguments[2].clone(),
            creator: input.caller,
            royalties: royalties as u32,
            hash: input.arguments[4].clone(),
            uris: input.arguments[6..].to_vec(),
            attributes: input.arguments[5].clone(),
        };
        let record = TokenRecord::non_fungible(quantity, metadata);

        self.store.save_nft_record(
            sender,
            &token_key(token_id),
            &record,
            input.return_call_after_error,
        )?;
        save_latest_nonce(sender, token_id, nonce)?;

        let mut output = CallOutput::with_gas(input.gas_provided - costs.base - store_gas);
        output
            .logs
            .push(nft_log_entry(FUNC_NFT_CREATE, input.caller, token_id, nonce));
        Ok(output)
    }
}

impl BuiltinFunction for DctNftCreate {
    fn process(
        &self,
        sender: Option<&mut Account>,
        dest: Option<&mut Account>,
        input: &CallInput,
    ) -> DctResult<CallOutput> {
        finalize_call(sender, dest, |sender, _dest| self.execute(sender, input))
    }

    fn set_new_gas_config(&self, gas_cost: Option<&GasCost>) {
        if let Some(gas_cost) = gas_cost {
            let mut costs = write_cell(&self.costs);
            costs.base = gas_cost.built_in.nft_create;
            costs.base_op = gas_cost.base_op;
        }
    }
}
