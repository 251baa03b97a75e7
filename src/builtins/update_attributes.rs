//! NFT attribute update: overwrite the one mutable metadata field of an
//! NFT the caller holds. Feature-gated by activation epoch.

use std::sync::Arc;
use std::sync::RwLock;

use super::validation::{account_view, check_nft_action};
use super::{finalize_call, BuiltinFunction, FUNC_NFT_UPDATE_ATTRIBUTES};
use crate::account::Account;
use crate::error::{DctError, DctResult};
use crate::gas::{read_cell, write_cell, BaseOperationCost, GasCost};
use crate::guard::RolesHandler;
use crate::token::roles::ROLE_NFT_UPDATE_ATTRIBUTES;
use crate::token::storage::{token_key, TokenStore};
use crate::vm::{nft_log_entry, u64_from_bytes, CallInput, CallOutput, EpochProvider};

struct UpdateGas {
    base: u64,
    base_op: BaseOperationCost,
}

pub struct DctNftUpdateAttributes {
    costs: RwLock<UpdateGas>,
    store: TokenStore,
    roles_handler: Arc<dyn RolesHandler>,
    epoch_provider: Arc<dyn EpochProvider>,
    activation_epoch: u32,
}

impl DctNftUpdateAttributes {
    pub fn new(
        func_gas_cost: u64,
        base_op: BaseOperationCost,
        store: TokenStore,
        roles_handler: Arc<dyn RolesHandler>,
        epoch_provider: Arc<dyn EpochProvider>,
        activation_epoch: u32,
    ) -> Self {
        Self {
            costs: RwLock::new(UpdateGas {
                base: func_gas_cost,
                base_op,
            }),
            store,
            roles_handler,
            epoch_provider,
            activation_epoch,
        }
    }

    fn execute(&self, sender: Option<&mut Account>, input: &CallInput) -> DctResult<CallOutput> {
        let costs = read_cell(&self.costs);
        check_nft_action(account_view(&sender), input, costs.base)?;
        if input.arguments.len() != 3 {
            return Err(DctError::invalid_arguments("expected exactly 3 arguments"));
        }

        let token_id = &input.arguments[0];
        let sender = sender.ok_or(DctError::MissingAccount)?;
        self.roles_handler.check_allowed_to_execute(
            sender,
            token_id,
            ROLE_NFT_UPDATE_ATTRIBUTES,
        )?;

        let store_gas = input.arguments[2].len() as u64 * costs.base_op.store_per_byte;
        if input.gas_provided < costs.base + store_gas {
            return Err(DctError::NotEnoughGas);
        }

        let nonce = u64_from_bytes(&input.arguments[1]);
        if nonce == 0 {
            return Err(DctError::NftDoesNotHaveMetadata);
        }

        let key = token_key(token_id);
        let mut record = self.store.load_nft_record_on_sender(sender, &key, nonce)?;
        match record.metadata.as_mut() {
            Some(metadata) => metadata.attributes = input.arguments[2].clone(),
            None => return Err(DctError::NftDoesNotHaveMetadata),
        }
        self.store
            .save_nft_record(sender, &key, &record, input.return_call_after_error)?;

        let mut output = CallOutput::with_gas(input.gas_provided - costs.base - store_gas);
        output.logs.push(nft_log_entry(
            FUNC_NFT_UPDATE_ATTRIBUTES,
            input.caller,
            token_id,
            nonce,
        ));
        Ok(output)
    }
}

impl BuiltinFunction for DctNftUpdateAttributes {
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
            costs.base = gas_cost.built_in.nft_update_attributes;
            costs.base_op = gas_cost.base_op;
        }
    }

    fn is_active(&self) -> bool {
        self.epoch_provider.current_epoch() >= self.activation_epoch
    }
}
