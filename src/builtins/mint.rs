//! Local mint: credit freshly issued quantity onto the caller's own
//! fungible balance, gated by the local-mint role.

use std::sync::Arc;
use std::sync::RwLock;

use num_bigint::BigUint;

use super::validation::{account_view, check_local_action};
use super::{finalize_call, BuiltinFunction, FUNC_LOCAL_MINT};
use crate::account::Account;
use crate::config::MAX_VALUE_BYTES;
use crate::error::{DctError, DctResult};
use crate::gas::{read_cell, write_cell, GasCost};
use crate::guard::RolesHandler;
use crate::token::roles::ROLE_LOCAL_MINT;
use crate::token::storage::{token_key, TokenStore};
use crate::vm::{token_log_entry, CallInput, CallOutput};

pub struct DctLocalMint {
    func_gas_cost: RwLock<u64>,
    store: TokenStore,
    roles_handler: Arc<dyn RolesHandler>,
}

impl DctLocalMint {
    pub fn new(func_gas_cost: u64, store: TokenStore, roles_handler: Arc<dyn RolesHandler>) -> Self {
        Self {
            func_gas_cost: RwLock::new(func_gas_cost),
            store,
            roles_handler,
        }
    }

    fn execute(&self, sender: Option<&mut Account>, input: &CallInput) -> DctResult<CallOutput> {
        let func_gas_cost = *read_cell(&self.func_gas_cost);
        check_local_action(account_view(&sender), input, func_gas_cost)?;

        let token_id = &input.arguments[0];
        let sender = sender.ok_or(DctError::MissingAccount)?;
        self.roles_handler
            .check_allowed_to_execute(sender, token_id, ROLE_LOCAL_MINT)?;

        if input.arguments[1].len() > MAX_VALUE_BYTES {
            return Err(DctError::invalid_arguments(
                "max length for a mint value is 100 bytes",
            ));
        }
        let value = BigUint::from_bytes_be(&input.arguments[1]);

        self.store.add_to_balance(
            sender,
            &token_key(token_id),
            &value,
            input.return_call_after_error,
        )?;

        let mut output = CallOutput::with_gas(input.gas_provided - func_gas_cost);
        output.logs.push(token_log_entry(
            FUNC_LOCAL_MINT,
            Some(input.caller),
            token_id,
            &value,
        ));
        Ok(output)
    }
}

impl BuiltinFunction for DctLocalMint {
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
            *write_cell(&self.func_gas_cost) = gas_cost.built_in.local_mint;
        }
    }
}
