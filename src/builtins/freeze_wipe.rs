//! Freeze, unfreeze and wipe: the token management system contract's
//! grip on individual holdings. One builtin type covers all three, the
//! same way the wire exposes them as three function names.

use num_traits::Zero;

use super::{finalize_call, BuiltinFunction, FUNC_WIPE};
use crate::account::Account;
use crate::config::TOKEN_SYSTEM_SC_ADDRESS;
use crate::error::{DctError, DctResult};
use crate::token::storage::{token_key, TokenStore};
use crate::vm::{CallInput, CallOutput, LogEntry};

pub struct DctFreezeWipe {
    store: TokenStore,
    freeze: bool,
    wipe: bool,
}

impl DctFreezeWipe {
    pub fn freeze(store: TokenStore) -> Self {
        Self {
            store,
            freeze: true,
            wipe: false,
        }
    }

    pub fn unfreeze(store: TokenStore) -> Self {
        Self {
            store,
            freeze: false,
            wipe: false,
        }
    }

    pub fn wipe(store: TokenStore) -> Self {
        Self {
            store,
            freeze: false,
            wipe: true,
        }
    }

    fn execute(&self, dest: Option<&mut Account>, input: &CallInput) -> DctResult<CallOutput> {
        if !input.call_value.is_zero() {
            return Err(DctError::CalledWithValue);
        }
        if input.arguments.len() != 1 {
            return Err(DctError::invalid_arguments("expected exactly one argument"));
        }
        if input.caller != TOKEN_SYSTEM_SC_ADDRESS {
            return Err(DctError::AddressIsNotSystemSC);
        }
        let dest = dest.ok_or(DctError::MissingAccount)?;

        let token_id = &input.arguments[0];
        let key = token_key(token_id);

        let mut output = CallOutput::default();
        if self.wipe {
            self.wipe_if_applicable(dest, &key)?;
            output.logs.push(LogEntry {
                identifier: FUNC_WIPE.as_bytes().to_vec(),
                address: Some(input.caller),
                topics: vec![
                    token_id.to_vec(),
                    Vec::new(),
                    dest.address().to_vec(),
                ],
                data: Vec::new(),
            });
        } else {
            self.toggle_freeze(dest, &key)?;
        }

        Ok(output)
    }

    fn wipe_if_applicable(&self, dest: &mut Account, token_key: &[u8]) -> DctResult<()> {
        let record = self.store.load_record(dest, token_key)?;
        if !record.properties.frozen {
            return Err(DctError::CannotWipeAccountNotFrozen);
        }
        dest.save_key_value(token_key, None);
        Ok(())
    }

    fn toggle_freeze(&self, dest: &mut Account, token_key: &[u8]) -> DctResult<()> {
        let mut record = self.store.load_record(dest, token_key)?;
        record.properties.frozen = self.freeze;
        self.store.save_record(dest, token_key, &record)
    }
}

impl BuiltinFunction for DctFreezeWipe {
    fn process(
        &self,
        sender: Option<&mut Account>,
        dest: Option<&mut Account>,
        input: &CallInput,
    ) -> DctResult<CallOutput> {
        finalize_call(sender, dest, |_sender, dest| self.execute(dest, input))
    }
}
