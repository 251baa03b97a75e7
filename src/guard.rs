//! Permission guard: role checks, pause/frozen enforcement and the payable
//! check, all behind host-pluggable traits.

use std::sync::Arc;

use log::debug;

use crate::account::Account;
use crate::codec::Marshalizer;
use crate::error::{DctError, DctResult};
use crate::token::roles::load_roles;
use crate::token::types::TokenRecord;
use crate::vm::Address;

/// Global pause flag per token key, owned by the external settings layer.
pub trait PauseHandler: Send + Sync {
    fn is_paused(&self, token_key: &[u8]) -> bool;
}

/// Whether a destination accepts assets without an accompanying call.
pub trait PayableHandler: Send + Sync {
    fn is_payable(&self, address: &Address) -> DctResult<bool>;
}

/// Role-based allow/deny decisions for the catalogue.
pub trait RolesHandler: Send + Sync {
    fn check_allowed_to_execute(
        &self,
        account: &Account,
        token_id: &[u8],
        role: &[u8],
    ) -> DctResult<()>;
}

/// Pause handler for hosts without a pause switch: never paused.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledPauseHandler;

impl PauseHandler for DisabledPauseHandler {
    fn is_paused(&self, _token_key: &[u8]) -> bool {
        false
    }
}

/// Payable handler used until the host installs a real one: everything is
/// payable, so the check is effectively disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledPayableCheck;

impl PayableHandler for DisabledPayableCheck {
    fn is_payable(&self, _address: &Address) -> DctResult<bool> {
        Ok(true)
    }
}

/// Roles handler reading the stored role list of the account itself.
#[derive(Clone)]
pub struct StorageRolesHandler {
    marshalizer: Arc<dyn Marshalizer>,
}

impl StorageRolesHandler {
    pub fn new(marshalizer: Arc<dyn Marshalizer>) -> Self {
        Self { marshalizer }
    }
}

impl RolesHandler for StorageRolesHandler {
    fn check_allowed_to_execute(
        &self,
        account: &Account,
        token_id: &[u8],
        role: &[u8],
    ) -> DctResult<()> {
        let roles = load_roles(self.marshalizer.as_ref(), account, token_id)?;
        if roles.contains(role) {
            return Ok(());
        }
        debug!(
            "account {} lacks role {} on token {}",
            account.address(),
            String::from_utf8_lossy(role),
            String::from_utf8_lossy(token_id),
        );
        Err(DctError::ActionNotAllowed(
            String::from_utf8_lossy(role).into_owned(),
        ))
    }
}

/// Enforce frozen and paused state before a record mutation.
///
/// Bypassed on error-recovery continuations: a call that is already
/// settling an error must still land its funds, otherwise value gets stuck
/// in transit.
pub fn check_frozen_and_paused(
    address: Address,
    token_key: &[u8],
    record: &TokenRecord,
    pause_handler: &dyn PauseHandler,
    is_return_call_after_error: bool,
) -> DctResult<()> {
    if is_return_call_after_error {
        return Ok(());
    }
    if record.properties.frozen {
        debug!("token key {} frozen for {}", hex::encode(token_key), address);
        return Err(DctError::FrozenForAccount);
    }
    if pause_handler.is_paused(token_key) {
        return Err(DctError::TokenIsPaused);
    }
    Ok(())
}
