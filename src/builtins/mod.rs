//! The built-in function catalogue.
//!
//! A closed registry maps function names onto handler implementations; the
//! hosting VM dispatches by name with the sender/destination accounts it
//! holds for the call. Each entry commits the accounts it was handed only
//! after its whole state transition succeeded, so an error always equals
//! zero persisted mutations.

mod burn;
mod create;
mod freeze_wipe;
mod mint;
mod multi_transfer;
mod role_transfer;
mod update_attributes;
mod validation;

pub use burn::DctLocalBurn;
pub use create::DctNftCreate;
pub use freeze_wipe::DctFreezeWipe;
pub use mint::DctLocalMint;
pub use multi_transfer::DctMultiTransfer;
pub use role_transfer::DctNftCreateRoleTransfer;
pub use update_attributes::DctNftUpdateAttributes;

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::account::{Account, AccountsAdapter};
use crate::codec::Marshalizer;
use crate::error::{DctError, DctResult};
use crate::gas::GasCost;
use crate::guard::{DisabledPayableCheck, PauseHandler, PayableHandler, RolesHandler};
use crate::token::storage::TokenStore;
use crate::vm::{CallInput, CallOutput, EpochProvider, ShardCoordinator};

// Function names as they appear on the wire.
pub const FUNC_LOCAL_MINT: &str = "DCTLocalMint";
pub const FUNC_LOCAL_BURN: &str = "DCTLocalBurn";
pub const FUNC_FREEZE: &str = "DCTFreeze";
pub const FUNC_UNFREEZE: &str = "DCTUnFreeze";
pub const FUNC_WIPE: &str = "DCTWipe";
pub const FUNC_NFT_CREATE: &str = "DCTNFTCreate";
pub const FUNC_NFT_UPDATE_ATTRIBUTES: &str = "DCTNFTUpdateAttributes";
pub const FUNC_NFT_CREATE_ROLE_TRANSFER: &str = "DCTNFTCreateRoleTransfer";
pub const FUNC_MULTI_TRANSFER: &str = "MultiDCTNFTTransfer";

/// One catalogue entry.
pub trait BuiltinFunction: Send + Sync {
    /// Run the state transition. `sender` is the caller's account when it
    /// lives on this shard, `dest` the recipient's; either may be absent.
    fn process(
        &self,
        sender: Option<&mut Account>,
        dest: Option<&mut Account>,
        input: &CallInput,
    ) -> DctResult<CallOutput>;

    /// Swap in a new gas configuration; a `None` configuration is a no-op.
    fn set_new_gas_config(&self, _gas_cost: Option<&GasCost>) {}

    /// Whether the function is enabled at the current epoch.
    fn is_active(&self) -> bool {
        true
    }
}

/// Run `execute` over reborrows of the handed accounts, then commit the
/// buffered writes on success or drop them on error.
pub(crate) fn finalize_call<F>(
    mut sender: Option<&mut Account>,
    mut dest: Option<&mut Account>,
    execute: F,
) -> DctResult<CallOutput>
where
    F: FnOnce(Option<&mut Account>, Option<&mut Account>) -> DctResult<CallOutput>,
{
    let result = execute(
        sender.as_mut().map(|a| &mut **a),
        dest.as_mut().map(|a| &mut **a),
    );
    match result {
        Ok(output) => {
            if let Some(account) = sender {
                account.commit()?;
            }
            if let Some(account) = dest {
                account.commit()?;
            }
            Ok(output)
        }
        Err(err) => {
            if let Some(account) = sender {
                account.discard();
            }
            if let Some(account) = dest {
                account.discard();
            }
            Err(err)
        }
    }
}

/// Activation epochs of the catalogue entries that are feature-gated.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActivationEpochs {
    pub nft_update_attributes: u32,
    pub multi_transfer: u32,
}

/// Dependencies of the full catalogue.
pub struct RegistryArgs {
    pub gas_cost: GasCost,
    pub marshalizer: Arc<dyn Marshalizer>,
    pub pause_handler: Arc<dyn PauseHandler>,
    pub roles_handler: Arc<dyn RolesHandler>,
    pub accounts: Arc<dyn AccountsAdapter>,
    pub shard_coordinator: Arc<dyn ShardCoordinator>,
    pub epoch_provider: Arc<dyn EpochProvider>,
    pub activation_epochs: ActivationEpochs,
}

/// The closed built-in function catalogue, keyed by wire name.
pub struct BuiltinRegistry {
    functions: IndexMap<String, Arc<dyn BuiltinFunction>>,
    multi_transfer: Arc<DctMultiTransfer>,
}

impl BuiltinRegistry {
    pub fn new(args: RegistryArgs) -> Self {
        let store = TokenStore::new(args.marshalizer.clone(), args.pause_handler.clone());
        let built_in = args.gas_cost.built_in;
        let base_op = args.gas_cost.base_op;

        let multi_transfer = Arc::new(DctMultiTransfer::new(
            built_in.multi_transfer,
            base_op,
            store.clone(),
            Arc::new(DisabledPayableCheck),
            args.accounts.clone(),
            args.shard_coordinator.clone(),
            args.epoch_provider.clone(),
            args.activation_epochs.multi_transfer,
        ));

        let mut functions: IndexMap<String, Arc<dyn BuiltinFunction>> = IndexMap::new();
        functions.insert(
            FUNC_LOCAL_MINT.to_string(),
            Arc::new(DctLocalMint::new(
                built_in.local_mint,
                store.clone(),
                args.roles_handler.clone(),
            )),
        );
        functions.insert(
            FUNC_LOCAL_BURN.to_string(),
            Arc::new(DctLocalBurn::new(
                built_in.local_burn,
                store.clone(),
                args.roles_handler.clone(),
            )),
        );
        functions.insert(
            FUNC_FREEZE.to_string(),
            Arc::new(DctFreezeWipe::freeze(store.clone())),
        );
        functions.insert(
            FUNC_UNFREEZE.to_string(),
            Arc::new(DctFreezeWipe::unfreeze(store.clone())),
        );
        functions.insert(
            FUNC_WIPE.to_string(),
            Arc::new(DctFreezeWipe::wipe(store.clone())),
        );
        functions.insert(
            FUNC_NFT_CREATE.to_string(),
            Arc::new(DctNftCreate::new(
                built_in.nft_create,
                base_op,
                store.clone(),
                args.roles_handler.clone(),
            )),
        );
        functions.insert(
            FUNC_NFT_UPDATE_ATTRIBUTES.to_string(),
            Arc::new(DctNftUpdateAttributes::new(
                built_in.nft_update_attributes,
                base_op,
                store.clone(),
                args.roles_handler.clone(),
                args.epoch_provider.clone(),
                args.activation_epochs.nft_update_attributes,
            )),
        );
        functions.insert(
            FUNC_NFT_CREATE_ROLE_TRANSFER.to_string(),
            Arc::new(DctNftCreateRoleTransfer::new(
                args.marshalizer.clone(),
                args.accounts.clone(),
                args.shard_coordinator.clone(),
            )),
        );
        functions.insert(
            FUNC_MULTI_TRANSFER.to_string(),
            multi_transfer.clone(),
        );

        Self {
            functions,
            multi_transfer,
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn BuiltinFunction> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Dispatch one call to the catalogue entry named by `input.function`.
    pub fn process_builtin(
        &self,
        sender: Option<&mut Account>,
        dest: Option<&mut Account>,
        input: &CallInput,
    ) -> DctResult<CallOutput> {
        let function = self
            .functions
            .get(input.function.as_str())
            .ok_or_else(|| DctError::FunctionNotFound(input.function.clone()))?;
        if !function.is_active() {
            return Err(DctError::FunctionNotActive(input.function.clone()));
        }

        trace!("processing built-in {} from {}", input.function, input.caller);
        let result = function.process(sender, dest, input);
        if let Err(ref err) = result {
            debug!("built-in {} rejected: {}", input.function, err);
        }
        result
    }

    /// Fan a new gas configuration out to every entry. No-op on `None`.
    pub fn set_new_gas_config(&self, gas_cost: Option<&GasCost>) {
        for function in self.functions.values() {
            function.set_new_gas_config(gas_cost);
        }
    }

    /// Install the host's payable check on the transfer path.
    pub fn set_payable_handler(&self, handler: Arc<dyn PayableHandler>) {
        self.multi_transfer.set_payable_handler(handler);
    }
}
