//! Shared precondition checks of the catalogue. Checks run in a strict
//! order and the first failure wins; a reordered check is a consensus bug,
//! not a style choice.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::account::Account;
use crate::config::MIN_TRANSFER_ARGUMENTS;
use crate::error::{DctError, DctResult};
use crate::vm::{CallInput, CallType};

/// Read-only view over an optionally handed account.
pub(crate) fn account_view<'a>(account: &'a Option<&mut Account>) -> Option<&'a Account> {
    account.as_ref().map(|a| &**a)
}

/// Checks shared by every token call: no attached value, a token identifier
/// and at least one more argument.
pub(crate) fn check_basic_arguments(input: &CallInput) -> DctResult<()> {
    if !input.call_value.is_zero() {
        return Err(DctError::CalledWithValue);
    }
    if input.arguments.len() < MIN_TRANSFER_ARGUMENTS {
        return Err(DctError::invalid_arguments("not enough arguments"));
    }
    Ok(())
}

/// Precondition chain of the local amount-moving actions (mint, burn):
/// basic checks, self-call only, sender present, positive amount, gas.
pub(crate) fn check_local_action(
    sender: Option<&Account>,
    input: &CallInput,
    func_gas_cost: u64,
) -> DctResult<()> {
    check_basic_arguments(input)?;
    if input.caller != input.recipient {
        return Err(DctError::InvalidRcvAddr);
    }
    if sender.is_none() {
        return Err(DctError::MissingAccount);
    }
    let value = BigUint::from_bytes_be(&input.arguments[1]);
    if value.is_zero() {
        return Err(DctError::NegativeValue);
    }
    if input.gas_provided < func_gas_cost {
        return Err(DctError::NotEnoughGas);
    }
    Ok(())
}

/// Precondition chain of the NFT actions (create, update): as the local
/// chain but without an amount argument at a fixed position.
pub(crate) fn check_nft_action(
    sender: Option<&Account>,
    input: &CallInput,
    func_gas_cost: u64,
) -> DctResult<()> {
    check_basic_arguments(input)?;
    if input.caller != input.recipient {
        return Err(DctError::InvalidRcvAddr);
    }
    if sender.is_none() {
        return Err(DctError::MissingAccount);
    }
    if input.gas_provided < func_gas_cost {
        return Err(DctError::NotEnoughGas);
    }
    Ok(())
}

/// Whether a transfer must pass the payable check on its destination.
///
/// Skipped on asynchronous continuations and when a trailing contract call
/// consumes the transfer: an executed call is its own opt-in.
pub(crate) fn must_verify_payable(input: &CallInput, min_arguments: usize) -> bool {
    if matches!(
        input.call_type,
        CallType::AsynchronousCall | CallType::AsynchronousCallBack
    ) {
        return false;
    }
    if input.arguments.len() > min_arguments {
        return false;
    }
    true
}
