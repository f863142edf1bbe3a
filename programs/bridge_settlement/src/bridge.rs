//! Deposit settlement: signature authorization followed by key consumption.
//!
//! Value movement is left to the ledger; this module decides whether a
//! deposit may settle at all and records it against its request key.

use anchor_lang::prelude::*;

use crate::access::{has_role, member_of_evm};
use crate::errors::BridgeError;
use crate::state::{DepositReceipt, RequestKey, Role};
use crate::verifier::{recover_deposit_signer, EvmAddress, KeeperSignature};

#[derive(Clone, Copy, Debug)]
pub struct DepositRequest {
    pub caller: Pubkey,
    pub key: RequestKey,
    pub asset: Pubkey,
    pub amount: u64,
}

/// Returns the keeper that approved `request` on `chain_id`.
///
/// `signer_role` must be the KEEPER membership account of the recovered
/// signer; any other account, or a non-keeper signer, fails with
/// `InvalidSignature`.
pub fn authorize_deposit(
    request: &DepositRequest,
    signature: &KeeperSignature,
    chain_id: u64,
    signer_role: &AccountInfo,
    program_id: &Pubkey,
) -> Result<EvmAddress> {
    require!(request.amount > 0, BridgeError::InvalidParams);
    let signer = recover_deposit_signer(
        &request.caller,
        &request.key,
        &request.asset,
        request.amount,
        chain_id,
        signature,
    )?;
    if !has_role(signer_role, Role::Keeper, &member_of_evm(&signer), program_id)? {
        msg!("Deposit approval not signed by a keeper");
        return err!(BridgeError::InvalidSignature);
    }
    Ok(signer)
}

/// Consumes the request key. A key settles once for the lifetime of the program.
pub fn settle_deposit(receipt: &mut DepositReceipt, request: &DepositRequest, slot: u64) -> Result<()> {
    receipt.consume(
        request.key,
        request.caller,
        request.asset,
        request.amount,
        slot,
    )
}
