//! Events emitted by the bridge settlement program.
//! `Deposit` is the depositor's durable proof of settlement; relayers and
//! indexers consume `Deposit` and `Withdraw` for cross-chain accounting.

use anchor_lang::prelude::*;

use crate::state::Role;

#[event]
pub struct Deposit {
    pub key: [u8; 32],
    pub account: Pubkey,
    /// All-zero key for the native asset, otherwise the SPL mint.
    pub asset: Pubkey,
    pub amount: u64,
    /// EVM address of the keeper that approved the deposit.
    pub signer: [u8; 20],
    pub timestamp: i64,
}

#[event]
pub struct Withdraw {
    pub key: [u8; 32],
    pub recipient: Pubkey,
    pub asset: Pubkey,
    pub amount: u64,
    pub keeper: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct PoolInitialized {
    pub asset: Pubkey,
    pub vault: Pubkey,
}

#[event]
pub struct PoolFunded {
    pub asset: Pubkey,
    pub payer: Pubkey,
    pub amount: u64,
    /// Pool balance after funding.
    pub balance: u64,
}

#[event]
pub struct RoleGranted {
    pub role: Role,
    pub member: [u8; 32],
    pub sender: Pubkey,
}

#[event]
pub struct RoleRevoked {
    pub role: Role,
    pub member: [u8; 32],
    pub sender: Pubkey,
}
