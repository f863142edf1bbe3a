//! Program state accounts for the bridge settlement core.
//!
//! Every piece of state lives in a PDA owned by this program: one config,
//! one membership record per (role, member), one pool per asset and one
//! receipt per consumed request key. Receipts are never closed.

use anchor_lang::prelude::*;

use crate::errors::BridgeError;

pub const CONFIG_SEED: &[u8] = b"config";
pub const ROLE_SEED: &[u8] = b"role";
pub const POOL_SEED: &[u8] = b"pool";
pub const VAULT_SEED: &[u8] = b"vault";
pub const DEPOSIT_SEED: &[u8] = b"deposit";

/// Asset identifier of the native asset (lamports). Any other asset is an SPL mint.
pub const NATIVE_ASSET: Pubkey = Pubkey::new_from_array([0u8; 32]);
/// `NATIVE_ASSET` as a PDA seed.
pub const NATIVE_ASSET_SEED: &[u8] = &[0u8; 32];

/// 32-byte account identity used for role membership. Solana accounts use
/// their key bytes; secp256k1 signers use their left-padded 20-byte address.
pub type Member = [u8; 32];

/// Caller-supplied identifier of one cross-chain event.
pub type RequestKey = [u8; 32];

/// Global bridge configuration. Single instance per program.
#[account]
#[derive(InitSpace)]
pub struct BridgeConfig {
    /// Domain separator mixed into every deposit digest.
    pub chain_id: u64,
    /// Number of members currently holding ADMIN. Never drops below one.
    pub admin_count: u32,
    pub bump: u8,
}

impl BridgeConfig {
    pub fn admin_added(&mut self) -> Result<()> {
        self.admin_count = self
            .admin_count
            .checked_add(1)
            .ok_or(BridgeError::MathOverflow)?;
        Ok(())
    }

    pub fn admin_removed(&mut self) -> Result<()> {
        require!(self.admin_count > 1, BridgeError::LastAdmin);
        self.admin_count -= 1;
        Ok(())
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum Role {
    /// Manages role membership and registers pools.
    Admin,
    /// Signs deposit approvals and executes withdrawals.
    Keeper,
}

impl Role {
    pub fn seed(&self) -> &'static [u8] {
        match self {
            Role::Admin => b"admin",
            Role::Keeper => b"keeper",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Keeper => "KEEPER",
        }
    }
}

/// Membership record. Seeds: `["role", role.seed(), member]`.
#[account]
#[derive(InitSpace)]
pub struct RoleMember {
    pub role: Role,
    pub member: [u8; 32],
    /// Revocation clears the flag instead of closing the account.
    pub active: bool,
    pub bump: u8,
}

impl RoleMember {
    /// Returns true if membership changed.
    pub fn activate(&mut self) -> bool {
        let changed = !self.active;
        self.active = true;
        changed
    }

    /// Returns true if membership changed.
    pub fn deactivate(&mut self) -> bool {
        let changed = self.active;
        self.active = false;
        changed
    }
}

/// Inventory of one asset. Seeds: `["pool", asset]`.
///
/// Native inventory is held as lamports on this account on top of its rent
/// reserve; token inventory sits in `vault`, whose authority is this PDA.
#[account]
#[derive(InitSpace)]
pub struct AssetPool {
    pub asset: Pubkey,
    /// Token vault for SPL pools, the pool itself for the native pool.
    pub vault: Pubkey,
    pub balance: u64,
    pub bump: u8,
}

impl AssetPool {
    pub fn is_native(&self) -> bool {
        self.asset == NATIVE_ASSET
    }

    pub fn credit(&mut self, amount: u64) -> Result<u64> {
        require!(amount > 0, BridgeError::InvalidParams);
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(BridgeError::MathOverflow)?;
        Ok(self.balance)
    }

    pub fn debit(&mut self, amount: u64) -> Result<u64> {
        require!(amount > 0, BridgeError::InvalidParams);
        require!(amount <= self.balance, BridgeError::InsufficientBalance);
        self.balance -= amount;
        Ok(self.balance)
    }
}

/// Settlement receipt for one request key. Seeds: `["deposit", key]`.
///
/// The seeds do not include the caller, so a key is consumed globally.
#[account]
#[derive(InitSpace)]
pub struct DepositReceipt {
    pub key: [u8; 32],
    pub account: Pubkey,
    pub asset: Pubkey,
    pub amount: u64,
    /// Slot in which the deposit settled.
    pub slot: u64,
    pub consumed: bool,
    pub bump: u8,
}

impl DepositReceipt {
    pub fn consume(
        &mut self,
        key: RequestKey,
        account: Pubkey,
        asset: Pubkey,
        amount: u64,
        slot: u64,
    ) -> Result<()> {
        require!(!self.consumed, BridgeError::AlreadyConsumed);
        self.key = key;
        self.account = account;
        self.asset = asset;
        self.amount = amount;
        self.slot = slot;
        self.consumed = true;
        Ok(())
    }
}
