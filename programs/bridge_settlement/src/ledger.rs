//! Asset pool ledger: owns pool balances and the value movement that backs them.
//!
//! Pools are passed to instructions unchecked and opened here, so that an
//! unregistered asset fails with `InvalidParams`. Every mutation commits the
//! new balance to account data before the matching transfer is issued.

use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::token::{self, TokenAccount, Transfer};

use crate::errors::BridgeError;
use crate::state::{AssetPool, POOL_SEED};

pub fn pool_address(asset: &Pubkey, program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[POOL_SEED, asset.as_ref()], program_id).0
}

pub struct PoolLedger<'a, 'info> {
    info: &'a AccountInfo<'info>,
    pool: AssetPool,
}

impl<'a, 'info> PoolLedger<'a, 'info> {
    /// Opens the pool of `asset`. Fails with `InvalidParams` unless `info` is
    /// the initialized pool PDA for that asset.
    pub fn open(info: &'a AccountInfo<'info>, asset: &Pubkey, program_id: &Pubkey) -> Result<Self> {
        if *info.key != pool_address(asset, program_id)
            || info.owner != program_id
            || info.data_is_empty()
        {
            msg!("Unrecognized asset {}", asset);
            return err!(BridgeError::InvalidParams);
        }
        let pool = {
            let data = info.try_borrow_data()?;
            AssetPool::try_deserialize(&mut &data[..])?
        };
        require_keys_eq!(pool.asset, *asset, BridgeError::InvalidParams);
        Ok(Self { info, pool })
    }

    pub fn balance(&self) -> u64 {
        self.pool.balance
    }

    pub fn asset(&self) -> Pubkey {
        self.pool.asset
    }

    fn commit(&self) -> Result<()> {
        let mut data = self.info.try_borrow_mut_data()?;
        let dst: &mut [u8] = &mut data;
        let mut writer = std::io::Cursor::new(dst);
        self.pool.try_serialize(&mut writer)
    }

    /// Applies `update` to a copy of the pool and commits it only on success.
    fn stage(&mut self, update: impl FnOnce(&mut AssetPool) -> Result<u64>) -> Result<u64> {
        let mut staged = self.pool.clone();
        let balance = update(&mut staged)?;
        self.pool = staged;
        self.commit()?;
        Ok(balance)
    }

    fn check_vault(&self, vault: &Account<'info, TokenAccount>) -> Result<()> {
        require!(!self.pool.is_native(), BridgeError::InvalidParams);
        require_keys_eq!(vault.key(), self.pool.vault, BridgeError::InvalidParams);
        require_keys_eq!(vault.mint, self.pool.asset, BridgeError::InvalidParams);
        Ok(())
    }

    /// Moves `amount` lamports from `payer` into the native pool.
    pub fn fund_native(
        &mut self,
        payer: &AccountInfo<'info>,
        system_program: &AccountInfo<'info>,
        amount: u64,
    ) -> Result<u64> {
        require!(self.pool.is_native(), BridgeError::InvalidParams);
        require!(payer.lamports() >= amount, BridgeError::TransferFailed);
        let balance = self.stage(|pool| pool.credit(amount))?;

        system_program::transfer(
            CpiContext::new(
                system_program.clone(),
                system_program::Transfer {
                    from: payer.clone(),
                    to: self.info.clone(),
                },
            ),
            amount,
        )
        .map_err(|_| error!(BridgeError::TransferFailed))?;
        Ok(balance)
    }

    /// Moves `amount` tokens from `source` (signed by `authority`) into the pool vault.
    pub fn fund_token(
        &mut self,
        source: &Account<'info, TokenAccount>,
        vault: &Account<'info, TokenAccount>,
        authority: &AccountInfo<'info>,
        token_program: &AccountInfo<'info>,
        amount: u64,
    ) -> Result<u64> {
        self.check_vault(vault)?;
        require_keys_eq!(source.mint, self.pool.asset, BridgeError::InvalidParams);
        require_keys_neq!(source.key(), vault.key(), BridgeError::InvalidParams);
        require!(source.amount >= amount, BridgeError::TransferFailed);
        let balance = self.stage(|pool| pool.credit(amount))?;

        token::transfer(
            CpiContext::new(
                token_program.clone(),
                Transfer {
                    from: source.to_account_info(),
                    to: vault.to_account_info(),
                    authority: authority.clone(),
                },
            ),
            amount,
        )
        .map_err(|_| error!(BridgeError::TransferFailed))?;
        Ok(balance)
    }

    /// Pays `amount` lamports out of the native pool to `recipient`.
    pub fn debit_native(&mut self, recipient: &AccountInfo<'info>, amount: u64) -> Result<u64> {
        require!(self.pool.is_native(), BridgeError::InvalidParams);
        require_keys_neq!(*recipient.key, *self.info.key, BridgeError::InvalidParams);
        let mut staged = self.pool.clone();
        let balance = staged.debit(amount)?;
        let remaining = self
            .info
            .lamports()
            .checked_sub(amount)
            .ok_or(BridgeError::TransferFailed)?;
        let received = recipient
            .lamports()
            .checked_add(amount)
            .ok_or(BridgeError::MathOverflow)?;
        self.pool = staged;
        self.commit()?;

        **self.info.try_borrow_mut_lamports()? = remaining;
        **recipient.try_borrow_mut_lamports()? = received;
        Ok(balance)
    }

    /// Pays `amount` tokens out of the pool vault to `destination`, signed by the pool PDA.
    pub fn debit_token(
        &mut self,
        vault: &Account<'info, TokenAccount>,
        destination: &Account<'info, TokenAccount>,
        token_program: &AccountInfo<'info>,
        amount: u64,
    ) -> Result<u64> {
        self.check_vault(vault)?;
        require_keys_eq!(destination.mint, self.pool.asset, BridgeError::InvalidParams);
        // SPL Token treats a self-transfer as a successful no-op.
        require_keys_neq!(destination.key(), vault.key(), BridgeError::InvalidParams);
        let mut staged = self.pool.clone();
        let balance = staged.debit(amount)?;
        require!(vault.amount >= amount, BridgeError::TransferFailed);
        self.pool = staged;
        self.commit()?;

        let asset = self.pool.asset;
        let bump = [self.pool.bump];
        let seeds: &[&[u8]] = &[POOL_SEED, asset.as_ref(), &bump];
        let signer = &[seeds];
        token::transfer(
            CpiContext::new_with_signer(
                token_program.clone(),
                Transfer {
                    from: vault.to_account_info(),
                    to: destination.to_account_info(),
                    authority: self.info.clone(),
                },
                signer,
            ),
            amount,
        )
        .map_err(|_| error!(BridgeError::TransferFailed))?;
        Ok(balance)
    }
}

/// Builds the initial state of a pool for `asset`.
pub fn new_pool(asset: Pubkey, vault: Pubkey, bump: u8) -> AssetPool {
    AssetPool {
        asset,
        vault,
        balance: 0,
        bump,
    }
}
