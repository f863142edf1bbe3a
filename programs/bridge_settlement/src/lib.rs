//! # Bridge Settlement Program
//!
//! Settlement core of a cross-chain value bridge. Deposits are approved
//! off-chain by a keeper's secp256k1 signature and settle exactly once per
//! request key; withdrawals are released from per-asset pools by accounts
//! holding the KEEPER role.
//!
//! ## Trust split
//! - Deposits: authorized by the signature of a keeper's signing key over the
//!   canonical digest `(caller, key, asset, amount, chain_id)`.
//! - Withdrawals: authorized by on-chain KEEPER membership of the signer.
//!   The withdrawal key is an audit tag and is not replay-guarded.
//!
//! ## Accounting
//! A settled deposit escrows its amount from the depositor into the asset's
//! pool. Pools can also be funded directly by anyone. Only withdrawals
//! decrease a pool.
//!
//! ## Security
//! - Request keys are consumed through a PDA derived from the key alone
//! - Role membership lives in PDAs; only ADMIN can change it and the last
//!   ADMIN cannot be revoked
//! - Pool balances are committed before any outbound transfer is issued

pub mod access;
pub mod bridge;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod state;
pub mod verifier;

#[cfg(test)]
mod testing;

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};
use bridge::DepositRequest;
use ledger::PoolLedger;
use state::*;
use verifier::KeeperSignature;

use events::*;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod bridge_settlement {
    use super::*;

    /// Create the bridge config for `chain_id` and make the caller the first ADMIN.
    pub fn initialize(ctx: Context<Initialize>, chain_id: u64) -> Result<()> {
        let admin = ctx.accounts.admin.key();
        let config = &mut ctx.accounts.config;
        config.chain_id = chain_id;
        config.admin_count = 1;
        config.bump = ctx.bumps.config;

        let member = access::member_of_key(&admin);
        let admin_role = &mut ctx.accounts.admin_role;
        admin_role.role = Role::Admin;
        admin_role.member = member;
        admin_role.active = true;
        admin_role.bump = ctx.bumps.admin_role;

        emit!(RoleGranted {
            role: Role::Admin,
            member,
            sender: admin,
        });

        Ok(())
    }

    /// Grant `role` to `member`. ADMIN only; granting a held role is a no-op.
    pub fn grant_role(ctx: Context<UpdateRole>, role: Role, member: [u8; 32]) -> Result<()> {
        let admin = ctx.accounts.admin.key();
        access::require_role(&ctx.accounts.admin_role, Role::Admin, &admin, ctx.program_id)?;

        let changed = access::grant(
            &mut ctx.accounts.config,
            &mut ctx.accounts.role_member,
            role,
            member,
            ctx.bumps.role_member,
        )?;
        if !changed {
            return Ok(());
        }

        emit!(RoleGranted {
            role,
            member,
            sender: admin,
        });

        Ok(())
    }

    /// Revoke `role` from `member`. ADMIN only; revoking an unheld role is a no-op.
    pub fn revoke_role(ctx: Context<UpdateRole>, role: Role, member: [u8; 32]) -> Result<()> {
        let admin = ctx.accounts.admin.key();
        access::require_role(&ctx.accounts.admin_role, Role::Admin, &admin, ctx.program_id)?;

        let changed = access::revoke(
            &mut ctx.accounts.config,
            &mut ctx.accounts.role_member,
            role,
            member,
            ctx.bumps.role_member,
        )?;
        if !changed {
            return Ok(());
        }

        emit!(RoleRevoked {
            role,
            member,
            sender: admin,
        });

        Ok(())
    }

    /// Whether `member` holds `role`. View function.
    pub fn has_role(ctx: Context<HasRole>, role: Role, member: [u8; 32]) -> Result<bool> {
        access::has_role(&ctx.accounts.role_member, role, &member, ctx.program_id)
    }

    /// Register the native asset. ADMIN only.
    pub fn initialize_native_pool(ctx: Context<InitializeNativePool>) -> Result<()> {
        access::require_role(
            &ctx.accounts.admin_role,
            Role::Admin,
            &ctx.accounts.admin.key(),
            ctx.program_id,
        )?;

        // Native inventory is held by the pool account itself.
        let vault = ctx.accounts.pool.key();
        ctx.accounts
            .pool
            .set_inner(ledger::new_pool(NATIVE_ASSET, vault, ctx.bumps.pool));

        emit!(PoolInitialized {
            asset: NATIVE_ASSET,
            vault,
        });

        Ok(())
    }

    /// Register an SPL mint and create its vault. ADMIN only.
    pub fn initialize_token_pool(ctx: Context<InitializeTokenPool>) -> Result<()> {
        access::require_role(
            &ctx.accounts.admin_role,
            Role::Admin,
            &ctx.accounts.admin.key(),
            ctx.program_id,
        )?;

        let asset = ctx.accounts.mint.key();
        let vault = ctx.accounts.vault.key();
        ctx.accounts
            .pool
            .set_inner(ledger::new_pool(asset, vault, ctx.bumps.pool));

        emit!(PoolInitialized { asset, vault });

        Ok(())
    }

    /// Add `amount` lamports of liquidity to the native pool. Open to anyone.
    pub fn fund_native(ctx: Context<FundNative>, amount: u64) -> Result<()> {
        let pool_info = ctx.accounts.pool.to_account_info();
        let payer = ctx.accounts.payer.to_account_info();
        let mut pool = PoolLedger::open(&pool_info, &NATIVE_ASSET, ctx.program_id)?;
        let balance = pool.fund_native(
            &payer,
            &ctx.accounts.system_program.to_account_info(),
            amount,
        )?;

        emit!(PoolFunded {
            asset: NATIVE_ASSET,
            payer: payer.key(),
            amount,
            balance,
        });

        Ok(())
    }

    /// Add `amount` tokens of liquidity to a token pool. Open to anyone.
    pub fn fund_token(ctx: Context<FundToken>, amount: u64) -> Result<()> {
        let asset = ctx.accounts.vault.mint;
        let pool_info = ctx.accounts.pool.to_account_info();
        let payer = ctx.accounts.payer.to_account_info();
        let mut pool = PoolLedger::open(&pool_info, &asset, ctx.program_id)?;
        let balance = pool.fund_token(
            &ctx.accounts.source,
            &ctx.accounts.vault,
            &payer,
            &ctx.accounts.token_program.to_account_info(),
            amount,
        )?;

        emit!(PoolFunded {
            asset,
            payer: payer.key(),
            amount,
            balance,
        });

        Ok(())
    }

    /// Settle a keeper-approved deposit of lamports under request `key`.
    pub fn deposit_native(
        ctx: Context<DepositNative>,
        key: [u8; 32],
        amount: u64,
        signature: KeeperSignature,
    ) -> Result<()> {
        let depositor = ctx.accounts.depositor.to_account_info();
        let request = DepositRequest {
            caller: depositor.key(),
            key,
            asset: NATIVE_ASSET,
            amount,
        };
        let pool_info = ctx.accounts.pool.to_account_info();
        let mut pool = PoolLedger::open(&pool_info, &NATIVE_ASSET, ctx.program_id)?;
        let signer = bridge::authorize_deposit(
            &request,
            &signature,
            ctx.accounts.config.chain_id,
            &ctx.accounts.signer_role,
            ctx.program_id,
        )?;

        let clock = Clock::get()?;
        bridge::settle_deposit(&mut ctx.accounts.receipt, &request, clock.slot)?;
        ctx.accounts.receipt.bump = ctx.bumps.receipt;

        pool.fund_native(
            &depositor,
            &ctx.accounts.system_program.to_account_info(),
            amount,
        )?;

        emit!(Deposit {
            key,
            account: request.caller,
            asset: NATIVE_ASSET,
            amount,
            signer,
            timestamp: clock.unix_timestamp,
        });

        Ok(())
    }

    /// Settle a keeper-approved deposit of tokens under request `key`.
    pub fn deposit_token(
        ctx: Context<DepositToken>,
        key: [u8; 32],
        amount: u64,
        signature: KeeperSignature,
    ) -> Result<()> {
        let depositor = ctx.accounts.depositor.to_account_info();
        let asset = ctx.accounts.vault.mint;
        let request = DepositRequest {
            caller: depositor.key(),
            key,
            asset,
            amount,
        };
        let pool_info = ctx.accounts.pool.to_account_info();
        let mut pool = PoolLedger::open(&pool_info, &asset, ctx.program_id)?;
        let signer = bridge::authorize_deposit(
            &request,
            &signature,
            ctx.accounts.config.chain_id,
            &ctx.accounts.signer_role,
            ctx.program_id,
        )?;

        let clock = Clock::get()?;
        bridge::settle_deposit(&mut ctx.accounts.receipt, &request, clock.slot)?;
        ctx.accounts.receipt.bump = ctx.bumps.receipt;

        pool.fund_token(
            &ctx.accounts.source,
            &ctx.accounts.vault,
            &depositor,
            &ctx.accounts.token_program.to_account_info(),
            amount,
        )?;

        emit!(Deposit {
            key,
            account: request.caller,
            asset,
            amount,
            signer,
            timestamp: clock.unix_timestamp,
        });

        Ok(())
    }

    /// Release `amount` lamports from the native pool to `recipient`. KEEPER only.
    pub fn withdraw_native(ctx: Context<WithdrawNative>, key: [u8; 32], amount: u64) -> Result<()> {
        let keeper = ctx.accounts.keeper.key();
        access::require_role(&ctx.accounts.keeper_role, Role::Keeper, &keeper, ctx.program_id)?;

        let pool_info = ctx.accounts.pool.to_account_info();
        let recipient = ctx.accounts.recipient.to_account_info();
        let mut pool = PoolLedger::open(&pool_info, &NATIVE_ASSET, ctx.program_id)?;
        pool.debit_native(&recipient, amount)?;

        emit!(Withdraw {
            key,
            recipient: recipient.key(),
            asset: NATIVE_ASSET,
            amount,
            keeper,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Release `amount` tokens from a token pool to `destination`. KEEPER only.
    pub fn withdraw_token(ctx: Context<WithdrawToken>, key: [u8; 32], amount: u64) -> Result<()> {
        let keeper = ctx.accounts.keeper.key();
        access::require_role(&ctx.accounts.keeper_role, Role::Keeper, &keeper, ctx.program_id)?;

        let asset = ctx.accounts.vault.mint;
        let pool_info = ctx.accounts.pool.to_account_info();
        let mut pool = PoolLedger::open(&pool_info, &asset, ctx.program_id)?;
        pool.debit_token(
            &ctx.accounts.vault,
            &ctx.accounts.destination,
            &ctx.accounts.token_program.to_account_info(),
            amount,
        )?;

        emit!(Withdraw {
            key,
            recipient: ctx.accounts.destination.owner,
            asset,
            amount,
            keeper,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }

    /// Current inventory of a pool. View function.
    pub fn pool_balance(ctx: Context<PoolBalance>) -> Result<u64> {
        Ok(ctx.accounts.pool.balance)
    }
}

// --- Account structs and validation ---

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + BridgeConfig::INIT_SPACE,
        seeds = [CONFIG_SEED],
        bump
    )]
    pub config: Account<'info, BridgeConfig>,

    #[account(
        init,
        payer = admin,
        space = 8 + RoleMember::INIT_SPACE,
        seeds = [ROLE_SEED, Role::Admin.seed(), admin.key().as_ref()],
        bump
    )]
    pub admin_role: Account<'info, RoleMember>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(role: Role, member: [u8; 32])]
pub struct UpdateRole<'info> {
    #[account(mut, seeds = [CONFIG_SEED], bump = config.bump)]
    pub config: Account<'info, BridgeConfig>,

    /// CHECK: ADMIN membership of `admin`, verified by access::require_role.
    pub admin_role: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = admin,
        space = 8 + RoleMember::INIT_SPACE,
        seeds = [ROLE_SEED, role.seed(), member.as_ref()],
        bump
    )]
    pub role_member: Account<'info, RoleMember>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct HasRole<'info> {
    /// CHECK: read-only; anything but the active membership PDA reads as false.
    pub role_member: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct InitializeNativePool<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + AssetPool::INIT_SPACE,
        seeds = [POOL_SEED, NATIVE_ASSET_SEED],
        bump
    )]
    pub pool: Account<'info, AssetPool>,

    /// CHECK: ADMIN membership of `admin`, verified by access::require_role.
    pub admin_role: UncheckedAccount<'info>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct InitializeTokenPool<'info> {
    pub mint: Account<'info, Mint>,

    #[account(
        init,
        payer = admin,
        space = 8 + AssetPool::INIT_SPACE,
        seeds = [POOL_SEED, mint.key().as_ref()],
        bump
    )]
    pub pool: Account<'info, AssetPool>,

    #[account(
        init,
        payer = admin,
        seeds = [VAULT_SEED, mint.key().as_ref()],
        bump,
        token::mint = mint,
        token::authority = pool
    )]
    pub vault: Account<'info, TokenAccount>,

    /// CHECK: ADMIN membership of `admin`, verified by access::require_role.
    pub admin_role: UncheckedAccount<'info>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[derive(Accounts)]
pub struct FundNative<'info> {
    /// CHECK: opened by PoolLedger, which checks the PDA and owner.
    #[account(mut)]
    pub pool: UncheckedAccount<'info>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct FundToken<'info> {
    /// CHECK: opened by PoolLedger, which checks the PDA and owner.
    #[account(mut)]
    pub pool: UncheckedAccount<'info>,

    #[account(mut)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = source.owner == payer.key() @ errors::BridgeError::InvalidParams
    )]
    pub source: Account<'info, TokenAccount>,

    pub payer: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
#[instruction(key: [u8; 32])]
pub struct DepositNative<'info> {
    #[account(seeds = [CONFIG_SEED], bump = config.bump)]
    pub config: Account<'info, BridgeConfig>,

    /// CHECK: opened by PoolLedger, which checks the PDA and owner.
    #[account(mut)]
    pub pool: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = depositor,
        space = 8 + DepositReceipt::INIT_SPACE,
        seeds = [DEPOSIT_SEED, key.as_ref()],
        bump
    )]
    pub receipt: Account<'info, DepositReceipt>,

    /// CHECK: KEEPER membership of the recovered signer, verified by bridge::authorize_deposit.
    pub signer_role: UncheckedAccount<'info>,

    #[account(mut)]
    pub depositor: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(key: [u8; 32])]
pub struct DepositToken<'info> {
    #[account(seeds = [CONFIG_SEED], bump = config.bump)]
    pub config: Account<'info, BridgeConfig>,

    /// CHECK: opened by PoolLedger, which checks the PDA and owner.
    #[account(mut)]
    pub pool: UncheckedAccount<'info>,

    #[account(mut)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = source.owner == depositor.key() @ errors::BridgeError::InvalidParams
    )]
    pub source: Account<'info, TokenAccount>,

    #[account(
        init_if_needed,
        payer = depositor,
        space = 8 + DepositReceipt::INIT_SPACE,
        seeds = [DEPOSIT_SEED, key.as_ref()],
        bump
    )]
    pub receipt: Account<'info, DepositReceipt>,

    /// CHECK: KEEPER membership of the recovered signer, verified by bridge::authorize_deposit.
    pub signer_role: UncheckedAccount<'info>,

    #[account(mut)]
    pub depositor: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct WithdrawNative<'info> {
    /// CHECK: opened by PoolLedger, which checks the PDA and owner.
    #[account(mut)]
    pub pool: UncheckedAccount<'info>,

    /// CHECK: any account may receive lamports.
    #[account(mut)]
    pub recipient: UncheckedAccount<'info>,

    /// CHECK: KEEPER membership of `keeper`, verified by access::require_role.
    pub keeper_role: UncheckedAccount<'info>,

    pub keeper: Signer<'info>,
}

#[derive(Accounts)]
pub struct WithdrawToken<'info> {
    /// CHECK: opened by PoolLedger, which checks the PDA and owner.
    #[account(mut)]
    pub pool: UncheckedAccount<'info>,

    #[account(mut)]
    pub vault: Account<'info, TokenAccount>,

    #[account(mut)]
    pub destination: Account<'info, TokenAccount>,

    /// CHECK: KEEPER membership of `keeper`, verified by access::require_role.
    pub keeper_role: UncheckedAccount<'info>,

    pub keeper: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct PoolBalance<'info> {
    #[account(seeds = [POOL_SEED, pool.asset.as_ref()], bump = pool.bump)]
    pub pool: Account<'info, AssetPool>,
}
