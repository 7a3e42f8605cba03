//! # Staking Ledger Use Case
//!
//! Stake, unstake and claim, each effected on chain through the same
//! settlement pipeline as swaps.
//!
//! The ledger only changes after the transfer confirms. A failed, cancelled
//! or unconfirmed transfer leaves the position exactly as it was. Operations
//! for one owner are serialized with the swap orchestrator's owner locks, so
//! two unstakes that together exceed the principal cannot both pass the
//! check.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::balance_reconciliation::BalanceReconciliationService;
use crate::application::services::owner_lock::OwnerLocks;
use crate::application::services::settlement::{CancelSignal, Settlement};
use crate::domain::entities::{BalanceReading, StakePosition, UnsignedTransaction};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{Amount, Apy, Asset, Clock, Timestamp, TxId, WalletAddress};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Direction of a staking transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Owner to stake account.
    Stake,
    /// Stake account to owner, principal.
    Unstake,
    /// Stake account to owner, reward.
    Claim,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stake => "stake",
            Self::Unstake => "unstake",
            Self::Claim => "claim",
        };
        f.write_str(s)
    }
}

/// A single-asset transfer to be built into a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    /// Why the transfer is made.
    pub kind: TransferKind,
    /// Sender.
    pub from: WalletAddress,
    /// Recipient.
    pub to: WalletAddress,
    /// Transferred asset.
    pub asset: Asset,
    /// Transferred amount.
    pub amount: Amount,
}

/// Builds unsigned transfer transactions.
#[async_trait]
pub trait TransferBuilder: Send + Sync + fmt::Debug {
    /// Builds a transaction for `instruction`.
    async fn build_transfer(
        &self,
        instruction: &TransferInstruction,
    ) -> ApplicationResult<UnsignedTransaction>;
}

/// Storage for stake positions. Positions are never deleted.
#[async_trait]
pub trait StakePositionRepository: Send + Sync + fmt::Debug {
    /// Loads an owner's position.
    async fn get(&self, owner: &WalletAddress) -> ApplicationResult<Option<StakePosition>>;

    /// Inserts or replaces a position.
    async fn save(&self, position: &StakePosition) -> ApplicationResult<()>;
}

/// Staking parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingConfig {
    /// Annual reward rate.
    pub apy: Apy,
    /// Account holding staked funds.
    pub stake_account: WalletAddress,
    /// Staked asset.
    pub asset: Asset,
}

/// A position with its live pending reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
    /// The stored position.
    pub position: StakePosition,
    /// `unclaimed + accrued` at `as_of`.
    pub pending_reward: Amount,
    /// When the reward was computed.
    pub as_of: Timestamp,
}

/// Result of a confirmed staking operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingReceipt {
    /// Confirmed transfer.
    pub tx_id: TxId,
    /// Position after the operation.
    pub view: PositionView,
    /// Reward paid, for claims.
    pub claimed: Option<Amount>,
    /// Owner's balance of the staked asset after the operation.
    pub balances: Vec<BalanceReading>,
}

/// Staking ledger.
#[derive(Debug)]
pub struct StakingLedger {
    config: StakingConfig,
    transfers: Arc<dyn TransferBuilder>,
    settlement: Arc<Settlement>,
    reconciliation: Arc<BalanceReconciliationService>,
    positions: Arc<dyn StakePositionRepository>,
    owner_locks: Arc<OwnerLocks>,
    clock: Arc<dyn Clock>,
}

impl StakingLedger {
    /// Creates a ledger.
    #[must_use]
    pub fn new(
        config: StakingConfig,
        transfers: Arc<dyn TransferBuilder>,
        settlement: Arc<Settlement>,
        reconciliation: Arc<BalanceReconciliationService>,
        positions: Arc<dyn StakePositionRepository>,
        owner_locks: Arc<OwnerLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            transfers,
            settlement,
            reconciliation,
            positions,
            owner_locks,
            clock,
        }
    }

    /// Returns the staking parameters.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StakingConfig {
        &self.config
    }

    /// Stakes `amount` of the configured asset.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a non-positive amount
    /// - `ReadFailure` if the balance cannot be read
    /// - `InsufficientBalance` if the fresh balance is below `amount`
    /// - any settlement error; the position is unchanged
    #[instrument(skip_all, fields(owner = %owner, amount = %amount))]
    pub async fn stake(
        &self,
        owner: &WalletAddress,
        amount: Decimal,
        mut cancel: CancelSignal,
    ) -> ApplicationResult<StakingReceipt> {
        let _guard = self.owner_locks.acquire(owner).await;
        let amount = positive(amount, TransferKind::Stake)?;

        let balance = self
            .reconciliation
            .refresh(owner, &self.config.asset)
            .await?;
        if amount > balance.amount {
            return Err(ApplicationError::InsufficientBalance {
                requested: amount.to_string(),
                available: balance.amount.to_string(),
            });
        }

        let tx_id = self
            .transfer(TransferKind::Stake, owner, amount, &mut cancel)
            .await?;

        let now = self.clock.now();
        let mut position = self.load_or_new(owner, now).await?;
        position.apply_stake(amount, now, self.config.apy)?;
        self.positions.save(&position).await?;
        info!(%tx_id, staked = %position.staked(), "stake confirmed");

        self.receipt(tx_id, position, None).await
    }

    /// Unstakes `amount` of principal. Pending reward stays unclaimed.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a non-positive amount
    /// - `InsufficientStake` if `amount` exceeds the staked principal
    /// - any settlement error; the position is unchanged
    #[instrument(skip_all, fields(owner = %owner, amount = %amount))]
    pub async fn unstake(
        &self,
        owner: &WalletAddress,
        amount: Decimal,
        mut cancel: CancelSignal,
    ) -> ApplicationResult<StakingReceipt> {
        let _guard = self.owner_locks.acquire(owner).await;
        let amount = positive(amount, TransferKind::Unstake)?;

        let now = self.clock.now();
        let position = self.load_or_new(owner, now).await?;
        position.ensure_can_unstake(amount)?;

        let tx_id = self
            .transfer(TransferKind::Unstake, owner, amount, &mut cancel)
            .await?;

        let now = self.clock.now();
        let mut position = position;
        position.apply_unstake(amount, now, self.config.apy)?;
        self.positions.save(&position).await?;
        info!(%tx_id, staked = %position.staked(), "unstake confirmed");

        self.receipt(tx_id, position, None).await
    }

    /// Claims the whole pending reward.
    ///
    /// The reward is computed once, before the transfer is built. Either the
    /// transfer confirms and the position records exactly that amount, or the
    /// position is left untouched.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if there is nothing to claim
    /// - any settlement error; the position is unchanged
    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn claim(
        &self,
        owner: &WalletAddress,
        mut cancel: CancelSignal,
    ) -> ApplicationResult<StakingReceipt> {
        let _guard = self.owner_locks.acquire(owner).await;

        let computed_at = self.clock.now();
        let mut position = self.load_or_new(owner, computed_at).await?;
        let reward = position.pending_reward(computed_at, self.config.apy)?;
        if reward.is_zero() {
            return Err(ApplicationError::invalid_request("no reward to claim"));
        }

        let tx_id = self
            .transfer(TransferKind::Claim, owner, reward, &mut cancel)
            .await?;

        position.apply_claim(reward, computed_at)?;
        self.positions.save(&position).await?;
        info!(%tx_id, %reward, "claim confirmed");

        self.receipt(tx_id, position, Some(reward)).await
    }

    /// Current position with its live pending reward.
    ///
    /// Owners who never staked get an empty position.
    ///
    /// # Errors
    ///
    /// Repository and arithmetic errors.
    pub async fn position(&self, owner: &WalletAddress) -> ApplicationResult<PositionView> {
        let now = self.clock.now();
        let position = self.load_or_new(owner, now).await?;
        self.view(position, now)
    }

    async fn transfer(
        &self,
        kind: TransferKind,
        owner: &WalletAddress,
        amount: Amount,
        cancel: &mut CancelSignal,
    ) -> ApplicationResult<TxId> {
        let (from, to) = match kind {
            TransferKind::Stake => (owner.clone(), self.config.stake_account.clone()),
            TransferKind::Unstake | TransferKind::Claim => {
                (self.config.stake_account.clone(), owner.clone())
            }
        };
        let instruction = TransferInstruction {
            kind,
            from,
            to,
            asset: self.config.asset.clone(),
            amount,
        };

        let tx = self.transfers.build_transfer(&instruction).await?;
        match self.settlement.settle(&tx, cancel).await {
            Ok(tx_id) => Ok(tx_id),
            Err(e) => {
                if matches!(
                    e,
                    ApplicationError::TransactionFailed { .. }
                        | ApplicationError::ConfirmationTimeout { .. }
                ) {
                    // Funds may have moved; refresh what the owner sees.
                    self.reconciliation
                        .reconcile(owner, &[&self.config.asset])
                        .await;
                }
                warn!(%kind, error = %e, "staking transfer did not confirm");
                Err(e)
            }
        }
    }

    async fn receipt(
        &self,
        tx_id: TxId,
        position: StakePosition,
        claimed: Option<Amount>,
    ) -> ApplicationResult<StakingReceipt> {
        let balances = self
            .reconciliation
            .reconcile(position.owner(), &[&self.config.asset])
            .await;
        let view = self.view(position, self.clock.now())?;
        Ok(StakingReceipt {
            tx_id,
            view,
            claimed,
            balances,
        })
    }

    async fn load_or_new(
        &self,
        owner: &WalletAddress,
        now: Timestamp,
    ) -> ApplicationResult<StakePosition> {
        Ok(self
            .positions
            .get(owner)
            .await?
            .unwrap_or_else(|| StakePosition::new(owner.clone(), now)))
    }

    fn view(&self, position: StakePosition, now: Timestamp) -> ApplicationResult<PositionView> {
        let pending_reward = position.pending_reward(now, self.config.apy)?;
        Ok(PositionView {
            position,
            pending_reward,
            as_of: now,
        })
    }
}

fn positive(amount: Decimal, kind: TransferKind) -> ApplicationResult<Amount> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::InvalidAmount(format!(
            "{kind} amount must be positive, got {amount}"
        ))
        .into());
    }
    Ok(Amount::new(amount)?)
}
