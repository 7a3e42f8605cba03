//! # Stake Position
//!
//! Per-owner staking ledger entry with simple-interest reward accrual.
//!
//! # Reward Model
//!
//! ```text
//! pending(now) = unclaimed + staked * apy * (now - baseline) / SECONDS_PER_YEAR
//! ```
//!
//! Every principal change first folds the accrued reward into `unclaimed`
//! and moves `baseline` to the change time, so earlier periods keep the
//! principal they actually had. Claiming pays `pending(now)` and resets
//! both `unclaimed` and `baseline`.
//!
//! # Examples
//!
//! ```
//! use swap_engine::domain::entities::stake_position::StakePosition;
//! use swap_engine::domain::value_objects::{Apy, Timestamp, WalletAddress};
//! use rust_decimal::Decimal;
//!
//! let t0 = Timestamp::from_millis(1_700_000_000_000).unwrap();
//! let apy = Apy::new(Decimal::new(7, 2)).unwrap();
//!
//! let mut position = StakePosition::new(WalletAddress::new("owner-1"), t0);
//! position.apply_stake("1000".parse().unwrap(), t0, apy).unwrap();
//!
//! let one_year = t0.add_secs(31_536_000);
//! assert_eq!(position.pending_reward(one_year, apy).unwrap().get(), Decimal::new(70, 0));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Amount, Apy, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// One owner's staked principal and reward state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    owner: WalletAddress,
    staked: Amount,
    unclaimed_reward: Amount,
    baseline: Timestamp,
    total_claimed: Amount,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl StakePosition {
    /// Creates an empty position.
    #[must_use]
    pub fn new(owner: WalletAddress, now: Timestamp) -> Self {
        Self {
            owner,
            staked: Amount::ZERO,
            unclaimed_reward: Amount::ZERO,
            baseline: now,
            total_claimed: Amount::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the owner.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &WalletAddress {
        &self.owner
    }

    /// Returns the staked principal.
    #[inline]
    #[must_use]
    pub fn staked(&self) -> Amount {
        self.staked
    }

    /// Returns reward materialized but not yet claimed.
    #[inline]
    #[must_use]
    pub fn unclaimed_reward(&self) -> Amount {
        self.unclaimed_reward
    }

    /// Returns the accrual baseline.
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> Timestamp {
        self.baseline
    }

    /// Returns the lifetime claimed reward.
    #[inline]
    #[must_use]
    pub fn total_claimed(&self) -> Amount {
        self.total_claimed
    }

    /// Returns when the position was opened.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns the last mutation time.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Reward accrued since the baseline, not yet materialized.
    ///
    /// # Errors
    ///
    /// Propagates arithmetic overflow.
    pub fn accrued_since_baseline(&self, now: Timestamp, apy: Apy) -> DomainResult<Amount> {
        apy.accrue(self.staked, now.millis_since(&self.baseline))
    }

    /// Total claimable reward at `now`.
    ///
    /// # Errors
    ///
    /// Propagates arithmetic overflow.
    pub fn pending_reward(&self, now: Timestamp, apy: Apy) -> DomainResult<Amount> {
        self.unclaimed_reward
            .checked_add(self.accrued_since_baseline(now, apy)?)
    }

    fn materialize(&mut self, now: Timestamp, apy: Apy) -> DomainResult<()> {
        self.unclaimed_reward = self.pending_reward(now, apy)?;
        if now.is_after(&self.baseline) {
            self.baseline = now;
        }
        Ok(())
    }

    /// Adds principal after a confirmed stake transfer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` for a zero amount.
    pub fn apply_stake(&mut self, amount: Amount, now: Timestamp, apy: Apy) -> DomainResult<()> {
        if amount.is_zero() {
            return Err(DomainError::InvalidAmount(
                "stake amount must be positive".to_string(),
            ));
        }
        let staked = self.staked.checked_add(amount)?;
        self.materialize(now, apy)?;
        self.staked = staked;
        self.updated_at = now;
        Ok(())
    }

    /// Checks that `amount` can be unstaked without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InsufficientStake` if `amount` exceeds principal.
    pub fn ensure_can_unstake(&self, amount: Amount) -> DomainResult<()> {
        if amount.is_zero() {
            return Err(DomainError::InvalidAmount(
                "unstake amount must be positive".to_string(),
            ));
        }
        if amount > self.staked {
            return Err(DomainError::InsufficientStake {
                requested: amount.to_string(),
                staked: self.staked.to_string(),
            });
        }
        Ok(())
    }

    /// Removes principal after a confirmed unstake transfer.
    ///
    /// Pending reward is kept in `unclaimed`; unstaking never pays it out.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InsufficientStake` if `amount` exceeds principal.
    pub fn apply_unstake(&mut self, amount: Amount, now: Timestamp, apy: Apy) -> DomainResult<()> {
        self.ensure_can_unstake(amount)?;
        self.materialize(now, apy)?;
        self.staked = self.staked.checked_sub(amount)?;
        self.updated_at = now;
        Ok(())
    }

    /// Records a confirmed claim of `claimed`, computed at `computed_at`.
    ///
    /// # Errors
    ///
    /// Propagates arithmetic overflow.
    pub fn apply_claim(&mut self, claimed: Amount, computed_at: Timestamp) -> DomainResult<()> {
        self.total_claimed = self.total_claimed.checked_add(claimed)?;
        self.unclaimed_reward = Amount::ZERO;
        self.baseline = computed_at;
        self.updated_at = computed_at;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::SECONDS_PER_YEAR;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn t0() -> Timestamp {
        Timestamp::from_millis(1_700_000_000_000).unwrap()
    }

    fn apy() -> Apy {
        Apy::new(Decimal::new(7, 2)).unwrap()
    }

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn staked(principal: &str) -> StakePosition {
        let mut position = StakePosition::new(WalletAddress::new("owner-1"), t0());
        position
            .apply_stake(amount(principal), t0(), apy())
            .unwrap();
        position
    }

    #[test]
    fn new_position_is_empty() {
        let position = StakePosition::new(WalletAddress::new("owner-1"), t0());
        assert!(position.staked().is_zero());
        let later = t0().add_secs(3600);
        assert!(position.pending_reward(later, apy()).unwrap().is_zero());
    }

    #[test]
    fn reward_matches_closed_form() {
        let position = staked("1000");
        let secs = 86_400;
        let expected = Decimal::from(1000) * Decimal::new(7, 2) * Decimal::from(secs)
            / Decimal::from(SECONDS_PER_YEAR);
        let pending = position.pending_reward(t0().add_secs(secs), apy()).unwrap();
        assert!((pending.get() - expected).abs() < Decimal::new(1, 18));
    }

    #[test]
    fn second_stake_materializes_reward_at_old_principal() {
        let mut position = staked("1000");
        let half_year = i64::try_from(SECONDS_PER_YEAR / 2).unwrap();
        let mid = t0().add_secs(half_year);

        position.apply_stake(amount("1000"), mid, apy()).unwrap();
        assert_eq!(position.unclaimed_reward().get(), Decimal::new(35, 0));
        assert_eq!(position.baseline(), mid);

        let end = mid.add_secs(half_year);
        assert_eq!(
            position.pending_reward(end, apy()).unwrap().get(),
            Decimal::new(105, 0)
        );
    }

    #[test]
    fn unstake_keeps_pending_reward() {
        let mut position = staked("1000");
        let later = t0().add_secs(i64::try_from(SECONDS_PER_YEAR).unwrap());
        let before = position.pending_reward(later, apy()).unwrap();

        position
            .apply_unstake(amount("1000"), later, apy())
            .unwrap();
        assert!(position.staked().is_zero());
        assert_eq!(position.pending_reward(later, apy()).unwrap(), before);
        assert_eq!(
            position.pending_reward(later.add_secs(1000), apy()).unwrap(),
            before
        );
    }

    #[test]
    fn unstake_more_than_staked_fails_without_mutation() {
        let mut position = staked("10");
        let snapshot = position.clone();
        let err = position
            .apply_unstake(amount("11"), t0().add_secs(10), apy())
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStake { .. }));
        assert_eq!(position, snapshot);
    }

    #[test]
    fn claim_resets_reward_and_baseline() {
        let mut position = staked("1000");
        let at = t0().add_secs(86_400);
        let reward = position.pending_reward(at, apy()).unwrap();

        position.apply_claim(reward, at).unwrap();
        assert!(position.pending_reward(at, apy()).unwrap().is_zero());
        assert_eq!(position.baseline(), at);
        assert_eq!(position.total_claimed(), reward);
        assert_eq!(position.staked(), amount("1000"));
    }

    #[test]
    fn clock_before_baseline_accrues_nothing() {
        let position = staked("1000");
        assert!(
            position
                .pending_reward(t0().add_secs(-60), apy())
                .unwrap()
                .is_zero()
        );
    }

    proptest! {
        #[test]
        fn pending_reward_is_monotonic(
            principal in 1u64..1_000_000_000,
            rate_bps in 0u32..10_000,
            a in 0i64..100_000_000,
            b in 0i64..100_000_000,
        ) {
            let rate = Apy::new(Decimal::new(i64::from(rate_bps), 4)).unwrap();
            let mut position = StakePosition::new(WalletAddress::new("owner-1"), t0());
            position
                .apply_stake(Amount::new(Decimal::from(principal)).unwrap(), t0(), rate)
                .unwrap();

            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            let r_early = position.pending_reward(t0().add_secs(early), rate).unwrap();
            let r_late = position.pending_reward(t0().add_secs(late), rate).unwrap();
            prop_assert!(r_early <= r_late);
        }

        #[test]
        fn pending_reward_matches_formula(
            principal in 1u64..1_000_000,
            secs in 0i64..10_000_000,
        ) {
            let mut position = StakePosition::new(WalletAddress::new("owner-1"), t0());
            position
                .apply_stake(Amount::new(Decimal::from(principal)).unwrap(), t0(), apy())
                .unwrap();

            let pending = position.pending_reward(t0().add_secs(secs), apy()).unwrap();
            let expected = Decimal::from(principal) * Decimal::new(7, 2) * Decimal::from(secs)
                / Decimal::from(SECONDS_PER_YEAR);
            prop_assert!((pending.get() - expected).abs() < Decimal::new(1, 12));
        }
    }
}
