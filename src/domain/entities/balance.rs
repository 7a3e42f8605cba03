//! # Balances
//!
//! Point-in-time balance snapshots produced by balance reconciliation.

use crate::domain::value_objects::{Amount, AssetId, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A balance read from a single read path at a single moment.
///
/// Snapshots are replaced whole; the amount and `as_of` always come from
/// the same read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Owner of the balance.
    pub owner: WalletAddress,
    /// Asset held.
    pub asset: AssetId,
    /// Amount in display units.
    pub amount: Amount,
    /// When the read completed.
    pub as_of: Timestamp,
    /// Name of the read path that served it.
    pub source: String,
}

impl BalanceSnapshot {
    /// Age of the snapshot at `now`.
    #[must_use]
    pub fn age(&self, now: Timestamp) -> Duration {
        now.duration_since(&self.as_of)
    }

    /// Returns true if the snapshot is older than `ttl` at `now`.
    #[must_use]
    pub fn is_stale_at(&self, now: Timestamp, ttl: Duration) -> bool {
        self.age(now) > ttl
    }
}

/// A snapshot together with its freshness at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    /// The snapshot.
    pub snapshot: BalanceSnapshot,
    /// True if older than the configured TTL.
    pub is_stale: bool,
}

/// Outcome of reading one balance after a state-changing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceReading {
    /// Read succeeded.
    Known(BalanceSnapshot),
    /// Every read path failed; the balance is unknown.
    Unknown {
        /// Owner that was read.
        owner: WalletAddress,
        /// Asset that was read.
        asset: AssetId,
        /// Combined failure detail.
        reason: String,
    },
}

impl BalanceReading {
    /// Returns the snapshot if the read succeeded.
    #[must_use]
    pub fn snapshot(&self) -> Option<&BalanceSnapshot> {
        match self {
            Self::Known(snapshot) => Some(snapshot),
            Self::Unknown { .. } => None,
        }
    }

    /// Returns the asset this reading is for.
    #[must_use]
    pub fn asset(&self) -> &AssetId {
        match self {
            Self::Known(snapshot) => &snapshot.asset,
            Self::Unknown { asset, .. } => asset,
        }
    }

    /// Returns true if the balance is unknown.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot(as_of: Timestamp) -> BalanceSnapshot {
        BalanceSnapshot {
            owner: WalletAddress::new("owner-1"),
            asset: AssetId::new("mint-x"),
            amount: "5".parse().unwrap(),
            as_of,
            source: "rpc".to_string(),
        }
    }

    #[test]
    fn staleness_uses_ttl() {
        let t0 = Timestamp::from_millis(1_700_000_000_000).unwrap();
        let snap = snapshot(t0);
        let ttl = Duration::from_secs(30);
        assert!(!snap.is_stale_at(t0.add_secs(30), ttl));
        assert!(snap.is_stale_at(t0.add_secs(31), ttl));
    }

    #[test]
    fn reading_accessors() {
        let t0 = Timestamp::from_millis(1_700_000_000_000).unwrap();
        let known = BalanceReading::Known(snapshot(t0));
        assert!(known.snapshot().is_some());
        assert_eq!(known.asset().as_str(), "mint-x");

        let unknown = BalanceReading::Unknown {
            owner: WalletAddress::new("owner-1"),
            asset: AssetId::new("mint-y"),
            reason: "all read paths failed".to_string(),
        };
        assert!(unknown.is_unknown());
        assert_eq!(unknown.asset().as_str(), "mint-y");
    }
}
