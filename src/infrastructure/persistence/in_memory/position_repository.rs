//! # In-Memory Stake Position Repository
//!
//! In-process implementation of [`StakePositionRepository`].
//!
//! # Examples
//!
//! ```
//! use swap_engine::infrastructure::persistence::in_memory::InMemoryPositionRepository;
//!
//! let repo = InMemoryPositionRepository::new();
//! assert!(repo.is_empty());
//! ```

use crate::application::error::ApplicationResult;
use crate::application::use_cases::staking::StakePositionRepository;
use crate::domain::entities::StakePosition;
use crate::domain::value_objects::WalletAddress;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`StakePositionRepository`].
///
/// # Thread Safety
///
/// Storage is an `Arc<RwLock<HashMap>>`; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPositionRepository {
    storage: Arc<RwLock<HashMap<WalletAddress, StakePosition>>>,
}

impl InMemoryPositionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.try_read().map_or(0, |guard| guard.len())
    }

    /// Returns true if no position is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored position, in owner order.
    pub async fn all(&self) -> Vec<StakePosition> {
        let storage = self.storage.read().await;
        let mut positions: Vec<StakePosition> = storage.values().cloned().collect();
        positions.sort_by(|a, b| a.owner().cmp(b.owner()));
        positions
    }
}

#[async_trait]
impl StakePositionRepository for InMemoryPositionRepository {
    async fn get(&self, owner: &WalletAddress) -> ApplicationResult<Option<StakePosition>> {
        let storage = self.storage.read().await;
        Ok(storage.get(owner).cloned())
    }

    async fn save(&self, position: &StakePosition) -> ApplicationResult<()> {
        let mut storage = self.storage.write().await;
        storage.insert(position.owner().clone(), position.clone());
        Ok(())
    }
}
