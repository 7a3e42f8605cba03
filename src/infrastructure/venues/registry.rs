//! # Venue Registry
//!
//! Registered venue adapters with their routing settings.
//!
//! The registry owns the priority order the quote aggregator walks. Lower
//! priority values are tried first; ties fall back to venue id so the order
//! is deterministic.
//!
//! # Thread Safety
//!
//! The registry is shared across tasks as `Arc<VenueRegistry>`.

use crate::domain::entities::VenueCapabilities;
use crate::domain::value_objects::VenueId;
use crate::infrastructure::venues::traits::VenueAdapter;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Routing settings for a registered venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueSettings {
    enabled: bool,
    priority: u32,
    capabilities: VenueCapabilities,
}

impl VenueSettings {
    /// Enabled, priority 100, full capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            priority: 100,
            capabilities: VenueCapabilities::full(),
        }
    }

    /// Sets whether the venue is enabled.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the priority (lower is tried first).
    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the capability flags.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: VenueCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns whether the venue is enabled.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the priority.
    #[inline]
    #[must_use]
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Returns the capability flags.
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> VenueCapabilities {
        self.capabilities
    }
}

impl Default for VenueSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// An adapter paired with its settings.
#[derive(Clone)]
pub struct RegisteredVenue {
    /// The adapter.
    pub adapter: Arc<dyn VenueAdapter>,
    /// Its routing settings.
    pub settings: VenueSettings,
}

impl RegisteredVenue {
    /// Shortcut for the adapter's venue id.
    #[must_use]
    pub fn venue_id(&self) -> &VenueId {
        self.adapter.venue_id()
    }
}

impl fmt::Debug for RegisteredVenue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredVenue")
            .field("venue_id", self.adapter.venue_id())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Registry of venue adapters keyed by venue id.
#[derive(Debug, Default)]
pub struct VenueRegistry {
    venues: RwLock<HashMap<VenueId, RegisteredVenue>>,
}

impl VenueRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter with default settings, replacing any previous
    /// adapter with the same id.
    pub async fn register(&self, adapter: Arc<dyn VenueAdapter>) {
        self.register_with_settings(adapter, VenueSettings::default())
            .await;
    }

    /// Registers an adapter with explicit settings.
    pub async fn register_with_settings(
        &self,
        adapter: Arc<dyn VenueAdapter>,
        settings: VenueSettings,
    ) {
        let venue_id = adapter.venue_id().clone();
        let mut venues = self.venues.write().await;
        venues.insert(venue_id, RegisteredVenue { adapter, settings });
    }

    /// Removes a venue. Returns true if it was registered.
    pub async fn unregister(&self, venue_id: &VenueId) -> bool {
        self.venues.write().await.remove(venue_id).is_some()
    }

    /// Looks up an adapter.
    pub async fn get(&self, venue_id: &VenueId) -> Option<Arc<dyn VenueAdapter>> {
        self.venues
            .read()
            .await
            .get(venue_id)
            .map(|v| Arc::clone(&v.adapter))
    }

    /// Looks up a venue's settings.
    pub async fn settings(&self, venue_id: &VenueId) -> Option<VenueSettings> {
        self.venues
            .read()
            .await
            .get(venue_id)
            .map(|v| v.settings.clone())
    }

    /// Enables or disables a venue. Returns true if it was registered.
    pub async fn set_enabled(&self, venue_id: &VenueId, enabled: bool) -> bool {
        let mut venues = self.venues.write().await;
        match venues.get_mut(venue_id) {
            Some(venue) => {
                venue.settings.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Changes a venue's priority. Returns true if it was registered.
    pub async fn set_priority(&self, venue_id: &VenueId, priority: u32) -> bool {
        let mut venues = self.venues.write().await;
        match venues.get_mut(venue_id) {
            Some(venue) => {
                venue.settings.priority = priority;
                true
            }
            None => false,
        }
    }

    /// Enabled venues in routing order.
    pub async fn by_priority(&self) -> Vec<RegisteredVenue> {
        let venues = self.venues.read().await;
        let mut enabled: Vec<RegisteredVenue> = venues
            .values()
            .filter(|v| v.settings.enabled)
            .cloned()
            .collect();
        enabled.sort_by(|a, b| {
            a.settings
                .priority
                .cmp(&b.settings.priority)
                .then_with(|| a.venue_id().cmp(b.venue_id()))
        });
        enabled
    }

    /// Every registered venue id, sorted.
    pub async fn venue_ids(&self) -> Vec<VenueId> {
        let mut ids: Vec<VenueId> = self.venues.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered venues.
    pub async fn len(&self) -> usize {
        self.venues.read().await.len()
    }

    /// Returns true if no venues are registered.
    pub async fn is_empty(&self) -> bool {
        self.venues.read().await.is_empty()
    }
}
