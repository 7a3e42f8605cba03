//! # Venue Adapters
//!
//! The [`VenueAdapter`] contract, the generic HTTP implementation and the
//! registry the quote aggregator routes over.

pub mod error;
pub mod http_client;
pub mod http_venue;
pub mod registry;
pub mod traits;


pub use error::{VenueError, VenueResult};
pub use http_venue::{HttpVenueAdapter, HttpVenueConfig};
pub use registry::{RegisteredVenue, VenueRegistry, VenueSettings};
pub use traits::VenueAdapter;
