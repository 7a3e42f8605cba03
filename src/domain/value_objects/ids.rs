//! # Identity Value Objects
//!
//! Type-safe identity wrappers for domain identifiers.
//!
//! ## UUID-based Identifiers
//!
//! - [`SwapId`] - Swap request identifier
//! - [`QuoteId`] - Quote identifier
//!
//! ## String-based Identifiers
//!
//! - [`VenueId`] - Venue identifier
//! - [`WalletAddress`] - On-chain owner or account address
//! - [`AssetId`] - Asset identifier (mint or contract address)
//! - [`TxId`] - Transaction signature returned by the transport

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates an identifier from an existing UUID.
            #[inline]
            #[must_use]
            pub const fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generates a new random identifier using UUID v4.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the inner UUID value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from a string.
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier and returns the inner String.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

uuid_id! {
    /// Swap request identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use swap_engine::domain::value_objects::ids::SwapId;
    ///
    /// let a = SwapId::new_v4();
    /// let b = SwapId::new_v4();
    /// assert_ne!(a, b);
    /// ```
    SwapId
}

uuid_id! {
    /// Quote identifier, assigned when a venue quote is accepted into the engine.
    QuoteId
}

string_id! {
    /// Venue identifier (aggregator API, direct pool, market maker).
    ///
    /// # Examples
    ///
    /// ```
    /// use swap_engine::domain::value_objects::ids::VenueId;
    ///
    /// let venue_id = VenueId::new("venue-a");
    /// assert_eq!(venue_id.as_str(), "venue-a");
    /// ```
    VenueId
}

string_id! {
    /// Wallet or account address.
    WalletAddress
}

string_id! {
    /// Asset identifier, typically a mint or token contract address.
    AssetId
}

string_id! {
    /// Transaction identifier returned by the transport after broadcast.
    TxId
}
