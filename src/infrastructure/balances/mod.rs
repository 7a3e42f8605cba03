//! # Balance Read Paths
//!
//! Independent ways of reading on-chain token balances.
//!
//! - [`RpcBalanceReadPath`]: JSON-RPC 2.0 node endpoint, integer base units.
//! - [`IndexerBalanceReadPath`]: REST indexer, display units.
//!
//! The reconciliation service tries them in configuration order.

pub mod indexer;
pub mod rpc;


pub use indexer::IndexerBalanceReadPath;
pub use rpc::RpcBalanceReadPath;

use crate::application::services::balance_reconciliation::ReadPathError;
use crate::infrastructure::venues::error::VenueError;

/// Maps a shared HTTP client error onto a read path error.
fn read_error(err: VenueError) -> ReadPathError {
    match err {
        VenueError::ProtocolError { message } => ReadPathError::Malformed(message),
        other => ReadPathError::Unavailable(other.to_string()),
    }
}
