//! # Use Cases
//!
//! Application use cases implementing the user-facing workflows.
//!
//! Both use cases settle through the same sign, broadcast and confirm
//! pipeline and serialize per owner through shared locks.

pub mod execute_swap;
pub mod staking;


pub use execute_swap::SwapOrchestrator;
pub use staking::{
    PositionView, StakePositionRepository, StakingConfig, StakingLedger, StakingReceipt,
    TransferBuilder, TransferInstruction, TransferKind,
};
