//! # Settlement
//!
//! The sign, broadcast and confirm pipeline shared by swaps and staking
//! transfers.
//!
//! The signer and the transport are external collaborators behind traits.
//! Cancellation is only honored while waiting for the signature; once a
//! transaction is handed to the transport it cannot be recalled.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::confirmation::{
    ConfirmationOutcome, ConfirmationPolicy, await_confirmation,
};
use crate::domain::entities::{SignedTransaction, TxStatus, UnsignedTransaction};
use crate::domain::value_objects::TxId;
use crate::infrastructure::venues::traits::VenueAdapter;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Signer failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// The user declined to sign.
    #[error("user rejected signing")]
    UserRejected,
    /// The signer failed.
    #[error("signer failed: {0}")]
    Failed(String),
}

/// Transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The network refused the transaction.
    #[error("{0}")]
    Rejected(String),
    /// The network could not be reached.
    #[error("{0}")]
    Unreachable(String),
}

/// Signs transactions on behalf of the owner.
#[async_trait]
pub trait TransactionSigner: Send + Sync + fmt::Debug {
    /// Signs an unsigned transaction.
    ///
    /// # Errors
    ///
    /// `SignError::UserRejected` if the user declines.
    async fn sign(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, SignError>;
}

/// Submits transactions and reports their status.
#[async_trait]
pub trait TransactionTransport: Send + Sync + fmt::Debug {
    /// Broadcasts a signed transaction.
    ///
    /// # Errors
    ///
    /// `TransportError::Rejected` if the network refuses it,
    /// `TransportError::Unreachable` if it cannot be submitted.
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<TxId, TransportError>;

    /// Reports the status of a broadcast transaction.
    ///
    /// # Errors
    ///
    /// Any error means the status is unknown for now.
    async fn get_status(&self, tx_id: &TxId) -> Result<TxStatus, TransportError>;
}

/// Sender half of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Receiver half of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    /// Creates a linked handle and signal.
    #[must_use]
    pub fn pair() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle(tx), Self(rx))
    }

    /// A signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self(rx)
    }

    /// Returns true if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation is requested; never resolves otherwise.
    pub async fn cancelled(&mut self) {
        if self.0.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Sign, broadcast and confirm.
#[derive(Debug, Clone)]
pub struct Settlement {
    signer: Arc<dyn TransactionSigner>,
    transport: Arc<dyn TransactionTransport>,
    policy: ConfirmationPolicy,
}

impl Settlement {
    /// Creates a settlement pipeline.
    #[must_use]
    pub fn new(
        signer: Arc<dyn TransactionSigner>,
        transport: Arc<dyn TransactionTransport>,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            signer,
            transport,
            policy,
        }
    }

    /// Returns the confirmation policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Waits for the signer, racing the cancellation signal.
    ///
    /// # Errors
    ///
    /// `UserCancelled` on rejection or cancellation, `SigningFailed` otherwise.
    pub async fn sign(
        &self,
        tx: &UnsignedTransaction,
        cancel: &mut CancelSignal,
    ) -> ApplicationResult<SignedTransaction> {
        if cancel.is_cancelled() {
            return Err(ApplicationError::UserCancelled);
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("signing cancelled by user");
                Err(ApplicationError::UserCancelled)
            }
            signed = self.signer.sign(tx) => match signed {
                Ok(signed) => Ok(signed),
                Err(SignError::UserRejected) => Err(ApplicationError::UserCancelled),
                Err(SignError::Failed(msg)) => Err(ApplicationError::SigningFailed(msg)),
            },
        }
    }

    /// Broadcasts a signed transaction.
    ///
    /// # Errors
    ///
    /// `NetworkRejected` or `TransportFailure`, each carrying the transport's
    /// message verbatim.
    pub async fn broadcast(&self, tx: &SignedTransaction) -> ApplicationResult<TxId> {
        match self.transport.broadcast(tx).await {
            Ok(tx_id) => {
                debug!(%tx_id, "transaction broadcast");
                Ok(tx_id)
            }
            Err(TransportError::Rejected(msg)) => Err(ApplicationError::NetworkRejected(msg)),
            Err(TransportError::Unreachable(msg)) => Err(ApplicationError::TransportFailure(msg)),
        }
    }

    /// Polls until the transaction is final or the budget runs out.
    ///
    /// When `venue` is given its `verify` is asked first; if it errors the
    /// transport's status is used, and if that errors too the poll counts as
    /// pending.
    pub async fn confirm(
        &self,
        tx_id: &TxId,
        venue: Option<&Arc<dyn VenueAdapter>>,
    ) -> ConfirmationOutcome {
        let outcome = await_confirmation(&self.policy, || self.poll_status(tx_id, venue)).await;
        match outcome {
            ConfirmationOutcome::Confirmed { polls } => {
                info!(%tx_id, polls, "transaction confirmed");
            }
            ConfirmationOutcome::Failed { polls } => {
                warn!(%tx_id, polls, "transaction failed on chain");
            }
            ConfirmationOutcome::TimedOut { polls } => {
                warn!(%tx_id, polls, "transaction unconfirmed at timeout");
            }
        }
        outcome
    }

    async fn poll_status(&self, tx_id: &TxId, venue: Option<&Arc<dyn VenueAdapter>>) -> TxStatus {
        if let Some(venue) = venue {
            match venue.verify(tx_id).await {
                Ok(status) => return status,
                Err(e) => debug!(venue = %venue.venue_id(), error = %e, "venue verify failed"),
            }
        }
        match self.transport.get_status(tx_id).await {
            Ok(status) => status,
            Err(e) => {
                debug!(%tx_id, error = %e, "status unavailable");
                TxStatus::Pending
            }
        }
    }

    /// Runs the full pipeline for a transaction with no venue verifier.
    ///
    /// # Errors
    ///
    /// Signing and broadcast errors as in [`sign`](Self::sign) and
    /// [`broadcast`](Self::broadcast); `TransactionFailed` or
    /// `ConfirmationTimeout` after broadcast.
    pub async fn settle(
        &self,
        tx: &UnsignedTransaction,
        cancel: &mut CancelSignal,
    ) -> ApplicationResult<TxId> {
        let signed = self.sign(tx, cancel).await?;
        let tx_id = self.broadcast(&signed).await?;
        match self.confirm(&tx_id, None).await {
            ConfirmationOutcome::Confirmed { .. } => Ok(tx_id),
            ConfirmationOutcome::Failed { .. } => {
                Err(ApplicationError::TransactionFailed { tx_id })
            }
            ConfirmationOutcome::TimedOut { .. } => {
                Err(ApplicationError::ConfirmationTimeout { tx_id })
            }
        }
    }
}
