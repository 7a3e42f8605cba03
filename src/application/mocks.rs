//! Test doubles shared by the application layer tests.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::balance_reconciliation::{BalanceReadPath, ReadPathError};
use crate::application::services::settlement::{
    SignError, TransactionSigner, TransactionTransport, TransportError,
};
use crate::application::use_cases::staking::{TransferBuilder, TransferInstruction};
use crate::domain::entities::{
    Quote, QuoteBuilder, SignedTransaction, SwapRequest, TxStatus, UnsignedTransaction,
};
use crate::domain::value_objects::{
    Amount, Asset, SlippageBps, Timestamp, TxId, VenueId, WalletAddress,
};
use crate::infrastructure::venues::error::{VenueError, VenueResult};
use crate::infrastructure::venues::traits::VenueAdapter;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn t0() -> Timestamp {
    Timestamp::from_millis(1_700_000_000_000).unwrap()
}

pub fn asset_x() -> Asset {
    Asset::new("mint-x", "X", 6).unwrap()
}

pub fn asset_y() -> Asset {
    Asset::new("mint-y", "Y", 6).unwrap()
}

pub fn owner() -> WalletAddress {
    WalletAddress::new("owner-1")
}

pub fn swap_request(amount: &str) -> SwapRequest {
    SwapRequest::new(
        owner(),
        asset_x(),
        amount.parse().unwrap(),
        asset_y(),
        SlippageBps::DEFAULT,
    )
}

pub fn quote_for(
    venue: &str,
    input: Asset,
    output: Asset,
    estimated_output: &str,
    expires_at: Timestamp,
) -> Quote {
    QuoteBuilder::new(
        VenueId::new(venue),
        input,
        "1.5".parse().unwrap(),
        output,
        estimated_output.parse().unwrap(),
        expires_at,
    )
    .created_at(t0())
    .build()
    .unwrap()
}

async fn maybe_sleep(delay: &Mutex<Option<Duration>>) {
    let delay = *delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Debug, Clone)]
enum QuoteReply {
    Quoting(Amount),
    Failing(VenueError),
    Returning(Quote),
}

/// Scriptable venue adapter.
#[derive(Debug)]
pub struct MockVenue {
    venue_id: VenueId,
    reply: QuoteReply,
    quote_queue: Mutex<VecDeque<VenueResult<Quote>>>,
    build_queue: Mutex<VecDeque<VenueResult<UnsignedTransaction>>>,
    status_queue: Mutex<VecDeque<VenueResult<TxStatus>>>,
    default_status: Mutex<TxStatus>,
    delay: Mutex<Option<Duration>>,
    quote_validity: Duration,
    quote_calls: AtomicU32,
    build_calls: AtomicU32,
    verify_calls: AtomicU32,
}

impl MockVenue {
    fn with_reply(id: &str, reply: QuoteReply) -> Arc<Self> {
        Arc::new(Self {
            venue_id: VenueId::new(id),
            reply,
            quote_queue: Mutex::new(VecDeque::new()),
            build_queue: Mutex::new(VecDeque::new()),
            status_queue: Mutex::new(VecDeque::new()),
            default_status: Mutex::new(TxStatus::Confirmed),
            delay: Mutex::new(None),
            quote_validity: Duration::from_secs(3600),
            quote_calls: AtomicU32::new(0),
            build_calls: AtomicU32::new(0),
            verify_calls: AtomicU32::new(0),
        })
    }

    pub fn quoting(id: &str, estimated_output: &str) -> Arc<Self> {
        Self::with_reply(id, QuoteReply::Quoting(estimated_output.parse().unwrap()))
    }

    pub fn failing(id: &str, error: VenueError) -> Arc<Self> {
        Self::with_reply(id, QuoteReply::Failing(error))
    }

    pub fn returning(id: &str, quote: Quote) -> Arc<Self> {
        Self::with_reply(id, QuoteReply::Returning(quote))
    }

    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn always_pending(self: Arc<Self>) -> Arc<Self> {
        *self.default_status.lock().unwrap() = TxStatus::Pending;
        self
    }

    pub fn queue_quote(&self, result: VenueResult<Quote>) {
        self.quote_queue.lock().unwrap().push_back(result);
    }

    pub fn queue_build(&self, result: VenueResult<UnsignedTransaction>) {
        self.build_queue.lock().unwrap().push_back(result);
    }

    pub fn queue_status(&self, result: VenueResult<TxStatus>) {
        self.status_queue.lock().unwrap().push_back(result);
    }

    pub fn quote_calls(&self) -> u32 {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn build_calls(&self) -> u32 {
        self.build_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> u32 {
        self.verify_calls.load(Ordering::SeqCst)
    }

    fn next_quote(&self, request: &SwapRequest) -> VenueResult<Quote> {
        if let Some(queued) = self.quote_queue.lock().unwrap().pop_front() {
            return queued;
        }
        match &self.reply {
            QuoteReply::Failing(e) => Err(e.clone()),
            QuoteReply::Returning(quote) => Ok(quote.clone()),
            QuoteReply::Quoting(output) => {
                let now = t0();
                QuoteBuilder::new(
                    self.venue_id.clone(),
                    request.input_asset.clone(),
                    request.validated_input().unwrap(),
                    request.output_asset.clone(),
                    *output,
                    now.add_duration(self.quote_validity),
                )
                .slippage(request.max_slippage)
                .created_at(now)
                .build()
                .map_err(|e| VenueError::protocol_error(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl VenueAdapter for MockVenue {
    fn venue_id(&self) -> &VenueId {
        &self.venue_id
    }

    fn timeout_ms(&self) -> u64 {
        6_000
    }

    async fn quote(&self, request: &SwapRequest) -> VenueResult<Quote> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        maybe_sleep(&self.delay).await;
        self.next_quote(request)
    }

    async fn build_transaction(
        &self,
        quote: &Quote,
        _request: &SwapRequest,
    ) -> VenueResult<UnsignedTransaction> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(queued) = self.build_queue.lock().unwrap().pop_front() {
            return queued;
        }
        Ok(
            UnsignedTransaction::new(format!("{}:{}", self.venue_id, quote.id()))
                .with_builder(self.venue_id.clone()),
        )
    }

    async fn verify(&self, _tx_id: &TxId) -> VenueResult<TxStatus> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(queued) = self.status_queue.lock().unwrap().pop_front() {
            return queued;
        }
        Ok(*self.default_status.lock().unwrap())
    }
}

#[derive(Debug, Clone)]
enum SignReply {
    Approve,
    Reject,
    Fail(String),
}

/// Scriptable wallet signer.
#[derive(Debug)]
pub struct MockSigner {
    reply: SignReply,
    delay: Mutex<Option<Duration>>,
    calls: AtomicU32,
}

impl MockSigner {
    fn with_reply(reply: SignReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            delay: Mutex::new(None),
            calls: AtomicU32::new(0),
        })
    }

    pub fn approving() -> Arc<Self> {
        Self::with_reply(SignReply::Approve)
    }

    pub fn rejecting() -> Arc<Self> {
        Self::with_reply(SignReply::Reject)
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::with_reply(SignReply::Fail(message.to_string()))
    }

    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSigner for MockSigner {
    async fn sign(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, SignError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        maybe_sleep(&self.delay).await;
        match &self.reply {
            SignReply::Approve => Ok(SignedTransaction::new(format!("signed:{}", tx.payload()))),
            SignReply::Reject => Err(SignError::UserRejected),
            SignReply::Fail(msg) => Err(SignError::Failed(msg.clone())),
        }
    }
}

/// Scriptable network transport.
#[derive(Debug)]
pub struct MockTransport {
    broadcast_queue: Mutex<VecDeque<Result<TxId, TransportError>>>,
    status_queue: Mutex<VecDeque<Result<TxStatus, TransportError>>>,
    default_status: Mutex<TxStatus>,
    broadcasts: Mutex<Vec<String>>,
    broadcast_calls: AtomicU32,
    status_calls: AtomicU32,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            broadcast_queue: Mutex::new(VecDeque::new()),
            status_queue: Mutex::new(VecDeque::new()),
            default_status: Mutex::new(TxStatus::Confirmed),
            broadcasts: Mutex::new(Vec::new()),
            broadcast_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
        })
    }

    pub fn always_pending(self: Arc<Self>) -> Arc<Self> {
        *self.default_status.lock().unwrap() = TxStatus::Pending;
        self
    }

    pub fn failing_all(self: Arc<Self>) -> Arc<Self> {
        *self.default_status.lock().unwrap() = TxStatus::Failed;
        self
    }

    pub fn queue_broadcast(&self, result: Result<TxId, TransportError>) {
        self.broadcast_queue.lock().unwrap().push_back(result);
    }

    pub fn queue_status(&self, result: Result<TxStatus, TransportError>) {
        self.status_queue.lock().unwrap().push_back(result);
    }

    pub fn broadcast_calls(&self) -> u32 {
        self.broadcast_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Payloads of every broadcast transaction, in order.
    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionTransport for MockTransport {
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<TxId, TransportError> {
        let n = self.broadcast_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let payload = tx.payload().to_string();
        self.broadcasts.lock().unwrap().push(payload);
        if let Some(queued) = self.broadcast_queue.lock().unwrap().pop_front() {
            return queued;
        }
        Ok(TxId::new(format!("tx-{n}")))
    }

    async fn get_status(&self, _tx_id: &TxId) -> Result<TxStatus, TransportError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(queued) = self.status_queue.lock().unwrap().pop_front() {
            return queued;
        }
        Ok(*self.default_status.lock().unwrap())
    }
}

/// Scriptable balance read path.
#[derive(Debug)]
pub struct MockReadPath {
    name: String,
    reply: Mutex<Result<Amount, ReadPathError>>,
    queue: Mutex<VecDeque<Result<Amount, ReadPathError>>>,
    delay: Mutex<Option<Duration>>,
    reads: AtomicU32,
}

impl MockReadPath {
    fn with_reply(name: &str, reply: Result<Amount, ReadPathError>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply: Mutex::new(reply),
            queue: Mutex::new(VecDeque::new()),
            delay: Mutex::new(None),
            reads: AtomicU32::new(0),
        })
    }

    pub fn returning(name: &str, amount: &str) -> Arc<Self> {
        Self::with_reply(name, Ok(amount.parse().unwrap()))
    }

    pub fn failing(name: &str, error: ReadPathError) -> Arc<Self> {
        Self::with_reply(name, Err(error))
    }

    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    /// Replaces the default reply.
    pub fn set(&self, reply: Result<Amount, ReadPathError>) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn queue(&self, reply: Result<Amount, ReadPathError>) {
        self.queue.lock().unwrap().push_back(reply);
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceReadPath for MockReadPath {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_balance(
        &self,
        _owner: &WalletAddress,
        _asset: &Asset,
    ) -> Result<Amount, ReadPathError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        maybe_sleep(&self.delay).await;
        if let Some(queued) = self.queue.lock().unwrap().pop_front() {
            return queued;
        }
        self.reply.lock().unwrap().clone()
    }
}

/// Records transfer instructions and builds a placeholder transaction.
#[derive(Debug, Default)]
pub struct MockTransferBuilder {
    instructions: Mutex<Vec<TransferInstruction>>,
    fail_next: Mutex<Option<String>>,
}

impl MockTransferBuilder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next(&self, reason: &str) {
        *self.fail_next.lock().unwrap() = Some(reason.to_string());
    }

    pub fn instructions(&self) -> Vec<TransferInstruction> {
        self.instructions.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferBuilder for MockTransferBuilder {
    async fn build_transfer(
        &self,
        instruction: &TransferInstruction,
    ) -> ApplicationResult<UnsignedTransaction> {
        self.instructions.lock().unwrap().push(instruction.clone());
        if let Some(reason) = self.fail_next.lock().unwrap().take() {
            return Err(ApplicationError::internal(reason));
        }
        Ok(UnsignedTransaction::new(format!(
            "{}:{}:{}",
            instruction.kind, instruction.from, instruction.amount
        )))
    }
}
