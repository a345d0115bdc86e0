//! Off-thread delivery of captures.
//!
//! [`QueuedSink`] is the producer half: it never blocks the instrumented
//! call and drops captures when the queue is full. [`DeliveryWorker`]
//! drains the queue and hands each capture to a [`Transport`]. Delivery
//! order across calls is not guaranteed to match call order once more than
//! one worker or transport retry is involved.

use crate::core::telemetry::{CapturePayload, ExampleSink};
use crate::error::DeliveryError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Final destination of a capture, typically a remote collection service.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn deliver(&self, payload: &CapturePayload) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn deliver(&self, payload: &CapturePayload) -> Result<(), DeliveryError> {
        (**self).deliver(payload).await
    }
}

/// Counters reported by a worker once its queue closes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Bounded, non-blocking sink feeding a [`DeliveryWorker`].
#[derive(Clone)]
pub struct QueuedSink {
    sender: mpsc::Sender<CapturePayload>,
}

impl QueuedSink {
    /// Creates the queue and its worker. A capacity of 0 is raised to 1.
    pub fn new<T: Transport>(transport: T, capacity: usize) -> (Self, DeliveryWorker<T>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self { sender },
            DeliveryWorker {
                receiver,
                transport,
            },
        )
    }

    /// Creates the queue and runs its worker on the current tokio runtime.
    pub fn spawn<T: Transport>(
        transport: T,
        capacity: usize,
    ) -> (Self, tokio::task::JoinHandle<DeliveryStats>) {
        let (sink, worker) = Self::new(transport, capacity);
        (sink, tokio::spawn(worker.run()))
    }

    pub fn try_enqueue(&self, payload: CapturePayload) -> Result<(), DeliveryError> {
        self.sender.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::QueueClosed,
        })
    }
}

impl ExampleSink for QueuedSink {
    fn capture(&self, payload: CapturePayload) -> bool {
        let scope_name = payload.scope_name().to_string();
        match self.try_enqueue(payload) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Dropping example for {}: {}", scope_name, e);
                false
            }
        }
    }
}

/// Drains a [`QueuedSink`] until every sender is dropped.
pub struct DeliveryWorker<T> {
    receiver: mpsc::Receiver<CapturePayload>,
    transport: T,
}

impl<T: Transport> DeliveryWorker<T> {
    pub async fn run(mut self) -> DeliveryStats {
        let mut stats = DeliveryStats::default();
        while let Some(payload) = self.receiver.recv().await {
            match self.transport.deliver(&payload).await {
                Ok(()) => {
                    stats.delivered += 1;
                    log::debug!(
                        "Delivered example {} for {}",
                        payload.capture_id,
                        payload.scope_name()
                    );
                }
                Err(e) => {
                    stats.failed += 1;
                    log::warn!("Failed to send example to API: {}", e);
                }
            }
        }
        log::debug!(
            "Delivery worker stopped: {} delivered, {} failed",
            stats.delivered,
            stats.failed
        );
        stats
    }

    /// Runs the worker on a dedicated thread with its own single-threaded
    /// runtime, for programs that have no runtime of their own.
    pub fn spawn_thread(self) -> std::io::Result<std::thread::JoinHandle<DeliveryStats>> {
        std::thread::Builder::new()
            .name("blackbox-delivery".to_string())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(self.run()),
                    Err(e) => {
                        log::error!("Could not start delivery runtime: {}", e);
                        DeliveryStats::default()
                    }
                }
            })
    }
}
