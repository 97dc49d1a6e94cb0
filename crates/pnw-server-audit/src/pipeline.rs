// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{instrument, warn};

use crate::error::AuditError;
use crate::event::AuditLogEntry;
use crate::sink::AuditSink;
use pnw_server_config::QueueOverflowPolicy;

/// Queues audit entries and fans them out to sinks on a background task.
///
/// The task publishes one entry at a time to all sinks concurrently, so a
/// slow sink fills the queue. Under `DropNewest` a full queue drops the entry
/// with a warning; under `Block` the caller waits for capacity.
#[derive(Clone)]
pub struct AuditService {
	tx: mpsc::Sender<AuditLogEntry>,
	overflow_policy: QueueOverflowPolicy,
	worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AuditService {
	/// Must be called from within a tokio runtime.
	pub fn new(
		queue_capacity: usize,
		overflow_policy: QueueOverflowPolicy,
		sinks: Vec<Arc<dyn AuditSink>>,
	) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity.max(1));

		let worker = tokio::spawn(Self::background_task(rx, sinks));

		Self {
			tx,
			overflow_policy,
			worker: Arc::new(Mutex::new(Some(worker))),
		}
	}

	async fn background_task(mut rx: mpsc::Receiver<AuditLogEntry>, sinks: Vec<Arc<dyn AuditSink>>) {
		while let Some(entry) = rx.recv().await {
			let entry = Arc::new(entry);

			let mut publishes = JoinSet::new();
			for sink in &sinks {
				let sink = Arc::clone(sink);
				let entry = Arc::clone(&entry);

				publishes.spawn(async move {
					if let Err(e) = sink.publish(entry).await {
						warn!(sink = sink.name(), error = %e, "audit sink publish failed");
					}
				});
			}
			while let Some(joined) = publishes.join_next().await {
				if let Err(e) = joined {
					warn!(error = %e, "audit sink task panicked");
				}
			}
		}
	}

	/// Queue an entry. Returns `true` if it was accepted.
	#[instrument(skip(self, entry), fields(event_type = %entry.event_type))]
	pub async fn log(&self, entry: AuditLogEntry) -> bool {
		match self.overflow_policy {
			QueueOverflowPolicy::Block => match self.tx.send(entry).await {
				Ok(()) => true,
				Err(mpsc::error::SendError(dropped)) => {
					warn!(event_type = %dropped.event_type, "audit queue closed, entry dropped");
					false
				}
			},
			QueueOverflowPolicy::DropNewest => match self.tx.try_send(entry) {
				Ok(()) => true,
				Err(TrySendError::Full(dropped)) => {
					warn!(event_type = %dropped.event_type, "audit queue full, entry dropped");
					false
				}
				Err(TrySendError::Closed(_)) => {
					warn!("audit queue closed, entry dropped");
					false
				}
			},
		}
	}

	/// Release this handle and wait for the queue to drain into the sinks.
	///
	/// The queue stays open while other clones are alive, so the wait is capped
	/// at `timeout`.
	pub async fn shutdown(self, timeout: Duration) -> Result<(), AuditError> {
		let worker = self.worker.lock().await.take();
		drop(self);

		let Some(worker) = worker else {
			return Ok(());
		};
		match tokio::time::timeout(timeout, worker).await {
			Ok(Ok(())) => Ok(()),
			Ok(Err(e)) => {
				warn!(error = %e, "audit background task failed");
				Err(AuditError::Shutdown)
			}
			Err(_) => Err(AuditError::DrainTimeout),
		}
	}
}
