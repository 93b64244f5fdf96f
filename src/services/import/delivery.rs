use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::config::DeliveryConfig;
use crate::ports::ytmusic::{PlaylistStore, RemoteError};
use crate::services::import::pacing::Pacer;
use crate::services::import::types::ImportError;

/// Text the remote service puts in responses for operations that went through, even
/// when the surrounding call reported an error.
pub const SUCCESS_MARKER: &str = "STATUS_SUCCEEDED";

/// HTTP statuses that will not get better by retrying.
const PERMANENT_STATUSES: &[u16] = &[400, 401, 403, 404, 422];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Retryable,
    Permanent,
}

/// Decide what an add-call outcome really means.
///
/// The service sometimes raises errors (or returns garbled acknowledgements) for adds
/// that were applied server side. If the success marker appears anywhere in the error
/// text the batch counts as delivered, whatever else the error says.
pub fn classify(outcome: &Result<(), RemoteError>) -> Classification {
    match outcome {
        Ok(()) => Classification::Success,
        Err(err) if err.message.contains(SUCCESS_MARKER) => Classification::Success,
        Err(RemoteError {
            status: Some(status),
            ..
        }) if PERMANENT_STATUSES.contains(status) => Classification::Permanent,
        Err(_) => Classification::Retryable,
    }
}

#[derive(Debug, thiserror::Error)]
enum BatchError {
    #[error("{0}")]
    Retryable(RemoteError),
    #[error("{0}")]
    Permanent(RemoteError),
}

impl BatchError {
    fn is_retryable(&self) -> bool {
        matches!(self, BatchError::Retryable(_))
    }
}

fn into_batch_result(outcome: Result<(), RemoteError>) -> Result<(), BatchError> {
    match (classify(&outcome), outcome) {
        (Classification::Retryable, Err(err)) => Err(BatchError::Retryable(err)),
        (Classification::Permanent, Err(err)) => Err(BatchError::Permanent(err)),
        (_, Err(err)) => {
            log::debug!(
                "Add call reported an error containing {}, counting as delivered: {}",
                SUCCESS_MARKER,
                err
            );
            Ok(())
        }
        (_, Ok(())) => Ok(()),
    }
}

/// Pushes track ids into a playlist in bounded batches.
pub struct DeliveryEngine<'a, P: PlaylistStore> {
    store: &'a P,
    pacer: &'a Pacer,
    config: &'a DeliveryConfig,
}

impl<'a, P: PlaylistStore> DeliveryEngine<'a, P> {
    pub fn new(store: &'a P, pacer: &'a Pacer, config: &'a DeliveryConfig) -> Self {
        Self {
            store,
            pacer,
            config,
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.config.backoff_base_ms))
            .with_max_delay(Duration::from_millis(self.config.backoff_max_ms))
            .with_factor(2.0)
            .with_max_times(self.config.max_attempts.saturating_sub(1) as usize)
    }

    /// Add `video_ids` to the playlist in order.
    ///
    /// Returns exactly one outcome per input id, in input order. A failed batch fails
    /// every id in it; later batches are still attempted.
    pub async fn deliver(
        &self,
        playlist_id: &str,
        video_ids: &[String],
    ) -> Vec<Result<(), ImportError>> {
        let batch_size = self.config.batch_size.max(1);
        let mut outcomes = Vec::with_capacity(video_ids.len());

        for batch in video_ids.chunks(batch_size) {
            self.pacer.before_delivery().await;

            let result = self.deliver_batch(playlist_id, batch).await;
            match &result {
                Ok(()) => log::info!(
                    "  Progress: {}/{} tracks",
                    outcomes.len() + batch.len(),
                    video_ids.len()
                ),
                Err(e) => log::error!("  Batch of {} tracks failed: {}", batch.len(), e),
            }

            outcomes.extend(batch.iter().map(|_| result.clone()));
        }

        outcomes
    }

    async fn deliver_batch(&self, playlist_id: &str, batch: &[String]) -> Result<(), ImportError> {
        let store = self.store;
        let attempt_counter = AtomicU32::new(0);
        let attempts = &attempt_counter;

        let call = move || async move {
            attempts.fetch_add(1, Ordering::Relaxed);
            into_batch_result(store.add_tracks(playlist_id, batch).await)
        };

        call.retry(self.backoff())
            .sleep(tokio::time::sleep)
            .when(|e: &BatchError| e.is_retryable())
            .notify(|e: &BatchError, delay: Duration| {
                log::warn!("Add call failed ({}), retrying in {:?}", e, delay);
            })
            .await
            .map_err(|e| ImportError::DeliveryFailure {
                attempts: attempt_counter.load(Ordering::Relaxed),
                reason: e.to_string(),
            })
    }
}
