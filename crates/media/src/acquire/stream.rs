use super::Acquirer;
use crate::error::Result;
use crate::slot::MediaSlot;
use crate::{AcquisitionRequest, Owner, OwnerMedia};
use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::pin;

/// Progress events emitted by [`Acquirer::acquire_stream`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`Planned`](Self::Planned): exactly once, with the number of slots.
/// 3. [`Acquired`](Self::Acquired): once per slot, in completion order.
/// 4. [`Complete`](Self::Complete): exactly once.
///
/// A batch that fails validation yields a single `Err` after
/// [`Started`](Self::Started) and ends there.
#[derive(Debug)]
pub enum AcquireEvent {
    Started,
    Planned(usize),
    /// A slot has settled as downloaded or fallback.
    Acquired(MediaSlot),
    Complete,
}

impl Acquirer {
    /// Streams [`AcquireEvent`]s while acquiring every request for `owner`.
    ///
    /// The whole batch is validated before any fetch: an invalid slug, more
    /// requests than the per-owner limit, or two requests sharing a storage
    /// path all fail it outright. After that every slot settles independently,
    /// up to the configured concurrency at a time. Slots are started in
    /// `(role, order)` sequence and the next one is promoted as each finishes.
    pub fn acquire_stream<'a>(
        &'a self,
        owner: &'a Owner,
        requests: Vec<AcquisitionRequest>,
    ) -> impl Stream<Item = Result<AcquireEvent>> + 'a {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            yield Ok(AcquireEvent::Started);

            let planned = match self.plan(owner, requests) {
                Ok(planned) => planned,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            tracing::debug!(
                owner = %owner.id,
                backend = self.backend.name(),
                slots = planned.len(),
                concurrency = self.concurrency,
                "Batch planned"
            );
            yield Ok(AcquireEvent::Planned(planned.len()));

            let mut queued: VecDeque<_> =
                planned.into_iter().map(|(path, request)| self.acquire_resolved(owner, path, request)).collect();
            let mut processing = FuturesUnordered::new();
            processing.extend(queued.drain(..self.concurrency.min(queued.len())));
            while let Some(slot) = processing.next().await {
                yield Ok(AcquireEvent::Acquired(slot));
                if let Some(next) = queued.pop_front() {
                    processing.push(next);
                }
            }

            yield Ok(AcquireEvent::Complete);
        })
    }

    /// Acquire every request for `owner` and collect the settled slots.
    ///
    /// The result holds exactly one slot per request, none of them pending.
    ///
    /// # Errors
    /// Only batch validation errors; see [`acquire_stream`](Self::acquire_stream).
    pub async fn acquire_batch(&self, owner: &Owner, requests: Vec<AcquisitionRequest>) -> Result<OwnerMedia> {
        let mut events = pin!(self.acquire_stream(owner, requests));
        let mut slots = Vec::new();
        while let Some(event) = events.next().await {
            if let AcquireEvent::Acquired(slot) = event? {
                slots.push(slot);
            }
        }
        let media = OwnerMedia::new(owner.clone(), slots);
        tracing::info!(
            owner = %owner.id,
            downloaded = media.downloaded_count(),
            fallback = media.slots().len() - media.downloaded_count(),
            "Batch complete"
        );
        Ok(media)
    }
}
