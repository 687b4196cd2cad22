/*!
 * Request limiting for drive traversals
 *
 * One limiter is shared by every branch of a traversal so that wide trees
 * cannot put more than `max_in_flight` requests on the backend at once.
 */

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Caps the number of remote requests in flight
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    semaphore: Arc<Semaphore>,
    max_in_flight: usize,
}

/// A permit that must be held for the duration of one remote call
#[derive(Debug)]
pub struct RequestPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl RequestLimiter {
    pub fn new(max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    /// Waits for a free slot.
    ///
    /// The semaphore is never closed, so an acquire error cannot happen in
    /// practice; if it did the call proceeds without a permit.
    pub async fn acquire(&self) -> RequestPermit {
        let start = Instant::now();
        let permit = self.semaphore.clone().acquire_owned().await.ok();

        let wait_time = start.elapsed();
        if wait_time > Duration::from_millis(100) {
            debug!("Request limiter: acquired permit after {:?} wait", wait_time);
        }

        RequestPermit { _permit: permit }
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}
