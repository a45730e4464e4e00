//! Bounded pool running blocking inference off the async workers.

use super::error::InferenceError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A fixed set of model instances, each checked out by at most one job.
///
/// Jobs wait on the semaphore until an instance is free, then run on the
/// blocking thread pool with exclusive ownership of that instance. The
/// blocking task itself returns the instance and its permit, so a caller that
/// stops waiting never takes an instance out of rotation. An instance whose
/// job panicked is dropped and the pool shrinks by one permit.
pub struct InferencePool<M> {
    shared: Arc<Shared<M>>,
}

struct Shared<M> {
    models: Mutex<Vec<M>>,
    permits: Arc<Semaphore>,
    live: AtomicUsize,
}

impl<M: Send + 'static> InferencePool<M> {
    pub fn new(models: Vec<M>) -> Self {
        let live = models.len();
        let permits = Arc::new(Semaphore::new(live));
        if live == 0 {
            permits.close();
        }

        Self {
            shared: Arc::new(Shared {
                models: Mutex::new(models),
                permits,
                live: AtomicUsize::new(live),
            }),
        }
    }

    /// Number of instances still able to run jobs.
    pub fn live(&self) -> usize {
        self.shared.live.load(Ordering::Acquire)
    }

    pub async fn run<F, R>(&self, job: F) -> Result<R, InferenceError>
    where
        F: FnOnce(&mut M) -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = self
            .shared
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| InferenceError::Unavailable("all model instances failed".to_string()))?;

        let mut model = self
            .shared
            .checkout()
            .ok_or_else(|| InferenceError::Unavailable("model instance missing".to_string()))?;

        let shared = self.shared.clone();
        let handle = tokio::task::spawn_blocking(move || {
            match panic::catch_unwind(AssertUnwindSafe(|| job(&mut model))) {
                Ok(result) => {
                    shared.checkin(model, permit);
                    Ok(result)
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    shared.discard(model, permit, &message);
                    Err(InferenceError::Worker(message))
                }
            }
        });

        handle
            .await
            .map_err(|join_error| InferenceError::Worker(join_error.to_string()))?
    }
}

impl<M> Shared<M> {
    fn checkout(&self) -> Option<M> {
        self.models
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop()
    }

    /// The instance goes back before the permit is released.
    fn checkin(&self, model: M, permit: OwnedSemaphorePermit) {
        self.models
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(model);
        drop(permit);
    }

    fn discard(&self, model: M, permit: OwnedSemaphorePermit, reason: &str) {
        drop(model);
        permit.forget();
        let remaining = self.live.fetch_sub(1, Ordering::AcqRel) - 1;
        tracing::error!(
            error = %reason,
            remaining_instances = remaining,
            "Inference worker panicked, model instance discarded"
        );
        if remaining == 0 {
            self.permits.close();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "inference job panicked".to_string())
}
