//! Single-flight fetch pipeline: geocode, download, normalize.
//!
//! At most one fetch runs at a time. A request made while another is in
//! flight is rejected with [`FetchRequest::Busy`] instead of being queued, so
//! results reach the foreground in the order their fetches started.

use crate::config::Units;
use crate::datasources::{ForecastSource, Geocoder};
use crate::error::{Result, WeatherlyError};
use crate::logic::normalize::normalize;
use crate::models::WeatherSnapshot;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Messages sent from the background fetch back to the foreground
#[derive(Debug)]
pub enum FetchMessage {
    Completed {
        query: String,
        result: Result<WeatherSnapshot>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRequest {
    Started,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching,
}

/// Holds the in-flight flag; dropping it clears the flag, whether the task
/// finished, failed or was aborted.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
struct FetchPipeline {
    geocoder: Arc<dyn Geocoder>,
    forecasts: Arc<dyn ForecastSource>,
    units: Units,
}

impl FetchPipeline {
    async fn run(&self, query: &str) -> Result<WeatherSnapshot> {
        let location = self.geocoder.resolve(query).await?;
        let feed = self
            .forecasts
            .forecast(location.latitude, location.longitude, self.units)
            .await?;

        let city_name = if location.name.trim().is_empty() {
            feed.city_label
        } else {
            location.name
        };

        normalize(&feed.samples, &city_name, Utc::now())
    }
}

pub struct FetchOrchestrator {
    pipeline: FetchPipeline,
    in_flight: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
    tx: mpsc::UnboundedSender<FetchMessage>,
}

impl FetchOrchestrator {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        forecasts: Arc<dyn ForecastSource>,
        units: Units,
    ) -> (Self, mpsc::UnboundedReceiver<FetchMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            pipeline: FetchPipeline {
                geocoder,
                forecasts,
                units,
            },
            in_flight: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
            tx,
        };
        (orchestrator, rx)
    }

    pub fn state(&self) -> FetchState {
        if self.in_flight.load(Ordering::Acquire) {
            FetchState::Fetching
        } else {
            FetchState::Idle
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.state() == FetchState::Fetching
    }

    /// Start a background fetch for `query`. The outcome arrives as exactly one
    /// [`FetchMessage::Completed`] on the receiver returned by [`Self::new`].
    /// Must be called from within a tokio runtime.
    pub fn request(&self, query: &str) -> FetchRequest {
        let Some(guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Fetch already in progress, ignoring request for '{}'", query);
            return FetchRequest::Busy;
        };

        let query = query.trim().to_string();
        let pipeline = self.pipeline.clone();
        let tx = self.tx.clone();
        tracing::info!("Fetching weather for '{}'", query);

        let handle = tokio::spawn(async move {
            let result = AssertUnwindSafe(pipeline.run(&query))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(WeatherlyError::TaskFailed(panic_message(&*panic)))
                });
            match &result {
                Ok(snapshot) => tracing::info!(
                    "Weather ready for {} ({} hourly, {} daily)",
                    snapshot.city_name,
                    snapshot.hourly.len(),
                    snapshot.daily.len()
                ),
                Err(e) => tracing::warn!("Fetch for '{}' failed: {}", query, e),
            }
            // Idle before the result is visible, so the receiver can start the next fetch
            drop(guard);
            if tx.send(FetchMessage::Completed { query, result }).is_err() {
                tracing::debug!("Fetch result dropped: receiver closed");
            }
        });

        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        FetchRequest::Started
    }

    /// Run the pipeline on the caller's task, still honoring single-flight.
    pub async fn fetch_now(&self, query: &str) -> Result<WeatherSnapshot> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(WeatherlyError::Busy)?;
        self.pipeline.run(query.trim()).await
    }

    /// Give the in-flight task up to `grace` to finish, then abort it. An
    /// aborted fetch reports nothing.
    pub async fn shutdown(&self, grace: Duration) {
        let Some(mut handle) = self.take_task() else {
            return;
        };

        if handle.is_finished() {
            return;
        }

        if self.is_fetching() {
            tracing::info!("Waiting for in-flight fetch to finish...");
        }
        if tokio::time::timeout(grace, &mut handle).await.is_err() {
            tracing::warn!("Fetch still running after {:?}, abandoning it", grace);
            handle.abort();
            // resolves once the task (and its guard) is dropped
            let _ = handle.await;
        }
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "fetch panicked".to_string()
    }
}
