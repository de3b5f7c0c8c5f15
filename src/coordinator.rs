//! Event dispatch between the map and the data side.
//!
//! The coordinator is owned by the UI thread and every method runs on it.
//! Fetches run on worker threads and report back through a channel; results
//! are applied only when [`InteractionCoordinator::poll`] (or
//! [`InteractionCoordinator::wait_for_completion`]) drains that channel, so all
//! state changes happen one at a time, in arrival order.
//!
//! Each click takes a new request token. A completion whose token is not the
//! latest one is stale and gets dropped, which keeps a slow answer for an
//! earlier click from overwriting the data of a later one.

use crate::api::{IndicatorClient, IndicatorSource};
use crate::catalog::IndicatorCatalog;
use crate::config::ExplorerConfig;
use crate::error::{FailureKind, Failure, FetchError};
use crate::highlight::HighlightController;
use crate::models::{CountryCode, CountryDataset, CountryFeature};
use crate::resolver::{CodeResolver, Resolution};
use crate::tooltip::{TooltipController, TooltipState};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Number of failure records kept for diagnostics.
pub const FAILURE_LOG_CAPACITY: usize = 64;

/// Identifies one click-initiated request. Strictly increasing.
pub type RequestToken = u64;

#[derive(Debug)]
struct Completion {
    token: RequestToken,
    country: String,
    result: Result<CountryDataset, FetchError>,
}

/// What happened when a completion was processed.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    /// A dataset is now on display for `country`.
    Applied { country: String },
    /// The current request failed; the dataset was cleared.
    Failed { country: String, kind: FailureKind },
    /// A newer click had already been made; result dropped.
    Superseded { country: String },
}

pub struct InteractionCoordinator {
    resolver: CodeResolver,
    source: Arc<dyn IndicatorSource>,
    highlight: HighlightController,
    tooltip: TooltipController,
    dataset: Option<CountryDataset>,
    selected: Option<String>,
    latest: RequestToken,
    pending: Option<RequestToken>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    failures: VecDeque<Failure>,
}

impl InteractionCoordinator {
    pub fn new(
        resolver: CodeResolver,
        source: impl IndicatorSource,
        flash_duration: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            resolver,
            source: Arc::new(source),
            highlight: HighlightController::new(flash_duration),
            tooltip: TooltipController::new(),
            dataset: None,
            selected: None,
            latest: 0,
            pending: None,
            tx,
            rx,
            failures: VecDeque::new(),
        }
    }

    /// Built-in tables and a live API client configured from `config`.
    pub fn from_config(config: &ExplorerConfig) -> anyhow::Result<Self> {
        let client = IndicatorClient::new(config, IndicatorCatalog::builtin())?;
        Ok(Self::new(
            CodeResolver::builtin(),
            client,
            config.flash_duration(),
        ))
    }

    // ---- pointer events -------------------------------------------------

    pub fn hover(&mut self, feature: &CountryFeature, x: f32, y: f32) {
        self.tooltip.hover(&feature.name, x, y);
    }

    pub fn mouse_move(&mut self, x: f32, y: f32) {
        self.tooltip.move_to(x, y);
    }

    pub fn mouse_leave(&mut self) {
        self.tooltip.leave();
    }

    /// Flash the feature, resolve it and start a fetch.
    ///
    /// Returns the token of the started request, or `None` when the name has
    /// no country code (the dataset is cleared in that case).
    pub fn click(&mut self, feature: &CountryFeature, now: Instant) -> Option<RequestToken> {
        self.highlight.flash(&feature.name, now);
        self.selected = Some(feature.name.clone());

        self.latest += 1;
        let token = self.latest;

        let code = match self.resolver.resolve(&feature.name) {
            Resolution::Resolved(code) => code,
            Resolution::Unresolved => {
                self.dataset = None;
                self.pending = None;
                self.record(Failure::new(
                    FailureKind::ResolutionFailure,
                    &feature.name,
                    "no country code for this name",
                ));
                return None;
            }
        };

        info!("request #{token}: {} -> {}", feature.name, code);
        self.pending = Some(token);
        self.spawn_fetch(token, feature.name.clone(), code);
        Some(token)
    }

    fn spawn_fetch(&mut self, token: RequestToken, country: String, code: CountryCode) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let worker_country = country.clone();
        let spawned = thread::Builder::new()
            .name(format!("wbi-fetch-{token}"))
            .spawn(move || {
                let result = source.fetch(&code);
                // The receiver lives as long as the coordinator; a failed send
                // only means the coordinator is gone.
                let _ = tx.send(Completion {
                    token,
                    country: worker_country,
                    result,
                });
            });
        if let Err(e) = spawned {
            // Deliver the failure through the normal path so ordering holds.
            let _ = self.tx.send(Completion {
                token,
                country,
                result: Err(FetchError::Transport(format!("spawn fetch worker: {e}"))),
            });
        }
    }

    // ---- event loop -----------------------------------------------------

    /// Fire the highlight timer if due and apply every completion that has
    /// arrived, oldest first.
    pub fn poll(&mut self, now: Instant) -> Vec<Settled> {
        self.highlight.tick(now);
        let mut out = Vec::new();
        while let Ok(c) = self.rx.try_recv() {
            out.push(self.apply(c));
        }
        out
    }

    /// Block up to `timeout` for the next completion and apply it.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> Option<Settled> {
        match self.rx.recv_timeout(timeout) {
            Ok(c) => Some(self.apply(c)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn apply(&mut self, c: Completion) -> Settled {
        if c.token != self.latest {
            debug!("request #{} for {} superseded by #{}", c.token, c.country, self.latest);
            self.record(Failure::new(
                FailureKind::Superseded,
                &c.country,
                format!("request #{} replaced by #{}", c.token, self.latest),
            ));
            return Settled::Superseded { country: c.country };
        }

        self.pending = None;
        match c.result {
            Ok(dataset) => {
                info!("request #{}: {} rows for {}", c.token, dataset.len(), c.country);
                self.dataset = Some(dataset);
                Settled::Applied { country: c.country }
            }
            Err(e) => {
                let kind = FailureKind::from(&e);
                self.dataset = None;
                self.record(Failure::new(kind, &c.country, e.to_string()));
                Settled::Failed {
                    country: c.country,
                    kind,
                }
            }
        }
    }

    fn record(&mut self, failure: Failure) {
        if failure.kind != FailureKind::Superseded {
            warn!("{}", failure);
        }
        if self.failures.len() == FAILURE_LOG_CAPACITY {
            self.failures.pop_front();
        }
        self.failures.push_back(failure);
    }

    // ---- read side ------------------------------------------------------

    pub fn dataset(&self) -> Option<&CountryDataset> {
        self.dataset.as_ref()
    }

    /// Name of the most recently clicked country.
    pub fn selected_country(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn tooltip(&self) -> &TooltipState {
        self.tooltip.state()
    }

    pub fn highlight(&self) -> &HighlightController {
        &self.highlight
    }

    pub fn is_highlighted(&self, country: &str, now: Instant) -> bool {
        self.highlight.is_highlighted(country, now)
    }

    /// True while the latest request has not settled.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn latest_token(&self) -> RequestToken {
        self.latest
    }

    /// Recorded failures, oldest first.
    pub fn failures(&self) -> impl Iterator<Item = &Failure> + '_ {
        self.failures.iter()
    }

    pub fn last_failure(&self) -> Option<&Failure> {
        self.failures.back()
    }

    /// How long the event loop may sleep before the highlight needs a tick.
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        self.highlight.time_remaining(now)
    }
}
