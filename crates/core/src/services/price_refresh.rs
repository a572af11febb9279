use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::price::PriceMap;
use crate::providers::traits::QuoteFetcher;

/// Default polling period between two refresh cycles.
pub const DEFAULT_POLLING_PERIOD: Duration = Duration::from_secs(15);

/// Reject a zero refresh period.
pub fn check_period(period: Duration) -> Result<(), CoreError> {
    if period.is_zero() {
        return Err(CoreError::ValidationError(
            "Refresh period must be greater than zero".into(),
        ));
    }
    Ok(())
}

/// Lifecycle of the refresh task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Not started yet, or between the end of a cycle and the next wait
    Idle,
    /// Waiting for the next tick or a manual trigger
    Scheduled,
    /// Fetching quotes
    Running,
    /// Terminal: no further fetches or callbacks
    Stopped,
}

/// Read-only view of the symbols that need a price.
pub trait SymbolSource: Send + Sync {
    fn held_symbols(&self) -> Vec<String>;
}

impl<F> SymbolSource for F
where
    F: Fn() -> Vec<String> + Send + Sync,
{
    fn held_symbols(&self) -> Vec<String> {
        self()
    }
}

/// Receives the prices of each completed refresh cycle.
///
/// Called on the refresh worker, never on the control thread. Must not call
/// [`PriceRefreshTask::stop`].
pub trait PriceSink: Send + Sync {
    fn on_cycle_complete(&self, prices: PriceMap);
}

impl<F> PriceSink for F
where
    F: Fn(PriceMap) + Send + Sync,
{
    fn on_cycle_complete(&self, prices: PriceMap) {
        self(prices)
    }
}

/// State shared between the control side and the worker.
struct Shared {
    state: Mutex<RefreshState>,
    auto_refresh: AtomicBool,
    trigger: Notify,
    /// Latched cancellation flag; `true` once `stop()` has been called.
    cancel_tx: watch::Sender<bool>,
    /// Held while the sink runs. `stop()` takes it once after raising the
    /// cancellation flag so that no callback can still be running or start
    /// after `stop()` returns.
    publish_gate: Mutex<()>,
}

impl Shared {
    fn state(&self) -> RefreshState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `Stopped` is terminal and is never overwritten.
    fn set_state(&self, next: RefreshState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != RefreshState::Stopped {
            *state = next;
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }
}

/// Periodic background job fetching a live price for every held symbol.
///
/// The task runs on the tokio runtime given at construction, so no fetch ever
/// blocks the control thread. Each completed cycle hands exactly one
/// [`PriceMap`] to the sink; symbols whose quote was unavailable are simply
/// absent from the map.
pub struct PriceRefreshTask {
    runtime: Handle,
    fetcher: Arc<dyn QuoteFetcher>,
    symbols: Arc<dyn SymbolSource>,
    sink: Arc<dyn PriceSink>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PriceRefreshTask {
    pub fn new(
        runtime: Handle,
        fetcher: Arc<dyn QuoteFetcher>,
        symbols: Arc<dyn SymbolSource>,
        sink: Arc<dyn PriceSink>,
    ) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            runtime,
            fetcher,
            symbols,
            sink,
            shared: Arc::new(Shared {
                state: Mutex::new(RefreshState::Idle),
                auto_refresh: AtomicBool::new(true),
                trigger: Notify::new(),
                cancel_tx,
                publish_gate: Mutex::new(()),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Begin refreshing every `period`. The first cycle runs immediately.
    ///
    /// Calling `start` on a running task is a no-op. Fails once the task has
    /// been stopped, or if `period` is zero.
    pub fn start(&self, period: Duration) -> Result<(), CoreError> {
        check_period(period)?;
        let mut worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if self.shared.is_cancelled() {
            return Err(CoreError::RefreshStopped);
        }
        if worker.is_some() {
            debug!("Price refresh already running");
            return Ok(());
        }

        let cycle = RefreshWorker {
            fetcher: self.fetcher.clone(),
            symbols: self.symbols.clone(),
            sink: self.sink.clone(),
            shared: self.shared.clone(),
        };
        *worker = Some(self.runtime.spawn(cycle.run(period)));
        info!("Price refresh started (every {}s)", period.as_secs_f64());
        Ok(())
    }

    /// Request an immediate cycle without disturbing the periodic schedule.
    /// Runs even while auto refresh is disabled.
    pub fn trigger_now(&self) -> Result<(), CoreError> {
        if self.shared.is_cancelled() {
            return Err(CoreError::RefreshStopped);
        }
        debug!("Manual price refresh requested");
        self.shared.trigger.notify_one();
        Ok(())
    }

    /// Enable or pause the periodic cycles. Manual triggers are unaffected.
    pub fn set_auto_refresh(&self, enabled: bool) {
        info!("Auto refresh {}", if enabled { "enabled" } else { "disabled" });
        self.shared.auto_refresh.store(enabled, Ordering::SeqCst);
    }

    pub fn auto_refresh(&self) -> bool {
        self.shared.auto_refresh.load(Ordering::SeqCst)
    }

    /// Cancel the task.
    ///
    /// Safe to call at any time and more than once. Never waits on a network
    /// call: in-flight fetches are dropped. Once this returns no fetch is
    /// started and the sink is never called again.
    pub fn stop(&self) {
        self.shared.cancel_tx.send_replace(true);
        // Wait out a callback that passed its cancellation check already.
        drop(self.shared.publish_gate.lock().unwrap_or_else(|e| e.into_inner()));
        self.shared.set_state(RefreshState::Stopped);

        if let Some(handle) = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
            info!("Price refresh stopped");
        }
    }

    pub fn state(&self) -> RefreshState {
        self.shared.state()
    }
}

impl Drop for PriceRefreshTask {
    fn drop(&mut self) {
        self.shared.cancel_tx.send_replace(true);
        if let Some(handle) = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

/// The part of the task that lives on the runtime.
struct RefreshWorker {
    fetcher: Arc<dyn QuoteFetcher>,
    symbols: Arc<dyn SymbolSource>,
    sink: Arc<dyn PriceSink>,
    shared: Arc<Shared>,
}

impl RefreshWorker {
    async fn run(self, period: Duration) {
        let mut cancel = self.shared.cancel_tx.subscribe();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.shared.set_state(RefreshState::Scheduled);
            let manual = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => break,
                _ = self.shared.trigger.notified() => true,
                _ = ticker.tick() => false,
            };

            if !manual && !self.shared.auto_refresh.load(Ordering::SeqCst) {
                continue;
            }

            self.shared.set_state(RefreshState::Running);
            if !self.run_cycle(&mut cancel).await {
                break;
            }
            self.shared.set_state(RefreshState::Idle);
        }
        debug!("Price refresh worker exited");
    }

    /// One refresh cycle. Returns false if cancellation was observed, in
    /// which case nothing was published.
    async fn run_cycle(&self, cancel: &mut watch::Receiver<bool>) -> bool {
        let symbols = self.symbols.held_symbols();
        debug!("Refreshing {} symbol(s)", symbols.len());

        let fetches = symbols.iter().map(|symbol| async move {
            (symbol.clone(), self.fetcher.fetch_last_price(symbol).await)
        });

        let results = tokio::select! {
            biased;
            _ = cancelled(cancel) => return false,
            results = futures::future::join_all(fetches) => results,
        };

        let mut prices = PriceMap::new();
        for (symbol, quote) in results {
            match quote.price() {
                Some(price) => {
                    prices.insert(symbol, price);
                }
                None => warn!("No live price for {symbol} this cycle, keeping previous"),
            }
        }

        let _gate = self
            .shared
            .publish_gate
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if self.shared.is_cancelled() {
            return false;
        }
        self.sink.on_cycle_complete(prices);
        true
    }
}

/// Resolves once the cancellation flag is raised (or its sender is gone).
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|stopped| *stopped).await;
}
