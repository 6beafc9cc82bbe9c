use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};
use scout_core::{
    analyze, update, DiscoveryLedger, Effect, EngineSettings, EngineState, EngineViewModel, Msg,
    ProfileError, RangeReport, RequestKind, SiteProfile, Task,
};
use thiserror::Error;

use crate::intercept::{Interception, NetworkInterceptor};
use crate::ports::{PageHost, UiProbe};
use crate::scheduler::{Scheduler, TimerToken};
use crate::store::KeyValueStore;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid site profile: {0}")]
    Profile(#[from] ProfileError),
    #[error("invalid settings: {0}")]
    Settings(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub settings: EngineSettings,
    pub profile: SiteProfile,
    /// Fixed jitter seed; entropy-seeded when `None`.
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn with_product_pattern(mut self, pattern: &str) -> Result<Self, EngineError> {
        self.profile = SiteProfile::with_product_pattern(pattern)?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), EngineError> {
        let s = &self.settings;
        if s.nav_poll_interval.is_zero() {
            return Err(EngineError::Settings("nav_poll_interval must be positive"));
        }
        if s.stock_poll_interval.is_zero() {
            return Err(EngineError::Settings("stock_poll_interval must be positive"));
        }
        if s.confirm_attempt_limit == Some(0) {
            return Err(EngineError::Settings("confirm_attempt_limit must be at least 1"));
        }
        Ok(())
    }
}

/// Host capabilities injected into an engine.
pub struct EnginePorts {
    pub probe: Box<dyn UiProbe>,
    pub page: Box<dyn PageHost>,
    pub store: Box<dyn KeyValueStore>,
}

/// One automation engine per page load. Owns the state machine, the timer
/// queue and the interceptor; executes effects against the host ports.
pub struct Engine {
    state: EngineState,
    scheduler: Scheduler<Task>,
    interceptor: NetworkInterceptor,
    intercepted: mpsc::Receiver<Interception>,
    nav_poll: TimerToken,
    ports: EnginePorts,
    inbox: VecDeque<Msg>,
}

impl Engine {
    pub fn create(
        config: EngineConfig,
        ports: EnginePorts,
        now_ms: u64,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let EngineConfig {
            settings,
            profile,
            seed,
        } = config;

        let location = ports.page.location();
        let key = profile.storage_key(&location);
        let stored = match ports.store.get(&key) {
            Ok(stored) => stored,
            Err(err) => {
                engine_warn!("Could not read stored ledger {}: {}", key, err);
                None
            }
        };
        let ledger = DiscoveryLedger::restore_or_empty(stored.as_deref());

        let mut scheduler = match seed {
            Some(seed) => Scheduler::with_seed(now_ms, seed),
            None => Scheduler::new(now_ms),
        };
        let nav_poll = scheduler.every(settings.nav_poll_interval, Task::CheckNavigation);

        let mut interceptor = NetworkInterceptor::new(profile.clone());
        let intercepted = interceptor.subscribe();

        engine_info!("Engine created at {} ({} stored records)", location, ledger.len());

        Ok(Self {
            state: EngineState::new(settings, profile, location, ledger),
            scheduler,
            interceptor,
            intercepted,
            nav_poll,
            ports,
            inbox: VecDeque::new(),
        })
    }

    /// Cancel every timer, drop interceptor subscribers and release host hooks.
    pub fn destroy(mut self) {
        self.scheduler.shutdown();
        self.interceptor.detach();
        self.ports.page.detach();
        engine_info!("Engine destroyed");
    }

    pub fn start(&mut self) {
        self.dispatch(Msg::StartRequested);
    }

    pub fn stop(&mut self) {
        self.dispatch(Msg::StopRequested);
    }

    pub fn toggle(&mut self) {
        self.dispatch(Msg::ToggleLoop);
    }

    pub fn wait_for_stock(&mut self) {
        self.dispatch(Msg::StockWaitRequested);
    }

    pub fn stop_waiting_for_stock(&mut self) {
        self.dispatch(Msg::StockWaitStopRequested);
    }

    pub fn toggle_stock_wait(&mut self) {
        self.dispatch(Msg::ToggleStockWait);
    }

    pub fn reset_ledger(&mut self) {
        self.dispatch(Msg::ResetLedger);
    }

    pub fn set_delays(&mut self, base: Duration, jitter: Duration) {
        self.dispatch(Msg::DelaysChanged { base, jitter });
    }

    /// Host adapter hook: a request is about to be sent.
    pub fn request_opened(&self, method: &str, url: &str) -> RequestKind {
        self.interceptor.open(method, url)
    }

    /// Host adapter hook: a request reached its terminal state.
    pub fn request_completed(&mut self, kind: RequestKind, status: u16, body: &str) {
        self.interceptor.complete(kind, status, body);
        self.drain_interceptions();
    }

    /// Host adapter hook: `pushState`/`replaceState` ran.
    pub fn history_mutated(&mut self) {
        self.dispatch(Msg::HistoryMutated);
    }

    /// Host adapter hook: a popstate event fired.
    pub fn pop_state(&mut self) {
        self.dispatch(Msg::PopState);
    }

    /// Fire every continuation due at or before `now_ms`, in deadline order.
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some((token, task)) = self.scheduler.pop_due(now_ms) {
            if token != self.nav_poll {
                engine_trace!("Firing {:?}", task);
            }
            self.dispatch(Msg::TimerFired(task));
        }
        self.scheduler.advance_clock(now_ms);
    }

    pub fn advance_by(&mut self, elapsed: Duration) {
        let now = self
            .scheduler
            .now_ms()
            .saturating_add(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self.advance_to(now);
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn view(&self) -> EngineViewModel {
        self.state.view(self.now_ms())
    }

    pub fn range_report(&self) -> Option<RangeReport> {
        analyze(self.state.ledger())
    }

    /// Pending one-shot continuations (the navigation poll is not counted).
    pub fn pending_continuations(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn pending_tasks(&self) -> Vec<Task> {
        self.scheduler
            .pending_tasks()
            .map(|(_, task)| *task)
            .collect()
    }

    /// Whether the view changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    fn drain_interceptions(&mut self) {
        while let Ok(interception) = self.intercepted.try_recv() {
            self.dispatch(Msg::PayloadObserved(interception.body));
            if let Some(event) = interception.event {
                let at_ms = self.now_ms();
                self.dispatch(Msg::Network { event, at_ms });
            }
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        self.inbox.push_back(msg);
        while let Some(msg) = self.inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            for effect in effects {
                self.run_effect(effect);
            }
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Activate(target) => {
                let criteria = self.state.profile().selectors.criteria(target);
                let probe = &mut self.ports.probe;
                let found = probe
                    .locate(criteria)
                    .filter(|element| !criteria.visible || probe.is_visible(*element));
                match found {
                    Some(element) => {
                        probe.activate(element);
                        self.inbox.push_back(Msg::Activated(target));
                    }
                    None => self.inbox.push_back(Msg::Missing(target)),
                }
            }
            Effect::Probe { target, purpose } => {
                let criteria = self.state.profile().selectors.criteria(target);
                let probe = &self.ports.probe;
                let visible = probe
                    .locate(criteria)
                    .is_some_and(|element| probe.is_visible(element));
                self.inbox.push_back(Msg::Probed {
                    target,
                    purpose,
                    visible,
                });
            }
            Effect::Schedule { task, delay } => {
                self.scheduler.after_delay(delay, task);
            }
            Effect::CancelPending => {
                let dropped = self.scheduler.cancel_all();
                if dropped > 0 {
                    engine_debug!("Cancelled {} pending continuations", dropped);
                }
            }
            Effect::NavigateBack => self.ports.page.navigate_back(),
            Effect::ObserveLocation => {
                let location = self.ports.page.location();
                self.inbox.push_back(Msg::LocationObserved(location));
            }
            Effect::PersistLedger { json } => {
                let key = self.storage_key();
                if let Err(err) = self.ports.store.set(&key, &json) {
                    engine_warn!("Could not persist ledger {}: {}", key, err);
                }
            }
            Effect::ClearStoredLedger => {
                let key = self.storage_key();
                if let Err(err) = self.ports.store.remove(&key) {
                    engine_warn!("Could not remove stored ledger {}: {}", key, err);
                }
            }
        }
    }

    fn storage_key(&self) -> String {
        self.state.profile().storage_key(&self.ports.page.location())
    }
}

/// Holds the single live engine of a page. Installing a new engine tears the
/// previous one down first, so repeated injection never doubles timers or
/// subscriptions.
#[derive(Default)]
pub struct EngineSlot {
    current: Option<Engine>,
}

impl EngineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(
        &mut self,
        config: EngineConfig,
        ports: EnginePorts,
        now_ms: u64,
    ) -> Result<&mut Engine, EngineError> {
        self.teardown();
        let engine = Engine::create(config, ports, now_ms)?;
        Ok(self.current.insert(engine))
    }

    pub fn get_mut(&mut self) -> Option<&mut Engine> {
        self.current.as_mut()
    }

    pub fn is_installed(&self) -> bool {
        self.current.is_some()
    }

    pub fn teardown(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.destroy();
        }
    }
}
