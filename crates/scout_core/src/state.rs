use std::sync::Arc;

use crate::view_model::EngineViewModel;
use crate::{DiscoveryLedger, EngineSettings, ItemId, NavigationWatcher, SiteProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    Idle,
    Running,
    WaitingConfirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockWaitMode {
    #[default]
    Off,
    Polling,
}

/// Why the loop last returned to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    UserStopped,
    LeftProductPage,
    SelectionConfirmed,
    Completed,
    ConfirmationGaveUp,
    HandedToStockWait,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    mode: LoopMode,
    stock_wait: StockWaitMode,
    stop_reason: Option<StopReason>,
    current_url: String,
    watcher: NavigationWatcher,
    ledger: DiscoveryLedger,
    last_discovered: Option<ItemId>,
    last_payload: Option<String>,
    confirm_attempts: u32,
    stock_polls_left: u32,
    handoff_pending: bool,
    settings: EngineSettings,
    profile: Arc<SiteProfile>,
    dirty: bool,
}

// Hand-written so the engine's per-message take/put never rebuilds a profile.
impl Default for EngineState {
    fn default() -> Self {
        Self {
            mode: LoopMode::default(),
            stock_wait: StockWaitMode::default(),
            stop_reason: None,
            current_url: String::new(),
            watcher: NavigationWatcher::default(),
            ledger: DiscoveryLedger::default(),
            last_discovered: None,
            last_payload: None,
            confirm_attempts: 0,
            stock_polls_left: 0,
            handoff_pending: false,
            settings: EngineSettings::default(),
            profile: SiteProfile::shared_default(),
            dirty: false,
        }
    }
}

impl EngineState {
    pub fn new(
        settings: EngineSettings,
        profile: SiteProfile,
        current_url: impl Into<String>,
        ledger: DiscoveryLedger,
    ) -> Self {
        let current_url = current_url.into();
        Self {
            watcher: NavigationWatcher::new(current_url.clone()),
            current_url,
            ledger,
            settings,
            profile: Arc::new(profile),
            ..Self::default()
        }
    }

    pub fn view(&self, now_ms: u64) -> EngineViewModel {
        EngineViewModel::build(self, now_ms)
    }

    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    pub fn stock_wait(&self) -> StockWaitMode {
        self.stock_wait
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn ledger(&self) -> &DiscoveryLedger {
        &self.ledger
    }

    pub fn last_discovered(&self) -> Option<&ItemId> {
        self.last_discovered.as_ref()
    }

    pub fn last_payload(&self) -> Option<&str> {
        self.last_payload.as_deref()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    pub fn is_running(&self) -> bool {
        self.mode == LoopMode::Running
    }

    pub fn on_product_page(&self) -> bool {
        self.profile.is_product_page(&self.current_url)
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_mode(&mut self, mode: LoopMode) {
        if self.mode != mode {
            self.mode = mode;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_stock_wait(&mut self, stock_wait: StockWaitMode) {
        if self.stock_wait != stock_wait {
            self.stock_wait = stock_wait;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_stop_reason(&mut self, reason: Option<StopReason>) {
        self.stop_reason = reason;
    }

    pub(crate) fn settings_mut(&mut self) -> &mut EngineSettings {
        &mut self.settings
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut DiscoveryLedger {
        &mut self.ledger
    }

    pub(crate) fn set_last_discovered(&mut self, id: Option<ItemId>) {
        self.last_discovered = id;
    }

    pub(crate) fn set_last_payload(&mut self, payload: String) {
        self.last_payload = Some(payload);
        self.mark_dirty();
    }

    pub(crate) fn confirm_attempts_mut(&mut self) -> &mut u32 {
        &mut self.confirm_attempts
    }

    pub(crate) fn stock_polls_left_mut(&mut self) -> &mut u32 {
        &mut self.stock_polls_left
    }

    pub(crate) fn set_handoff_pending(&mut self, pending: bool) {
        self.handoff_pending = pending;
    }

    pub(crate) fn take_handoff_pending(&mut self) -> bool {
        std::mem::take(&mut self.handoff_pending)
    }

    /// Run the navigation watcher against `url`, keeping `current_url` in sync.
    pub(crate) fn observe_location(&mut self, url: &str) -> Vec<crate::NavEvent> {
        let running = self.is_running();
        let events = self.watcher.check(&self.profile, url, running);
        if !events.is_empty() {
            self.current_url = url.to_string();
            self.mark_dirty();
        }
        events
    }
}
