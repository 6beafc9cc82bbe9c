use std::time::Duration;

/// Timing knobs for the automation loop and the stock waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Base delay between carousel advances.
    pub base_delay: Duration,
    /// Spread applied around `base_delay`.
    pub jitter: Duration,
    pub discovery_select_delay: Duration,
    pub terminal_confirm_delay: Duration,
    pub confirm_retry_interval: Duration,
    pub secondary_confirm_interval: Duration,
    /// Upper bound on confirmation lookups; `None` retries until stopped.
    pub confirm_attempt_limit: Option<u32>,
    pub nav_check_delay: Duration,
    pub nav_poll_interval: Duration,
    pub stock_root_retry: Duration,
    pub stock_back_delay: Duration,
    pub stock_poll_start_delay: Duration,
    pub stock_poll_interval: Duration,
    pub stock_poll_window: Duration,
    pub stock_cycle_restart: Duration,
    pub stock_exit_verify_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            jitter: Duration::from_millis(100),
            discovery_select_delay: Duration::from_millis(350),
            terminal_confirm_delay: Duration::from_secs(1),
            confirm_retry_interval: Duration::from_millis(500),
            secondary_confirm_interval: Duration::from_millis(200),
            confirm_attempt_limit: None,
            nav_check_delay: Duration::from_millis(100),
            nav_poll_interval: Duration::from_secs(1),
            stock_root_retry: Duration::from_secs(2),
            stock_back_delay: Duration::from_secs(5),
            stock_poll_start_delay: Duration::from_millis(500),
            stock_poll_interval: Duration::from_millis(100),
            stock_poll_window: Duration::from_secs(2),
            stock_cycle_restart: Duration::from_secs(1),
            stock_exit_verify_delay: Duration::from_secs(1),
        }
    }
}

impl EngineSettings {
    /// Number of forward-arrow probes that fit in one stock poll window.
    pub fn stock_polls_per_window(&self) -> u32 {
        let interval = self.stock_poll_interval.as_millis().max(1);
        let polls = self.stock_poll_window.as_millis() / interval;
        u32::try_from(polls).unwrap_or(u32::MAX).max(1)
    }
}
