use crate::SiteProfile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    NavigationChanged { from: String, to: String },
    LeftProductPage,
    ReachedTerminalPage,
}

/// Detects location changes. History hooks, popstate and the fallback poll
/// all funnel into `check`, which is a no-op while the location is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationWatcher {
    last_seen_url: String,
}

impl NavigationWatcher {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            last_seen_url: initial_url.into(),
        }
    }

    pub fn last_seen_url(&self) -> &str {
        &self.last_seen_url
    }

    pub fn check(
        &mut self,
        profile: &SiteProfile,
        current_url: &str,
        loop_running: bool,
    ) -> Vec<NavEvent> {
        if current_url == self.last_seen_url {
            return Vec::new();
        }
        let from = std::mem::replace(&mut self.last_seen_url, current_url.to_string());
        let mut events = vec![NavEvent::NavigationChanged {
            from,
            to: current_url.to_string(),
        }];
        if loop_running && !profile.is_product_page(current_url) {
            events.push(NavEvent::LeftProductPage);
        }
        if profile.is_terminal_page(current_url) {
            events.push(NavEvent::ReachedTerminalPage);
        }
        events
    }
}
