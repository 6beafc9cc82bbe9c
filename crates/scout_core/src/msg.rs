use std::time::Duration;

use crate::{Affordance, NetEvent, ProbePurpose, Task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked the discovery loop to start.
    StartRequested,
    /// User asked everything to stop.
    StopRequested,
    /// Start when idle, stop when active.
    ToggleLoop,
    StockWaitRequested,
    StockWaitStopRequested,
    ToggleStockWait,
    /// Drop every record and the stored copy.
    ResetLedger,
    /// User edited the base delay or jitter inputs.
    DelaysChanged { base: Duration, jitter: Duration },
    /// Classified request completed; `at_ms` is the engine clock.
    Network { event: NetEvent, at_ms: u64 },
    /// Raw body of a classified response, kept for inspection.
    PayloadObserved(String),
    /// A history entry was pushed/replaced by the page.
    HistoryMutated,
    /// The page handled a popstate.
    PopState,
    LocationObserved(String),
    TimerFired(Task),
    Activated(Affordance),
    Missing(Affordance),
    Probed {
        target: Affordance,
        purpose: ProbePurpose,
        visible: bool,
    },
    NoOp,
}
