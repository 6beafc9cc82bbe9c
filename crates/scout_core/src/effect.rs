use std::time::Duration;

use crate::Affordance;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Locate and press an affordance; answered with `Msg::Activated` or
    /// `Msg::Missing`.
    Activate(Affordance),
    /// Check whether an affordance is currently visible; answered with
    /// `Msg::Probed`.
    Probe {
        target: Affordance,
        purpose: ProbePurpose,
    },
    Schedule {
        task: Task,
        delay: Delay,
    },
    /// Void every pending one-shot continuation.
    CancelPending,
    NavigateBack,
    /// Read the live location; answered with `Msg::LocationObserved`.
    ObserveLocation,
    PersistLedger {
        json: String,
    },
    ClearStoredLedger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    Fixed(Duration),
    /// `base` plus a uniform draw from `[-spread, spread]`.
    Jittered { base: Duration, spread: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePurpose {
    StockPoll,
    StockExit,
    StockExitVerify,
}

/// Deferred continuations. Every handler re-checks the current mode before
/// acting, so a task that outlived its flow is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    SelectComponent,
    ClickNext,
    CheckNavigation,
    PressConfirmSelection,
    PollSecondaryConfirm,
    StockReturnToRoot,
    StockNavigateBack,
    StockPollForward,
    StockVerifyReturn,
}
