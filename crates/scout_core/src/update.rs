use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};

use crate::{
    Affordance, Delay, Effect, EngineState, LoopMode, Msg, NavEvent, NetEvent, ProbePurpose,
    StockWaitMode, StopReason, Task, Upsert,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: EngineState, msg: Msg) -> (EngineState, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::StartRequested => start(&mut state, &mut effects),
        Msg::StopRequested => stop_all(&mut state, StopReason::UserStopped, &mut effects),
        Msg::ToggleLoop => {
            if state.mode() == LoopMode::Idle {
                start(&mut state, &mut effects);
            } else {
                stop_all(&mut state, StopReason::UserStopped, &mut effects);
            }
        }
        Msg::StockWaitRequested => begin_stock_wait(&mut state, &mut effects),
        Msg::StockWaitStopRequested => end_stock_wait(&mut state, &mut effects),
        Msg::ToggleStockWait => {
            if state.stock_wait() == StockWaitMode::Polling {
                end_stock_wait(&mut state, &mut effects);
            } else {
                begin_stock_wait(&mut state, &mut effects);
            }
        }
        Msg::ResetLedger => {
            state.ledger_mut().clear();
            state.set_last_discovered(None);
            state.mark_dirty();
            engine_info!("Ledger cleared");
            effects.push(Effect::ClearStoredLedger);
        }
        Msg::DelaysChanged { base, jitter } => {
            let settings = state.settings_mut();
            settings.base_delay = base;
            settings.jitter = jitter;
            state.mark_dirty();
        }
        Msg::Network { event, at_ms } => on_network(&mut state, event, at_ms, &mut effects),
        Msg::PayloadObserved(body) => {
            let shown = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|value| serde_json::to_string_pretty(&value).ok())
                .unwrap_or_else(|| "Failed to parse JSON".to_string());
            state.set_last_payload(shown);
        }
        Msg::HistoryMutated | Msg::PopState => {
            let delay = Delay::Fixed(state.settings().nav_check_delay);
            schedule(&mut effects, Task::CheckNavigation, delay);
        }
        Msg::LocationObserved(url) => on_location(&mut state, &url, &mut effects),
        Msg::TimerFired(task) => on_timer(&mut state, task, &mut effects),
        Msg::Activated(target) => on_activated(&mut state, target, &mut effects),
        Msg::Missing(target) => on_missing(&mut state, target, &mut effects),
        Msg::Probed {
            target,
            purpose,
            visible,
        } => on_probed(&mut state, target, purpose, visible, &mut effects),
        Msg::NoOp => {}
    }

    (state, effects)
}

fn schedule(effects: &mut Vec<Effect>, task: Task, delay: Delay) {
    effects.push(Effect::Schedule { task, delay });
}

fn advance_delay(state: &EngineState) -> Delay {
    Delay::Jittered {
        base: state.settings().base_delay,
        spread: state.settings().jitter,
    }
}

fn start(state: &mut EngineState, effects: &mut Vec<Effect>) {
    if state.mode() != LoopMode::Idle {
        engine_debug!("Start ignored: loop is {:?}", state.mode());
        return;
    }
    if state.stock_wait() == StockWaitMode::Polling {
        engine_info!("Start ignored while waiting for stock");
        return;
    }
    if !state.on_product_page() {
        engine_info!("Start ignored: {} is not a product page", state.current_url());
        return;
    }
    state.set_mode(LoopMode::Running);
    state.set_stop_reason(None);
    engine_info!("Loop started");
    effects.push(Effect::Activate(Affordance::Component));
}

fn stop_all(state: &mut EngineState, reason: StopReason, effects: &mut Vec<Effect>) {
    let was_active =
        state.mode() != LoopMode::Idle || state.stock_wait() == StockWaitMode::Polling;
    state.set_mode(LoopMode::Idle);
    state.set_stock_wait(StockWaitMode::Off);
    state.set_handoff_pending(false);
    *state.confirm_attempts_mut() = 0;
    if was_active {
        state.set_stop_reason(Some(reason));
        engine_info!("Stopped ({:?}); clearing pending continuations", reason);
    }
    effects.push(Effect::CancelPending);
}

fn enter_confirmation(state: &mut EngineState, effects: &mut Vec<Effect>) {
    if state.mode() == LoopMode::WaitingConfirmation {
        engine_debug!("Already confirming; ignoring repeated terminal page");
        return;
    }
    engine_info!("Reached terminal page; confirming selection");
    state.set_mode(LoopMode::WaitingConfirmation);
    *state.confirm_attempts_mut() = 0;
    let delay = Delay::Fixed(state.settings().terminal_confirm_delay);
    schedule(effects, Task::PressConfirmSelection, delay);
}

fn retry_confirmation(
    state: &mut EngineState,
    task: Task,
    interval: Duration,
    effects: &mut Vec<Effect>,
) {
    let attempts = state.confirm_attempts_mut();
    *attempts = attempts.saturating_add(1);
    let attempts = *attempts;
    if let Some(limit) = state.settings().confirm_attempt_limit {
        if attempts >= limit {
            engine_warn!("Confirmation not found after {} attempts; giving up", attempts);
            stop_all(state, StopReason::ConfirmationGaveUp, effects);
            return;
        }
    }
    schedule(effects, task, Delay::Fixed(interval));
}

fn begin_stock_wait(state: &mut EngineState, effects: &mut Vec<Effect>) {
    if state.stock_wait() == StockWaitMode::Polling {
        return;
    }
    if state.mode() != LoopMode::Idle {
        stop_all(state, StopReason::HandedToStockWait, effects);
    }
    engine_info!("Waiting for stock");
    state.set_stock_wait(StockWaitMode::Polling);
    effects.push(Effect::Activate(Affordance::CatalogRoot));
}

fn end_stock_wait(state: &mut EngineState, effects: &mut Vec<Effect>) {
    if state.stock_wait() != StockWaitMode::Polling {
        return;
    }
    engine_info!("Stock wait stopped");
    state.set_stock_wait(StockWaitMode::Off);
    effects.push(Effect::CancelPending);
    effects.push(Effect::Probe {
        target: Affordance::NextArrow,
        purpose: ProbePurpose::StockExit,
    });
}

fn on_network(state: &mut EngineState, event: NetEvent, at_ms: u64, effects: &mut Vec<Effect>) {
    match event {
        NetEvent::ItemDiscovered {
            id,
            component_states,
        } => {
            match state
                .ledger_mut()
                .upsert(id.clone(), component_states, at_ms)
            {
                Upsert::Created => engine_info!("Discovered {}", id),
                Upsert::Rediscovered { count } => engine_info!("Rediscovered {} (x{})", id, count),
            }
            state.set_last_discovered(Some(id));
            state.mark_dirty();
            match state.ledger().to_json() {
                Ok(json) => effects.push(Effect::PersistLedger { json }),
                Err(err) => engine_error!("Ledger not persisted: {}", err),
            }
            if state.is_running() {
                let delay = Delay::Fixed(state.settings().discovery_select_delay);
                schedule(effects, Task::SelectComponent, delay);
            }
        }
        NetEvent::AllSlotsReserved => {
            if state.is_running() {
                engine_info!("All slots reserved; moving to the next item");
                schedule(effects, Task::ClickNext, advance_delay(state));
            }
        }
        NetEvent::SelectionConfirmed => {
            if state.is_running() {
                engine_info!("Selection confirmed");
                state.set_mode(LoopMode::Idle);
                state.set_stop_reason(Some(StopReason::SelectionConfirmed));
                effects.push(Effect::CancelPending);
            }
        }
        NetEvent::ParseFailed { kind, reason } => {
            engine_warn!("Could not parse {:?} response: {}", kind, reason);
        }
    }
}

fn on_location(state: &mut EngineState, url: &str, effects: &mut Vec<Effect>) {
    for event in state.observe_location(url) {
        match event {
            NavEvent::NavigationChanged { from, to } => {
                engine_info!("Navigation {} -> {}", from, to);
            }
            NavEvent::LeftProductPage => {
                engine_info!("Left product page");
                stop_all(state, StopReason::LeftProductPage, effects);
            }
            NavEvent::ReachedTerminalPage => enter_confirmation(state, effects),
        }
    }
    if state.take_handoff_pending() {
        start(state, effects);
    }
}

fn on_timer(state: &mut EngineState, task: Task, effects: &mut Vec<Effect>) {
    let mode = state.mode();
    let polling = state.stock_wait() == StockWaitMode::Polling;
    match task {
        Task::SelectComponent if mode == LoopMode::Running => {
            effects.push(Effect::Activate(Affordance::Component));
        }
        Task::ClickNext if mode == LoopMode::Running => {
            effects.push(Effect::Activate(Affordance::NextArrow));
        }
        Task::CheckNavigation => effects.push(Effect::ObserveLocation),
        Task::PressConfirmSelection if mode == LoopMode::WaitingConfirmation => {
            effects.push(Effect::Activate(Affordance::ConfirmSelection));
        }
        Task::PollSecondaryConfirm if mode == LoopMode::WaitingConfirmation => {
            effects.push(Effect::Activate(Affordance::SecondaryConfirm));
        }
        Task::StockReturnToRoot if polling => {
            effects.push(Effect::Activate(Affordance::CatalogRoot));
        }
        Task::StockNavigateBack if polling => {
            engine_info!("Returning to the product view");
            effects.push(Effect::NavigateBack);
            let polls = state.settings().stock_polls_per_window();
            *state.stock_polls_left_mut() = polls;
            let delay = Delay::Fixed(state.settings().stock_poll_start_delay);
            schedule(effects, Task::StockPollForward, delay);
        }
        Task::StockPollForward if polling => {
            effects.push(Effect::Probe {
                target: Affordance::NextArrow,
                purpose: ProbePurpose::StockPoll,
            });
        }
        Task::StockVerifyReturn => {
            effects.push(Effect::Probe {
                target: Affordance::NextArrow,
                purpose: ProbePurpose::StockExitVerify,
            });
        }
        stale => engine_debug!("Dropping stale {:?} (mode {:?})", stale, mode),
    }
}

fn on_activated(state: &mut EngineState, target: Affordance, effects: &mut Vec<Effect>) {
    match target {
        Affordance::Component | Affordance::NextArrow => {
            engine_debug!("Pressed {:?}", target);
        }
        Affordance::ConfirmSelection if state.mode() == LoopMode::WaitingConfirmation => {
            engine_info!("Selection submitted; waiting for confirmation control");
            *state.confirm_attempts_mut() = 0;
            effects.push(Effect::Activate(Affordance::SecondaryConfirm));
        }
        Affordance::SecondaryConfirm if state.mode() == LoopMode::WaitingConfirmation => {
            engine_info!("Confirmation pressed; flow complete");
            stop_all(state, StopReason::Completed, effects);
        }
        Affordance::CatalogRoot if state.stock_wait() == StockWaitMode::Polling => {
            let delay = Delay::Fixed(state.settings().stock_back_delay);
            schedule(effects, Task::StockNavigateBack, delay);
        }
        _ => engine_debug!("Ignoring late activation of {:?}", target),
    }
}

fn on_missing(state: &mut EngineState, target: Affordance, effects: &mut Vec<Effect>) {
    match target {
        Affordance::Component | Affordance::NextArrow if state.is_running() => {
            engine_debug!("{:?} not available; advancing later", target);
            schedule(effects, Task::ClickNext, advance_delay(state));
        }
        Affordance::ConfirmSelection if state.mode() == LoopMode::WaitingConfirmation => {
            let interval = state.settings().confirm_retry_interval;
            retry_confirmation(state, Task::PressConfirmSelection, interval, effects);
        }
        Affordance::SecondaryConfirm if state.mode() == LoopMode::WaitingConfirmation => {
            let interval = state.settings().secondary_confirm_interval;
            retry_confirmation(state, Task::PollSecondaryConfirm, interval, effects);
        }
        Affordance::CatalogRoot if state.stock_wait() == StockWaitMode::Polling => {
            engine_debug!("Catalog root not found; retrying");
            let delay = Delay::Fixed(state.settings().stock_root_retry);
            schedule(effects, Task::StockReturnToRoot, delay);
        }
        _ => engine_debug!("Ignoring late miss of {:?}", target),
    }
}

fn on_probed(
    state: &mut EngineState,
    target: Affordance,
    purpose: ProbePurpose,
    visible: bool,
    effects: &mut Vec<Effect>,
) {
    match purpose {
        ProbePurpose::StockPoll => {
            if state.stock_wait() != StockWaitMode::Polling {
                return;
            }
            if visible {
                engine_info!("{:?} visible; stock available, handing back to the loop", target);
                state.set_stock_wait(StockWaitMode::Off);
                state.set_handoff_pending(true);
                effects.push(Effect::ObserveLocation);
                return;
            }
            let left = state.stock_polls_left_mut();
            *left = left.saturating_sub(1);
            if *left > 0 {
                let delay = Delay::Fixed(state.settings().stock_poll_interval);
                schedule(effects, Task::StockPollForward, delay);
            } else {
                engine_info!("No stock within the poll window; restarting cycle");
                let delay = Delay::Fixed(state.settings().stock_cycle_restart);
                schedule(effects, Task::StockReturnToRoot, delay);
            }
        }
        ProbePurpose::StockExit => {
            if visible {
                engine_info!("Already on the product view");
            } else {
                engine_info!("Navigating back to the product view");
                effects.push(Effect::NavigateBack);
                let delay = Delay::Fixed(state.settings().stock_exit_verify_delay);
                schedule(effects, Task::StockVerifyReturn, delay);
            }
        }
        ProbePurpose::StockExitVerify => {
            if visible {
                engine_info!("Returned to the product view");
            } else {
                engine_warn!("Product view not confirmed after leaving stock wait");
            }
        }
    }
}
