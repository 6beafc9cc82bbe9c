mod support;

use std::time::Duration;

use pretty_assertions::assert_eq;
use scout_core::{Affordance, LoopMode, RequestKind, StockWaitMode, StopReason, Task};
use scout_engine::{Engine, EngineConfig, EngineError};

use support::{
    extract_body, init_logging, seeded_config, FakeHost, BOX_URL, CHOOSE_URL, EXTRACT_URL,
    HOME_URL, PRODUCT_URL,
};

fn engine_for(host: &FakeHost) -> Engine {
    init_logging();
    Engine::create(seeded_config(), host.ports(), 0).expect("engine")
}

#[test]
fn missing_component_advances_with_next_arrow() {
    let host = FakeHost::at(PRODUCT_URL);
    host.page.borrow_mut().show(Affordance::NextArrow);
    let mut engine = engine_for(&host);

    engine.start();

    assert_eq!(engine.state().mode(), LoopMode::Running);
    assert_eq!(engine.pending_tasks(), vec![Task::ClickNext]);
    assert!(host.pressed().is_empty());

    engine.advance_by(Duration::from_millis(600));
    assert_eq!(host.pressed(), vec![Affordance::NextArrow]);
    assert_eq!(engine.pending_continuations(), 0);
}

#[test]
fn hidden_next_arrow_counts_as_missing() {
    let host = FakeHost::at(PRODUCT_URL);
    host.page.borrow_mut().hide(Affordance::NextArrow);
    let mut engine = engine_for(&host);

    engine.start();
    engine.advance_by(Duration::from_millis(600));

    assert!(host.pressed().is_empty());
    assert_eq!(engine.pending_tasks(), vec![Task::ClickNext]);
}

#[test]
fn discovery_then_leaving_product_page_voids_pending_work() {
    let host = FakeHost::at(PRODUCT_URL);
    host.page.borrow_mut().show(Affordance::Component);
    let mut engine = engine_for(&host);
    engine.start();
    assert_eq!(host.pressed(), vec![Affordance::Component]);

    let kind = engine.request_opened("POST", EXTRACT_URL);
    assert_eq!(kind, RequestKind::Extract);
    engine.request_completed(kind, 200, &extract_body("X"));
    assert_eq!(engine.state().ledger().len(), 1);
    assert_eq!(engine.pending_tasks(), vec![Task::SelectComponent]);

    host.page.borrow_mut().go(HOME_URL);
    engine.history_mutated();
    engine.advance_by(Duration::from_millis(100));

    assert_eq!(engine.state().mode(), LoopMode::Idle);
    assert_eq!(
        engine.state().stop_reason(),
        Some(StopReason::LeftProductPage)
    );
    assert_eq!(engine.pending_continuations(), 0);

    engine.advance_by(Duration::from_secs(5));
    assert_eq!(host.pressed(), vec![Affordance::Component]);
}

#[test]
fn navigation_poll_notices_untracked_changes() {
    let host = FakeHost::at(PRODUCT_URL);
    host.page.borrow_mut().show(Affordance::Component);
    let mut engine = engine_for(&host);
    engine.start();

    host.page.borrow_mut().go(HOME_URL);
    engine.advance_by(Duration::from_millis(999));
    assert_eq!(engine.state().mode(), LoopMode::Running);

    engine.advance_by(Duration::from_millis(1));
    assert_eq!(engine.state().mode(), LoopMode::Idle);
    assert_eq!(engine.state().current_url(), HOME_URL);
}

#[test]
fn start_off_product_page_does_nothing() {
    let host = FakeHost::at(HOME_URL);
    host.page.borrow_mut().show(Affordance::Component);
    let mut engine = engine_for(&host);

    engine.toggle();

    assert_eq!(engine.state().mode(), LoopMode::Idle);
    assert!(host.pressed().is_empty());
    assert!(!engine.view().toggle_enabled);
}

#[test]
fn exhausted_choose_moves_to_next_item() {
    let host = FakeHost::at(PRODUCT_URL);
    host.page.borrow_mut().show(Affordance::Component);
    host.page.borrow_mut().show(Affordance::NextArrow);
    let mut engine = engine_for(&host);
    engine.start();

    let kind = engine.request_opened("POST", CHOOSE_URL);
    engine.request_completed(kind, 200, r#"{"message":"All boxes have been reserved"}"#);
    engine.advance_by(Duration::from_millis(600));

    assert_eq!(
        host.pressed(),
        vec![Affordance::Component, Affordance::NextArrow]
    );
    assert_eq!(engine.state().mode(), LoopMode::Running);
}

#[test]
fn confirmed_choose_stops_loop() {
    let host = FakeHost::at(PRODUCT_URL);
    let mut engine = engine_for(&host);
    engine.start();

    let kind = engine.request_opened("POST", CHOOSE_URL);
    engine.request_completed(kind, 200, r#"{"code":"OK"}"#);

    assert_eq!(engine.state().mode(), LoopMode::Idle);
    assert_eq!(
        engine.state().stop_reason(),
        Some(StopReason::SelectionConfirmed)
    );
    assert_eq!(engine.pending_continuations(), 0);
}

#[test]
fn unsuccessful_or_foreign_responses_are_ignored() {
    let host = FakeHost::at(PRODUCT_URL);
    let mut engine = engine_for(&host);

    let other = engine.request_opened("GET", "https://www.popmart.com/api/cart");
    engine.request_completed(other, 200, &extract_body("10006456200280"));
    let extract = engine.request_opened("POST", EXTRACT_URL);
    engine.request_completed(extract, 503, &extract_body("10006456200280"));

    assert!(engine.state().ledger().is_empty());
    assert_eq!(engine.state().last_payload(), None);
}

#[test]
fn unparsable_payload_is_shown_but_not_recorded() {
    let host = FakeHost::at(PRODUCT_URL);
    let mut engine = engine_for(&host);

    let kind = engine.request_opened("POST", EXTRACT_URL);
    engine.request_completed(kind, 200, "<html>gateway</html>");

    assert!(engine.state().ledger().is_empty());
    assert_eq!(engine.view().last_payload.as_deref(), Some("Failed to parse JSON"));
}

#[test]
fn terminal_page_presses_both_confirmations() {
    let host = FakeHost::at(PRODUCT_URL);
    let mut engine = engine_for(&host);
    engine.start();
    assert_eq!(engine.pending_tasks(), vec![Task::ClickNext]);

    {
        let mut page = host.page.borrow_mut();
        page.go(BOX_URL);
        page.show(Affordance::ConfirmSelection);
        page.hide(Affordance::SecondaryConfirm);
    }
    engine.history_mutated();
    engine.advance_by(Duration::from_millis(100));
    assert_eq!(engine.state().mode(), LoopMode::WaitingConfirmation);
    assert_eq!(engine.pending_tasks(), vec![Task::PressConfirmSelection]);

    engine.advance_by(Duration::from_millis(1_000));
    assert_eq!(host.pressed(), vec![Affordance::ConfirmSelection]);
    assert_eq!(engine.pending_tasks(), vec![Task::PollSecondaryConfirm]);

    host.page.borrow_mut().show(Affordance::SecondaryConfirm);
    engine.advance_by(Duration::from_millis(200));

    assert_eq!(
        host.pressed(),
        vec![Affordance::ConfirmSelection, Affordance::SecondaryConfirm]
    );
    assert_eq!(engine.state().mode(), LoopMode::Idle);
    assert_eq!(engine.state().stop_reason(), Some(StopReason::Completed));
}

#[test]
fn repeated_terminal_navigation_presses_each_confirmation_once() {
    let host = FakeHost::at(PRODUCT_URL);
    let mut engine = engine_for(&host);
    engine.start();

    host.page.borrow_mut().go(BOX_URL);
    engine.history_mutated();
    engine.advance_by(Duration::from_millis(150));
    host.page.borrow_mut().go(&format!("{BOX_URL}?step=2"));
    engine.history_mutated();
    engine.advance_by(Duration::from_millis(150));

    assert_eq!(engine.pending_tasks(), vec![Task::PressConfirmSelection]);

    {
        let mut page = host.page.borrow_mut();
        page.show(Affordance::ConfirmSelection);
        page.show(Affordance::SecondaryConfirm);
    }
    engine.advance_to(3_000);

    assert_eq!(
        host.pressed(),
        vec![Affordance::ConfirmSelection, Affordance::SecondaryConfirm]
    );
    assert_eq!(engine.state().stop_reason(), Some(StopReason::Completed));
}

#[test]
fn zero_delays_still_let_the_clock_advance() {
    let host = FakeHost::at(PRODUCT_URL);
    host.page.borrow_mut().hide(Affordance::NextArrow);
    let mut engine = engine_for(&host);

    engine.set_delays(Duration::ZERO, Duration::ZERO);
    engine.start();
    engine.advance_by(Duration::from_millis(10));

    assert_eq!(engine.now_ms(), 10);
    assert_eq!(engine.state().mode(), LoopMode::Running);
    assert_eq!(engine.pending_tasks(), vec![Task::ClickNext]);
    assert!(host.pressed().is_empty());
}

#[test]
fn zero_confirm_retry_interval_still_lets_the_clock_advance() {
    init_logging();
    let host = FakeHost::at(PRODUCT_URL);
    let mut config = seeded_config();
    config.settings.confirm_retry_interval = Duration::ZERO;
    let mut engine = Engine::create(config, host.ports(), 0).unwrap();

    host.page.borrow_mut().go(BOX_URL);
    engine.history_mutated();
    engine.advance_to(1_200);

    assert_eq!(engine.now_ms(), 1_200);
    assert_eq!(engine.state().mode(), LoopMode::WaitingConfirmation);
    assert_eq!(engine.pending_tasks(), vec![Task::PressConfirmSelection]);
}

#[test]
fn stock_wait_hands_back_to_the_loop_when_forward_control_appears() {
    let host = FakeHost::at(PRODUCT_URL);
    host.page.borrow_mut().show(Affordance::CatalogRoot);
    let mut engine = engine_for(&host);

    engine.wait_for_stock();
    assert_eq!(host.pressed(), vec![Affordance::CatalogRoot]);
    assert_eq!(engine.state().stock_wait(), StockWaitMode::Polling);
    host.page.borrow_mut().go(HOME_URL);

    engine.advance_to(5_000);
    assert_eq!(host.page.borrow().back_presses, 1);
    assert_eq!(host.page.borrow().location, PRODUCT_URL);
    assert_eq!(engine.pending_tasks(), vec![Task::StockPollForward]);

    engine.advance_to(5_550);
    assert_eq!(engine.state().stock_wait(), StockWaitMode::Polling);
    host.page.borrow_mut().show(Affordance::NextArrow);
    engine.advance_to(5_600);

    assert_eq!(engine.state().stock_wait(), StockWaitMode::Off);
    assert_eq!(engine.state().mode(), LoopMode::Running);
    assert_eq!(engine.pending_tasks(), vec![Task::ClickNext]);
}

#[test]
fn start_is_refused_during_stock_wait() {
    let host = FakeHost::at(PRODUCT_URL);
    host.page.borrow_mut().show(Affordance::Component);
    let mut engine = engine_for(&host);
    engine.wait_for_stock();

    engine.start();

    assert_eq!(engine.state().mode(), LoopMode::Idle);
    assert!(!host.pressed().contains(&Affordance::Component));
}

#[test]
fn leaving_stock_wait_navigates_back_when_needed() {
    let host = FakeHost::at(PRODUCT_URL);
    host.page.borrow_mut().show(Affordance::CatalogRoot);
    let mut engine = engine_for(&host);
    engine.wait_for_stock();
    host.page.borrow_mut().go(HOME_URL);

    engine.toggle_stock_wait();

    assert_eq!(engine.state().stock_wait(), StockWaitMode::Off);
    assert_eq!(host.page.borrow().back_presses, 1);
    assert_eq!(engine.pending_tasks(), vec![Task::StockVerifyReturn]);
    engine.advance_by(Duration::from_secs(10));
    assert_eq!(engine.pending_continuations(), 0);
    assert_eq!(host.page.borrow().back_presses, 1);
}

#[test]
fn invalid_config_is_rejected() {
    init_logging();
    let host = FakeHost::at(PRODUCT_URL);
    let mut config = EngineConfig::default();
    config.settings.nav_poll_interval = Duration::ZERO;

    let err = Engine::create(config, host.ports(), 0).err().expect("error");
    assert!(matches!(err, EngineError::Settings(_)));

    let err = EngineConfig::default()
        .with_product_pattern("(unclosed")
        .err()
        .expect("error");
    assert!(matches!(err, EngineError::Profile(_)));
}

#[test]
fn custom_product_pattern_gates_start() {
    init_logging();
    let host = FakeHost::at("https://shop.example/drops/42");
    host.page.borrow_mut().show(Affordance::Component);
    let config = EngineConfig {
        seed: Some(1),
        ..EngineConfig::default()
    }
    .with_product_pattern(r"/drops/\d+")
    .unwrap();
    let mut engine = Engine::create(config, host.ports(), 0).unwrap();

    engine.start();

    assert_eq!(engine.state().mode(), LoopMode::Running);
    assert_eq!(host.pressed(), vec![Affordance::Component]);
}
