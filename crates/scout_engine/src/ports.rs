//! Capabilities the engine consumes from its host page.
use scout_core::Criteria;

/// Opaque handle to a live element, minted by the `UiProbe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(pub u64);

/// Locates, inspects and presses elements in the live document.
pub trait UiProbe {
    /// First element matching `criteria`. Implementations should prefer a
    /// visible match when `criteria.visible` is set.
    fn locate(&self, criteria: &Criteria) -> Option<ElementRef>;

    fn is_visible(&self, element: ElementRef) -> bool;

    /// Dispatch press/release/click plus a brief highlight. Must not block.
    fn activate(&mut self, element: ElementRef);
}

/// Navigation boundary of the host page.
pub trait PageHost {
    fn location(&self) -> String;

    fn navigate_back(&mut self);

    /// Called on teardown so the host can unwrap history and transport hooks.
    fn detach(&mut self) {}
}
