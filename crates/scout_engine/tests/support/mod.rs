#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Once;

use scout_core::{Affordance, Criteria, Selectors};
use scout_engine::{
    ElementRef, EngineConfig, EnginePorts, KeyValueStore, MemoryStore, PageHost, StoreError,
    UiProbe,
};

pub const PRODUCT_URL: &str = "https://www.popmart.com/us/pop-now/set/195";
pub const HOME_URL: &str = "https://www.popmart.com/us";
pub const BOX_URL: &str = "https://www.popmart.com/us/pop-now/box/195";
pub const EXTRACT_URL: &str = "https://prod-na-api.popmart.com/shop/v1/box/box_set/extract";
pub const CHOOSE_URL: &str = "https://prod-na-api.popmart.com/shop/v1/box/box_set/choose";

const AFFORDANCES: [Affordance; 5] = [
    Affordance::Component,
    Affordance::NextArrow,
    Affordance::ConfirmSelection,
    Affordance::SecondaryConfirm,
    Affordance::CatalogRoot,
];

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn seeded_config() -> EngineConfig {
    EngineConfig {
        seed: Some(7),
        ..EngineConfig::default()
    }
}

pub fn extract_body(id: &str) -> String {
    format!(r#"{{"code":"OK","data":{{"set_no":"{id}","box_list":[{{"state":0}},{{"state":1}}]}}}}"#)
}

/// In-memory stand-in for the live document and its history.
#[derive(Debug, Default)]
pub struct Page {
    pub location: String,
    pub history: Vec<String>,
    pub present: HashSet<Affordance>,
    pub hidden: HashSet<Affordance>,
    pub pressed: Vec<Affordance>,
    pub back_presses: usize,
    pub detached: bool,
}

impl Page {
    pub fn go(&mut self, url: &str) {
        let previous = std::mem::replace(&mut self.location, url.to_string());
        self.history.push(previous);
    }

    pub fn show(&mut self, target: Affordance) {
        self.present.insert(target);
        self.hidden.remove(&target);
    }

    pub fn hide(&mut self, target: Affordance) {
        self.present.insert(target);
        self.hidden.insert(target);
    }

    pub fn remove(&mut self, target: Affordance) {
        self.present.remove(&target);
    }
}

/// Shared handles so a test can keep inspecting the page after the engine
/// takes ownership of its ports.
#[derive(Clone)]
pub struct FakeHost {
    pub page: Rc<RefCell<Page>>,
    pub store: Rc<RefCell<MemoryStore>>,
    selectors: Selectors,
}

impl FakeHost {
    pub fn at(url: &str) -> Self {
        Self::with_store(url, MemoryStore::new())
    }

    pub fn with_store(url: &str, store: MemoryStore) -> Self {
        let page = Page {
            location: url.to_string(),
            ..Page::default()
        };
        Self {
            page: Rc::new(RefCell::new(page)),
            store: Rc::new(RefCell::new(store)),
            selectors: Selectors::default(),
        }
    }

    pub fn ports(&self) -> EnginePorts {
        EnginePorts {
            probe: Box::new(self.clone()),
            page: Box::new(self.clone()),
            store: Box::new(SharedStore(self.store.clone())),
        }
    }

    pub fn pressed(&self) -> Vec<Affordance> {
        self.page.borrow().pressed.clone()
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.borrow().get(key).ok().flatten()
    }

    fn affordance(&self, criteria: &Criteria) -> Option<Affordance> {
        AFFORDANCES
            .into_iter()
            .find(|target| self.selectors.criteria(*target) == criteria)
    }
}

impl UiProbe for FakeHost {
    fn locate(&self, criteria: &Criteria) -> Option<ElementRef> {
        let target = self.affordance(criteria)?;
        let page = self.page.borrow();
        page.present
            .contains(&target)
            .then_some(ElementRef(target as u64))
    }

    fn is_visible(&self, element: ElementRef) -> bool {
        let target = AFFORDANCES[element.0 as usize];
        !self.page.borrow().hidden.contains(&target)
    }

    fn activate(&mut self, element: ElementRef) {
        let target = AFFORDANCES[element.0 as usize];
        self.page.borrow_mut().pressed.push(target);
    }
}

impl PageHost for FakeHost {
    fn location(&self) -> String {
        self.page.borrow().location.clone()
    }

    fn navigate_back(&mut self) {
        let mut page = self.page.borrow_mut();
        page.back_presses += 1;
        if let Some(previous) = page.history.pop() {
            page.location = previous;
        }
    }

    fn detach(&mut self) {
        self.page.borrow_mut().detached = true;
    }
}

struct SharedStore(Rc<RefCell<MemoryStore>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.0.borrow_mut().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.0.borrow_mut().remove(key)
    }
}
