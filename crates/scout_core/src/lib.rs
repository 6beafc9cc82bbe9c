//! Scout core: pure automation state machine, discovery ledger and range analysis.
mod effect;
mod intercept;
mod item;
mod ledger;
mod msg;
mod navigation;
mod profile;
mod range;
mod settings;
mod state;
mod update;
mod view_model;

pub use effect::{Delay, Effect, ProbePurpose, Task};
pub use intercept::{classify, interpret, is_success, NetEvent, RequestKind};
pub use item::{extract_numeric, with_numeric, ComponentState, ItemId, StateBucket, ID_PREFIX};
pub use ledger::{DiscoveryLedger, LedgerError, Record, Upsert};
pub use msg::Msg;
pub use navigation::{NavEvent, NavigationWatcher};
pub use profile::{Affordance, Criteria, ProfileError, Selectors, SiteProfile};
pub use range::{analyze, analyze_ids, MissingId, RangeReport};
pub use settings::EngineSettings;
pub use state::{EngineState, LoopMode, StockWaitMode, StopReason};
pub use update::update;
pub use view_model::{EngineViewModel, RangeSummary, RecordRow, MISSING_LINK_LIMIT};
