//! Classification and interpretation of observed storefront requests.
use serde::Deserialize;
use serde_json::Value;

use crate::{ComponentState, ItemId, SiteProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Extract,
    Choose,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    ItemDiscovered {
        id: ItemId,
        component_states: Vec<ComponentState>,
    },
    AllSlotsReserved,
    SelectionConfirmed,
    ParseFailed {
        kind: RequestKind,
        reason: String,
    },
}

pub fn classify(profile: &SiteProfile, method: &str, url: &str) -> RequestKind {
    if !method.eq_ignore_ascii_case(&profile.intercept_method) {
        return RequestKind::Other;
    }
    if url.contains(&profile.extract_path) {
        RequestKind::Extract
    } else if url.contains(&profile.choose_path) {
        RequestKind::Choose
    } else {
        RequestKind::Other
    }
}

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[derive(Debug, Deserialize)]
struct ExtractEnvelope {
    data: Option<ExtractData>,
}

#[derive(Debug, Deserialize)]
struct ExtractData {
    #[serde(alias = "item_id")]
    set_no: Option<Value>,
    #[serde(alias = "component_list")]
    box_list: Option<Vec<ComponentEntry>>,
}

#[derive(Debug, Deserialize)]
struct ComponentEntry {
    #[serde(default)]
    state: Option<i64>,
}

/// Turn a completed request into an event. Unclassified requests and
/// non-success statuses produce nothing; so does an extract payload that
/// parses but lacks the id or the component list.
pub fn interpret(
    profile: &SiteProfile,
    kind: RequestKind,
    status: u16,
    body: &str,
) -> Option<NetEvent> {
    if kind == RequestKind::Other || !is_success(status) {
        return None;
    }
    match kind {
        RequestKind::Extract => interpret_extract(body),
        RequestKind::Choose => Some(if body.contains(&profile.exhaustion_marker) {
            NetEvent::AllSlotsReserved
        } else {
            NetEvent::SelectionConfirmed
        }),
        RequestKind::Other => None,
    }
}

fn interpret_extract(body: &str) -> Option<NetEvent> {
    let envelope: ExtractEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(err) => {
            return Some(NetEvent::ParseFailed {
                kind: RequestKind::Extract,
                reason: err.to_string(),
            })
        }
    };
    let data = envelope.data?;
    let id = match data.set_no? {
        Value::String(s) if !s.is_empty() => ItemId::new(s),
        Value::Number(n) => ItemId::new(n.to_string()),
        _ => return None,
    };
    let component_states = data
        .box_list?
        .into_iter()
        .map(|entry| ComponentState::from(entry.state.unwrap_or(-1)))
        .collect();
    Some(NetEvent::ItemDiscovered {
        id,
        component_states,
    })
}
