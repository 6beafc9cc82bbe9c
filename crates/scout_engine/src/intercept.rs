use std::sync::mpsc;

use engine_logging::engine_trace;
use scout_core::{classify, interpret, is_success, NetEvent, RequestKind, SiteProfile};

/// A classified, successful completion as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interception {
    pub kind: RequestKind,
    pub body: String,
    pub event: Option<NetEvent>,
}

/// Observer for the host's request transport. The host adapter wraps the
/// real transport, reports opens and completions here, and forwards the
/// request untouched; nothing in this type can alter a request or response.
#[derive(Debug)]
pub struct NetworkInterceptor {
    profile: SiteProfile,
    subscribers: Vec<mpsc::Sender<Interception>>,
}

impl NetworkInterceptor {
    pub fn new(profile: SiteProfile) -> Self {
        Self {
            profile,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<Interception> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn open(&self, method: &str, url: &str) -> RequestKind {
        let kind = classify(&self.profile, method, url);
        if kind != RequestKind::Other {
            engine_trace!("Observing {:?} request {} {}", kind, method, url);
        }
        kind
    }

    /// Deliver a completion to subscribers, in the order the transport
    /// reports them. Unclassified or unsuccessful completions are dropped.
    pub fn complete(&mut self, kind: RequestKind, status: u16, body: &str) {
        if kind == RequestKind::Other || !is_success(status) {
            return;
        }
        let interception = Interception {
            kind,
            body: body.to_string(),
            event: interpret(&self.profile, kind, status, body),
        };
        self.subscribers
            .retain(|tx| tx.send(interception.clone()).is_ok());
    }

    pub fn detach(&mut self) {
        self.subscribers.clear();
    }
}
