//! Per-node listener storage and the matcher shapes accepted by `listen`.

use std::collections::BTreeMap;

use crate::error::TreeError;
use crate::event::ModelEvent;
use crate::tree::NodeId;

pub(crate) type ListenerFn = Box<dyn FnMut(&mut ModelEvent) + Send + Sync>;

/// Four disjoint bins, partitioned by matching strategy. `BTreeMap` keying
/// gives ascending listener-id invocation order inside each bin.
#[derive(Default)]
pub(crate) struct Listeners {
    pub(crate) all: BTreeMap<u64, ListenerFn>,
    pub(crate) fns: BTreeMap<u64, ListenerFn>,
    pub(crate) kinds: BTreeMap<String, BTreeMap<u64, ListenerFn>>,
    pub(crate) props: BTreeMap<String, BTreeMap<u64, ListenerFn>>,
}

impl Listeners {
    pub(crate) fn remove(&mut self, bin: &BinId, id: u64) -> bool {
        match bin {
            BinId::All => self.all.remove(&id).is_some(),
            BinId::Fns => self.fns.remove(&id).is_some(),
            BinId::Kind(kind) => self
                .kinds
                .get_mut(kind)
                .is_some_and(|bucket| bucket.remove(&id).is_some()),
            BinId::Prop(prop) => self
                .props
                .get_mut(prop)
                .is_some_and(|bucket| bucket.remove(&id).is_some()),
        }
    }
}

/// Which bin a registration landed in; a [`Subscription`] is a list of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BinId {
    All,
    Fns,
    Kind(String),
    Prop(String),
}

/// Event-kind side of a `listen` call.
///
/// `Any` defers to the property matcher (catch-all when that is `None` too).
/// `Every` registers into the unfiltered bin: the callback sees every event
/// that reaches the node and does its own filtering. `Each` fans out over its
/// elements with the same property matcher and yields a single combined
/// subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Any,
    Kind(String),
    Each(Vec<Matcher>),
    Every,
}

impl Matcher {
    pub(crate) fn validate(&self) -> Result<(), TreeError> {
        match self {
            Matcher::Any | Matcher::Every => Ok(()),
            Matcher::Kind(name) if name.is_empty() => Err(TreeError::InvalidListenerSpec(
                "kind name must be non-empty".to_owned(),
            )),
            Matcher::Kind(_) => Ok(()),
            Matcher::Each(items) => {
                if items.is_empty() {
                    return Err(TreeError::InvalidListenerSpec(
                        "matcher array must be non-empty".to_owned(),
                    ));
                }
                for item in items {
                    item.validate()?;
                }
                Ok(())
            }
        }
    }
}

/// Property-name side of a `listen` call. Ignored when the kind matcher is
/// anything but `Any`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyMatcher {
    None,
    Name(String),
    Names(Vec<String>),
}

impl PropertyMatcher {
    pub(crate) fn validate(&self) -> Result<(), TreeError> {
        match self {
            PropertyMatcher::None => Ok(()),
            PropertyMatcher::Name(name) if name.is_empty() => Err(
                TreeError::InvalidListenerSpec("property name must be non-empty".to_owned()),
            ),
            PropertyMatcher::Name(_) => Ok(()),
            PropertyMatcher::Names(names) => {
                if names.is_empty() {
                    return Err(TreeError::InvalidListenerSpec(
                        "property array must be non-empty".to_owned(),
                    ));
                }
                for name in names {
                    if name.is_empty() {
                        return Err(TreeError::InvalidListenerSpec(
                            "property name must be non-empty".to_owned(),
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Disposer for one `listen` call. Fan-out registrations collapse into a
/// single subscription; removing it removes every entry it made.
#[derive(Debug)]
pub struct Subscription {
    pub(crate) entries: Vec<(NodeId, BinId, u64)>,
}
