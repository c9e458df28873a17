//! The arena of observable nodes: injection, bubbling dispatch, listener
//! registration, field storage, and JSON views.

use std::collections::HashSet;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::TreeError;
use crate::event::ModelEvent;
use crate::registry::{BinId, ListenerFn, Listeners, Matcher, PropertyMatcher, Subscription};
use crate::schema::{propagation_mask, resolved_fields, Schema};
use crate::value::FieldValue;
use crate::walk::collect_nodes;

/// Index of a node inside its [`ModelTree`] arena.
///
/// Ids stay valid for the life of the tree; nodes are never evicted. The
/// parent back-reference is an id too, so nothing in the arena owns its
/// parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

struct NodeSlot {
    model_type: String,
    parent: Option<NodeId>,
    fields: IndexMap<String, FieldValue>,
    listeners: Listeners,
}

/// Arena of observable nodes plus the tree-scoped listener-id counter.
///
/// All dispatch is synchronous and single-threaded: an event raised at a node
/// visits that node and then every ancestor, in order, before the triggering
/// call returns.
pub struct ModelTree {
    schema: Arc<dyn Schema + Send + Sync>,
    nodes: Vec<NodeSlot>,
    next_listener_id: u64,
}

impl ModelTree {
    pub fn new(schema: Arc<dyn Schema + Send + Sync>) -> Self {
        Self {
            schema,
            nodes: Vec::new(),
            next_listener_id: 0,
        }
    }

    /// Constructs a node of the given model type with its declared fields
    /// (inherited declarations included) initialized to their defaults.
    ///
    /// A type the schema does not know yields an empty field set; the node is
    /// still observable and can carry listeners.
    pub fn create(&mut self, model_type: impl Into<String>) -> NodeId {
        let model_type = model_type.into();
        let mut fields = IndexMap::new();
        for def in resolved_fields(self.schema.as_ref(), &model_type) {
            fields.insert(def.name, def.default);
        }
        self.nodes.push(NodeSlot {
            model_type,
            parent: None,
            fields,
            listeners: Listeners::default(),
        });
        NodeId((self.nodes.len() - 1) as u32)
    }

    pub fn model_type(&self, node: NodeId) -> &str {
        &self.slot(node).model_type
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).parent
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ---- injection -------------------------------------------------------

    /// Attaches `node` under `parent` and wires parent back-references for
    /// every node reachable through its declared fields.
    ///
    /// Fields whose resolved no-propagate mask entry is `true` are skipped,
    /// as are flat binary payloads. Plain containers are scanned structurally
    /// and never become part of the chain. The walk is visited-set guarded:
    /// a reference cycle terminates, and within one walk the first visit of a
    /// node wins. Re-running `inject` overwrites parents.
    pub fn inject(&mut self, node: NodeId, parent: NodeId) {
        let mut visited = HashSet::new();
        self.inject_inner(node, parent, &mut visited);
    }

    fn inject_inner(&mut self, node: NodeId, parent: NodeId, visited: &mut HashSet<NodeId>) {
        if !visited.insert(node) {
            return;
        }
        self.slot_mut(node).parent = Some(parent);

        let mask = propagation_mask(self.schema.as_ref(), &self.slot(node).model_type);
        let mut children = Vec::new();
        for (name, value) in &self.slot(node).fields {
            if mask.get(name.as_str()).copied().unwrap_or(false) {
                continue;
            }
            if value.is_binary_leaf() {
                continue;
            }
            collect_nodes(value, &mut children);
        }
        for child in children {
            self.inject_inner(child, node, visited);
        }
    }

    // ---- events ----------------------------------------------------------

    /// A fresh generic event originating at `node`.
    pub fn event(&self, node: NodeId) -> ModelEvent {
        ModelEvent::new(node, self.slot(node).model_type.clone())
    }

    /// A fresh typed event originating at `node`.
    pub fn event_as(&self, node: NodeId, kind: impl Into<String>) -> ModelEvent {
        ModelEvent::with_kind(node, self.slot(node).model_type.clone(), kind)
    }

    /// Synthesizes a generic event at `node` and bubbles it.
    ///
    /// A node with no parent never originates: the call is a no-op, so a
    /// detached node cannot deliver to its own listeners this way.
    pub fn handle(&mut self, node: NodeId) {
        if self.slot(node).parent.is_none() {
            return;
        }
        let mut event = self.event(node);
        self.dispatch(node, &mut event);
        self.bubble(node, &mut event);
    }

    /// Emits a prepared event from `node` and bubbles it.
    ///
    /// Origination is parent-gated like [`handle`](Self::handle). With
    /// `local` false the node's own type name is appended to the path before
    /// dispatch; event constructors already seed the origin's name, so
    /// callers emitting at the origin pass `local = true`.
    pub fn handle_event(&mut self, node: NodeId, mut event: ModelEvent, local: bool) {
        if self.slot(node).parent.is_none() {
            return;
        }
        if !local {
            let name = self.slot(node).model_type.clone();
            event.path.push(name);
        }
        self.dispatch(node, &mut event);
        self.bubble(node, &mut event);
    }

    // One hop per ancestor: append the ancestor's type name, dispatch there,
    // climb. The chain is assumed acyclic; `inject` cannot create a cycle in
    // a single guarded walk.
    fn bubble(&mut self, from: NodeId, event: &mut ModelEvent) {
        let mut current = from;
        while let Some(parent) = self.slot(current).parent {
            let name = self.slot(parent).model_type.clone();
            event.path.push(name);
            self.dispatch(parent, event);
            current = parent;
        }
    }

    // Bin order at each node: props[property], kinds[kind], fns, all.
    // Ascending listener id inside each bin.
    fn dispatch(&mut self, node: NodeId, event: &mut ModelEvent) {
        let property = event.property.clone();
        let kind = event.kind.clone();
        let slot = self.slot_mut(node);
        if let Some(property) = property {
            if let Some(bucket) = slot.listeners.props.get_mut(&property) {
                for callback in bucket.values_mut() {
                    callback(event);
                }
            }
        }
        if let Some(kind) = kind {
            if let Some(bucket) = slot.listeners.kinds.get_mut(&kind) {
                for callback in bucket.values_mut() {
                    callback(event);
                }
            }
        }
        for callback in slot.listeners.fns.values_mut() {
            callback(event);
        }
        for callback in slot.listeners.all.values_mut() {
            callback(event);
        }
    }

    // ---- listeners -------------------------------------------------------

    /// Subscribes `callback` on `node` per the matcher pair and returns the
    /// disposer.
    ///
    /// Fan-out shapes (`Matcher::Each`, `PropertyMatcher::Names`) register
    /// one clone of the callback per element and collapse into a single
    /// [`Subscription`]. Malformed specs fail before any bin is touched.
    pub fn listen<F>(
        &mut self,
        node: NodeId,
        matcher: Matcher,
        properties: PropertyMatcher,
        callback: F,
    ) -> Result<Subscription, TreeError>
    where
        F: FnMut(&mut ModelEvent) + Clone + Send + Sync + 'static,
    {
        matcher.validate()?;
        properties.validate()?;
        let mut entries = Vec::new();
        self.register(node, &matcher, &properties, &callback, &mut entries);
        Ok(Subscription { entries })
    }

    fn register<F>(
        &mut self,
        node: NodeId,
        matcher: &Matcher,
        properties: &PropertyMatcher,
        callback: &F,
        entries: &mut Vec<(NodeId, BinId, u64)>,
    ) where
        F: FnMut(&mut ModelEvent) + Clone + Send + Sync + 'static,
    {
        match matcher {
            Matcher::Any => match properties {
                PropertyMatcher::None => {
                    entries.push(self.insert_bin(node, BinId::All, callback.clone()));
                }
                PropertyMatcher::Name(name) => {
                    entries.push(self.insert_bin(node, BinId::Prop(name.clone()), callback.clone()));
                }
                PropertyMatcher::Names(names) => {
                    for name in names {
                        entries.push(self.insert_bin(
                            node,
                            BinId::Prop(name.clone()),
                            callback.clone(),
                        ));
                    }
                }
            },
            // An explicit kind wins over any property matcher.
            Matcher::Kind(kind) => {
                entries.push(self.insert_bin(node, BinId::Kind(kind.clone()), callback.clone()));
            }
            Matcher::Every => {
                entries.push(self.insert_bin(node, BinId::Fns, callback.clone()));
            }
            Matcher::Each(items) => {
                for item in items {
                    self.register(node, item, properties, callback, entries);
                }
            }
        }
    }

    fn insert_bin<F>(&mut self, node: NodeId, bin: BinId, callback: F) -> (NodeId, BinId, u64)
    where
        F: FnMut(&mut ModelEvent) + Send + Sync + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        let boxed: ListenerFn = Box::new(callback);
        let listeners = &mut self.slot_mut(node).listeners;
        match &bin {
            BinId::All => {
                listeners.all.insert(id, boxed);
            }
            BinId::Fns => {
                listeners.fns.insert(id, boxed);
            }
            BinId::Kind(kind) => {
                listeners.kinds.entry(kind.clone()).or_default().insert(id, boxed);
            }
            BinId::Prop(prop) => {
                listeners.props.entry(prop.clone()).or_default().insert(id, boxed);
            }
        }
        (node, bin, id)
    }

    /// Removes every registration the subscription made. Returns whether
    /// anything was removed; disposing twice is a no-op, not an error.
    pub fn unlisten(&mut self, subscription: &Subscription) -> bool {
        let mut removed = false;
        for (node, bin, id) in &subscription.entries {
            removed |= self.slot_mut(*node).listeners.remove(bin, *id);
        }
        removed
    }

    // ---- fields ----------------------------------------------------------

    pub fn get(&self, node: NodeId, field: &str) -> Option<&FieldValue> {
        self.slot(node).fields.get(field)
    }

    /// Writes a declared field and emits a local `"change"` event.
    ///
    /// No equality check: rewriting the current value still emits. On a
    /// detached node the store happens but the event has no observable
    /// effect. An undeclared field is an instrumentation error.
    pub fn set(
        &mut self,
        node: NodeId,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), TreeError> {
        if !self.slot(node).fields.contains_key(field) {
            return Err(TreeError::InvalidWrapperTarget {
                model_type: self.slot(node).model_type.clone(),
                field: field.to_owned(),
            });
        }
        self.write_field(node, field, value.into());
        Ok(())
    }

    // Declared-field fast path used by accessors; silently ignores unknown
    // fields (accessor construction already validated the name).
    pub(crate) fn write_field(&mut self, node: NodeId, field: &str, value: FieldValue) {
        let written = match self.slot_mut(node).fields.get_mut(field) {
            Some(stored) => {
                *stored = value.clone();
                true
            }
            None => false,
        };
        if written {
            let event = ModelEvent::change(
                node,
                self.slot(node).model_type.clone(),
                field,
                value,
            );
            self.handle_event(node, event, true);
        }
    }

    // ---- views -----------------------------------------------------------

    /// Read-only JSON snapshot of the subtree under `node`.
    ///
    /// Nodes render as objects of their fields, binary payloads as base64
    /// strings, maps in insertion order. A node reached twice (shared or
    /// cyclic reference) renders as `null` on the repeat encounter.
    pub fn view(&self, node: NodeId) -> Value {
        let mut visited = HashSet::new();
        self.view_node(node, &mut visited)
    }

    fn view_node(&self, node: NodeId, visited: &mut HashSet<NodeId>) -> Value {
        if !visited.insert(node) {
            return Value::Null;
        }
        let slot = self.slot(node);
        let mut out = serde_json::Map::new();
        for (name, value) in &slot.fields {
            out.insert(name.clone(), self.view_value(value, visited));
        }
        Value::Object(out)
    }

    fn view_value(&self, value: &FieldValue, visited: &mut HashSet<NodeId>) -> Value {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => (*b).into(),
            FieldValue::Int(n) => (*n).into(),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Str(s) => s.clone().into(),
            FieldValue::Bytes(bytes) => Value::String(BASE64.encode(bytes)),
            FieldValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.view_value(item, visited))
                    .collect(),
            ),
            FieldValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), self.view_value(item, visited)))
                    .collect(),
            ),
            FieldValue::Node(id) => self.view_node(*id, visited),
        }
    }

    // ---- internals -------------------------------------------------------

    fn slot(&self, node: NodeId) -> &NodeSlot {
        &self.nodes[node.0 as usize]
    }

    fn slot_mut(&mut self, node: NodeId) -> &mut NodeSlot {
        &mut self.nodes[node.0 as usize]
    }
}
