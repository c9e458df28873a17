//! Borrowing handles over one node of a [`ModelTree`].

use serde_json::Value;

use crate::error::TreeError;
use crate::event::ModelEvent;
use crate::registry::{Matcher, PropertyMatcher, Subscription};
use crate::tree::{ModelTree, NodeId};
use crate::value::FieldValue;

static NULL: FieldValue = FieldValue::Null;

impl ModelTree {
    pub fn node(&mut self, id: NodeId) -> NodeHandle<'_> {
        NodeHandle { tree: self, id }
    }

    /// Accessor over one declared field of `node`.
    ///
    /// The field name is validated here, at instrumentation time; writes
    /// through the accessor cannot fail later.
    pub fn field<'a>(
        &'a mut self,
        node: NodeId,
        name: &str,
    ) -> Result<FieldAccessor<'a>, TreeError> {
        if self.get(node, name).is_none() {
            return Err(TreeError::InvalidWrapperTarget {
                model_type: self.model_type(node).to_owned(),
                field: name.to_owned(),
            });
        }
        Ok(FieldAccessor {
            tree: self,
            node,
            name: name.to_owned(),
        })
    }
}

/// The exposed surface of a single node, as methods.
pub struct NodeHandle<'a> {
    tree: &'a mut ModelTree,
    id: NodeId,
}

impl<'a> NodeHandle<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn model_type(&self) -> &str {
        self.tree.model_type(self.id)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.tree.parent(self.id)
    }

    /// Attaches this node (and its discovered descendants) under `parent`.
    pub fn inject(&mut self, parent: NodeId) {
        self.tree.inject(self.id, parent);
    }

    pub fn handle(&mut self) {
        self.tree.handle(self.id);
    }

    pub fn handle_event(&mut self, event: ModelEvent, local: bool) {
        self.tree.handle_event(self.id, event, local);
    }

    pub fn listen<F>(
        &mut self,
        matcher: Matcher,
        properties: PropertyMatcher,
        callback: F,
    ) -> Result<Subscription, TreeError>
    where
        F: FnMut(&mut ModelEvent) + Clone + Send + Sync + 'static,
    {
        self.tree.listen(self.id, matcher, properties, callback)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.tree.get(self.id, field)
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> Result<(), TreeError> {
        self.tree.set(self.id, field, value)
    }

    pub fn field(self, name: &str) -> Result<FieldAccessor<'a>, TreeError> {
        self.tree.field(self.id, name)
    }

    pub fn view(&self) -> Value {
        self.tree.view(self.id)
    }
}

/// Intercepted get/set pair over one declared field.
///
/// `set` stores into hidden storage, then raises a `"change"` event with the
/// field name and new value as a local event on the owning node. No equality
/// check: rewriting the current value raises every time.
pub struct FieldAccessor<'a> {
    tree: &'a mut ModelTree,
    node: NodeId,
    name: String,
}

impl FieldAccessor<'_> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> &FieldValue {
        match self.tree.get(self.node, &self.name) {
            Some(value) => value,
            None => &NULL,
        }
    }

    pub fn set(&mut self, value: impl Into<FieldValue>) {
        self.tree.write_field(self.node, &self.name, value.into());
    }
}
