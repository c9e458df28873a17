//! Cross-cutting method instrumentation, fixed at model-definition time.

use crate::error::TreeError;
use crate::tree::{ModelTree, NodeId};

/// Wraps a model method so that calling it adopts a node argument into the
/// receiver, raises a node-level event after the wrapped operation, or both.
///
/// The four producers mirror the instrumentation points of the modeling
/// layer: [`inject`](Self::inject) and [`inject_as`](Self::inject_as) adopt
/// the node argument before running the operation; [`handle`](Self::handle)
/// and [`handle_as`](Self::handle_as) only emit afterwards. Typed producers
/// validate their kind eagerly, so a malformed wrapper fails where it is
/// declared, never at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodWrap {
    adopt: bool,
    kind: Option<String>,
}

impl MethodWrap {
    /// Adopt a node argument, then emit a generic event from the receiver.
    pub fn inject() -> Self {
        Self {
            adopt: true,
            kind: None,
        }
    }

    /// Adopt a node argument, then emit a typed local event.
    pub fn inject_as(kind: impl Into<String>) -> Result<Self, TreeError> {
        Ok(Self {
            adopt: true,
            kind: Some(validated_kind(kind)?),
        })
    }

    /// Emit a generic event from the receiver after the wrapped operation.
    pub fn handle() -> Self {
        Self {
            adopt: false,
            kind: None,
        }
    }

    /// Emit a typed local event after the wrapped operation.
    pub fn handle_as(kind: impl Into<String>) -> Result<Self, TreeError> {
        Ok(Self {
            adopt: false,
            kind: Some(validated_kind(kind)?),
        })
    }

    /// Runs `op` as the wrapped method body.
    ///
    /// Adopting wrappers inject `arg` under `receiver` first, when a node
    /// argument is present. The post-call event is typed and local for the
    /// `_as` producers (the receiver's type is not re-appended to the path),
    /// generic otherwise. Emission is parent-gated like any origination.
    pub fn call<R>(
        &self,
        tree: &mut ModelTree,
        receiver: NodeId,
        arg: Option<NodeId>,
        op: impl FnOnce(&mut ModelTree, NodeId) -> R,
    ) -> R {
        if self.adopt {
            if let Some(child) = arg {
                tree.inject(child, receiver);
            }
        }
        let out = op(tree, receiver);
        match &self.kind {
            Some(kind) => {
                let event = tree.event_as(receiver, kind.clone());
                tree.handle_event(receiver, event, true);
            }
            None => tree.handle(receiver),
        }
        out
    }
}

fn validated_kind(kind: impl Into<String>) -> Result<String, TreeError> {
    let kind = kind.into();
    if kind.is_empty() {
        return Err(TreeError::InvalidWrapperArguments(
            "event kind must be a non-empty string".to_owned(),
        ));
    }
    Ok(kind)
}
