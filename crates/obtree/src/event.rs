use crate::tree::NodeId;
use crate::value::FieldValue;

/// One mutation record, threaded through every listener on the bubble path.
///
/// `path` starts with the origin's model-type name and grows by one entry per
/// non-local hop as the event climbs the ancestor chain. `kind` is an optional
/// classification; absent means a generic mutation. `property` and `value`
/// are set only for field-level changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEvent {
    pub origin: NodeId,
    pub path: Vec<String>,
    pub kind: Option<String>,
    pub property: Option<String>,
    pub value: Option<FieldValue>,
    pub cancelled: bool,
}

impl ModelEvent {
    pub fn new(origin: NodeId, origin_type: impl Into<String>) -> Self {
        Self {
            origin,
            path: vec![origin_type.into()],
            kind: None,
            property: None,
            value: None,
            cancelled: false,
        }
    }

    pub fn with_kind(
        origin: NodeId,
        origin_type: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        let mut event = Self::new(origin, origin_type);
        event.kind = Some(kind.into());
        event
    }

    pub(crate) fn change(
        origin: NodeId,
        origin_type: impl Into<String>,
        property: &str,
        value: FieldValue,
    ) -> Self {
        let mut event = Self::with_kind(origin, origin_type, "change");
        event.property = Some(property.to_owned());
        event.value = Some(value);
        event
    }

    /// Marks the event handled. Advisory only: bubbling always continues.
    pub fn stop_propagation(&mut self) {
        self.cancelled = true;
    }
}
