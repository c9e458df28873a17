use crate::tree::NodeId;
use crate::value::FieldValue;

/// Collects every node stored anywhere inside a field value.
///
/// Plain containers are scanned structurally to any depth; scalars and binary
/// payloads contribute nothing. The containers themselves never appear in the
/// result, so a node found deep inside lists or maps is wired to the
/// field-owning node, not to an intermediate container.
pub(crate) fn collect_nodes(value: &FieldValue, out: &mut Vec<NodeId>) {
    match value {
        FieldValue::Node(id) => out.push(*id),
        FieldValue::List(items) => {
            for item in items {
                collect_nodes(item, out);
            }
        }
        FieldValue::Map(entries) => {
            for item in entries.values() {
                collect_nodes(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn finds_nodes_through_nested_containers() {
        let mut inner = IndexMap::new();
        inner.insert("a".to_owned(), FieldValue::Node(NodeId(7)));
        inner.insert("b".to_owned(), FieldValue::Bytes(vec![1, 2, 3]));
        let value = FieldValue::List(vec![
            FieldValue::Int(1),
            FieldValue::Node(NodeId(3)),
            FieldValue::List(vec![FieldValue::Map(inner)]),
        ]);
        let mut out = Vec::new();
        collect_nodes(&value, &mut out);
        assert_eq!(out, [NodeId(3), NodeId(7)]);
    }

    #[test]
    fn scalars_and_bytes_contribute_nothing() {
        let mut out = Vec::new();
        collect_nodes(&FieldValue::Bytes(vec![0; 16]), &mut out);
        collect_nodes(&FieldValue::Str("x".to_owned()), &mut out);
        assert!(out.is_empty());
    }
}
