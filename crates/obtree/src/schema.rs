//! Read-only seam to the data-modeling layer.
//!
//! The tree never serializes anything; it only asks the schema which fields a
//! model type declares, which of them are suppressed from propagation, and how
//! types extend each other. [`SchemaSet`] is the in-memory implementation used
//! by tests and simple embedders.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::value::FieldValue;

/// One declared field of a model type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub default: FieldValue,
}

impl FieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: FieldValue::Null,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
        }
    }
}

/// Declared shape of a model type.
///
/// `no_propagate` entries mark fields the injection walk must skip; they merge
/// along the `extends` ancestry with child entries overriding parent entries.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub extends: Option<String>,
    pub fields: Vec<FieldDef>,
    pub no_propagate: IndexMap<String, bool>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            fields: Vec::new(),
            no_propagate: IndexMap::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    pub fn no_propagate(mut self, field: impl Into<String>, suppressed: bool) -> Self {
        self.no_propagate.insert(field.into(), suppressed);
        self
    }
}

/// Schema collaborator: per-type declarations, consumed read-only.
pub trait Schema {
    fn definition(&self, model_type: &str) -> Option<&TypeDef>;
}

/// In-memory schema, insertion-ordered by declaration.
#[derive(Debug, Default)]
pub struct SchemaSet {
    types: IndexMap<String, TypeDef>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(mut self, def: TypeDef) -> Self {
        self.types.insert(def.name.clone(), def);
        self
    }
}

impl Schema for SchemaSet {
    fn definition(&self, model_type: &str) -> Option<&TypeDef> {
        self.types.get(model_type)
    }
}

/// Declared fields for a model type, including inherited declarations.
///
/// Resolved root-first so a redeclared field keeps its ancestral position but
/// takes the child's default.
pub fn resolved_fields(schema: &dyn Schema, model_type: &str) -> Vec<FieldDef> {
    let chain = ancestry(schema, model_type);
    let mut out: Vec<FieldDef> = Vec::new();
    for def in chain.iter().rev() {
        for field in &def.fields {
            match out.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => *existing = field.clone(),
                None => out.push(field.clone()),
            }
        }
    }
    out
}

/// Suppression mask for a model type, merged up its declared ancestry.
pub fn propagation_mask(schema: &dyn Schema, model_type: &str) -> IndexMap<String, bool> {
    let chain = ancestry(schema, model_type);
    let mut mask = IndexMap::new();
    for def in chain.iter().rev() {
        for (field, suppressed) in &def.no_propagate {
            mask.insert(field.clone(), *suppressed);
        }
    }
    mask
}

// Child-first ancestry chain. A malformed `extends` loop terminates at the
// first repeated name.
fn ancestry<'a>(schema: &'a dyn Schema, model_type: &str) -> Vec<&'a TypeDef> {
    let mut seen = HashSet::new();
    let mut chain = Vec::new();
    let mut current = Some(model_type.to_owned());
    while let Some(name) = current {
        if !seen.insert(name.clone()) {
            break;
        }
        match schema.definition(&name) {
            Some(def) => {
                chain.push(def);
                current = def.extends.clone();
            }
            None => break,
        }
    }
    chain
}
