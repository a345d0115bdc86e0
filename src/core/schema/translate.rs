use super::decl::{RecordDecl, TypeDecl};
use super::{PrimitiveKind, SchemaNode};
use crate::core::function::{FunctionDecl, ParamKind};
use std::collections::BTreeSet;

/// Name of the single property used to wrap non-record return types.
pub const RESULT_FIELD: &str = "result";

/// Translates a declared type into its structural schema.
///
/// Rules are tried in order and the first match wins. Translation never
/// fails: anything without a rule degrades to an `any` or a name-tagged
/// `object`.
pub fn translate(decl: &TypeDecl) -> SchemaNode {
    match decl {
        TypeDecl::Empty => SchemaNode::any(),
        TypeDecl::Record(record) => translate_record(record),
        TypeDecl::Null => SchemaNode::null(),
        TypeDecl::Union(branches) => translate_union(branches),
        TypeDecl::Sequence(item) => SchemaNode::Array {
            items: item.as_deref().map(|item| Box::new(translate(item))),
        },
        TypeDecl::Mapping { value, .. } => SchemaNode::Object {
            additional: value.as_deref().map(|value| Box::new(translate(value))),
            tag: None,
        },
        TypeDecl::Tuple(items) if items.is_empty() => SchemaNode::Array { items: None },
        TypeDecl::Tuple(items) => SchemaNode::Tuple {
            items: items.iter().map(translate).collect(),
        },
        TypeDecl::Primitive(kind) => SchemaNode::primitive(*kind),
        TypeDecl::BareSequence => SchemaNode::Array { items: None },
        TypeDecl::BareMapping => SchemaNode::Object {
            additional: None,
            tag: None,
        },
        TypeDecl::Named(name) => SchemaNode::tagged_object(name.clone()),
        TypeDecl::Unknown(repr) => SchemaNode::Primitive {
            kind: PrimitiveKind::Any,
            tag: Some(repr.clone()),
        },
    }
}

fn translate_record(record: &RecordDecl) -> SchemaNode {
    if record.opaque {
        log::debug!("record '{}' has no introspectable fields", record.name);
        return SchemaNode::tagged_object(record.name.clone());
    }

    let mut required = BTreeSet::new();
    let mut properties = Vec::with_capacity(record.fields.len());
    for field in &record.fields {
        if !field.has_default() {
            required.insert(field.name.clone());
        }
        properties.push((field.name.clone(), translate(&field.ty)));
    }

    SchemaNode::Record {
        title: Some(record.name.clone()),
        properties,
        required,
    }
}

fn translate_union(branches: &[TypeDecl]) -> SchemaNode {
    let mut flat = Vec::new();
    flatten_union(branches, &mut flat);

    let has_null = flat.iter().any(|branch| branch.is_null());
    let non_null: Vec<&TypeDecl> = flat.into_iter().filter(|branch| !branch.is_null()).collect();

    let node = match non_null.as_slice() {
        [] => return SchemaNode::null(),
        [single] => translate(single),
        many => {
            let mut options: Vec<SchemaNode> = Vec::with_capacity(many.len());
            for branch in many {
                let option = translate(branch);
                if !options.contains(&option) {
                    options.push(option);
                }
            }
            if options.len() == 1 {
                options.remove(0)
            } else {
                SchemaNode::Union { options }
            }
        }
    };

    if has_null {
        SchemaNode::nullable(node)
    } else {
        node
    }
}

/// Nested unions collapse into one and duplicate branches are dropped.
fn flatten_union<'a>(branches: &'a [TypeDecl], out: &mut Vec<&'a TypeDecl>) {
    for branch in branches {
        match branch {
            TypeDecl::Union(inner) => flatten_union(inner, out),
            other => {
                if !out.contains(&other) {
                    out.push(other);
                }
            }
        }
    }
}

/// Builds the input record of a callable from its declared parameters.
///
/// Receiver parameters are skipped; parameters without a default are
/// required.
pub fn input_schema(decl: &FunctionDecl) -> SchemaNode {
    let mut schema = SchemaNode::record();
    for param in decl
        .params()
        .iter()
        .filter(|param| param.kind == ParamKind::Regular)
    {
        schema = schema.property(
            param.name.clone(),
            translate(&param.ty),
            param.default.is_none(),
        );
    }
    schema
}

/// Builds the output schema of a callable from its declared return type.
///
/// Anything that is not already a record or a union is wrapped in a
/// single-field record so outputs stay field-addressable. A nullable node
/// is a union with null and is left as is.
pub fn output_schema(decl: &FunctionDecl) -> SchemaNode {
    normalize_output(translate(decl.returns_type()))
}

pub fn normalize_output(node: SchemaNode) -> SchemaNode {
    if matches!(
        node,
        SchemaNode::Record { .. } | SchemaNode::Union { .. } | SchemaNode::Nullable(_)
    ) {
        return node;
    }
    SchemaNode::record().property(RESULT_FIELD, node, false)
}
