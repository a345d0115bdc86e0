use crate::core::function::FunctionDecl;
use crate::core::schema::translate::{input_schema, output_schema};
use crate::core::schema::SchemaNode;
use crate::core::scope;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// One structural version of an instrumented callable.
///
/// Immutable once built. Two signatures with the same scope name but
/// different schemas are distinct versions; version history is rebuilt
/// downstream by grouping captures on `function_name` and `signature_hash`.
#[derive(Debug, Clone, Serialize)]
pub struct Signature {
    signature_hash: String,
    input_schema: SchemaNode,
    output_schema: SchemaNode,
    #[serde(rename = "function_name")]
    scope_name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Signature {
    /// Translates the declaration and computes its identity.
    pub fn from_decl(decl: &FunctionDecl) -> Self {
        let scope_name = scope::resolve(decl);
        let input_schema = input_schema(decl);
        let output_schema = output_schema(decl);
        Self::new(
            scope_name,
            input_schema,
            output_schema,
            decl.documentation().map(str::to_string),
        )
    }

    pub fn new(
        scope_name: impl Into<String>,
        input_schema: SchemaNode,
        output_schema: SchemaNode,
        description: Option<String>,
    ) -> Self {
        let scope_name = scope_name.into();
        let signature_hash = compute_hash(&input_schema, &output_schema, &scope_name);
        Self {
            signature_hash,
            input_schema,
            output_schema,
            scope_name,
            description,
            created_at: Utc::now(),
        }
    }

    pub fn signature_hash(&self) -> &str {
        &self.signature_hash
    }

    pub fn input_schema(&self) -> &SchemaNode {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &SchemaNode {
        &self.output_schema
    }

    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Identity is the hash; `created_at` is informational.
impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.signature_hash == other.signature_hash
    }
}

impl Eq for Signature {}

/// Computes the 64-character lowercase SHA-256 identity of a signature.
///
/// The scope name is hashed along with both schemas, so identically shaped
/// callables in different scopes never share an identity.
pub fn compute_hash(input: &SchemaNode, output: &SchemaNode, scope_name: &str) -> String {
    let combined = json!({
        "function_name": scope_name,
        "input": input.to_json(),
        "output": output.to_json(),
    });
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&combined).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compact JSON with object keys sorted at every level.
///
/// Sorting is explicit so the output does not depend on whether
/// `serde_json` was built with `preserve_order`.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
