//! Static metadata of a callable: its name, scope, parameters, return type
//! and documentation.

use crate::core::schema::decl::{Describe, TypeDecl};
use crate::core::scope::ScopePath;
use serde_json::Value;

/// How a callable receives its receiver, if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    /// A plain function.
    #[default]
    Free,
    /// Receiver is the instance, bound on every access.
    Instance,
    /// Receiver is the type itself, bound once.
    Class,
    /// No receiver.
    Static,
}

impl Binding {
    /// Name of the implicit receiver parameter this binding declares.
    pub fn receiver(&self) -> Option<&'static str> {
        match self {
            Binding::Instance => Some("self"),
            Binding::Class => Some("cls"),
            Binding::Free | Binding::Static => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// The implicit receiver of a method. Identity, not data.
    Receiver,
    Regular,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDecl,
    pub default: Option<Value>,
    pub kind: ParamKind,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeDecl) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            kind: ParamKind::Regular,
        }
    }

    pub fn of<T: Describe + ?Sized>(name: impl Into<String>) -> Self {
        Self::new(name, T::type_decl())
    }

    /// A parameter with no declared type.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, TypeDecl::Empty)
    }

    pub fn receiver(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeDecl::Empty,
            default: None,
            kind: ParamKind::Receiver,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_required(&self) -> bool {
        self.kind == ParamKind::Regular && self.default.is_none()
    }
}

/// Everything known about a callable at decoration time.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    name: String,
    scope: ScopePath,
    params: Vec<Parameter>,
    returns: TypeDecl,
    doc: Option<String>,
    binding: Binding,
}

impl FunctionDecl {
    /// Declares a free function `name` inside `scope`.
    ///
    /// The scope is the path of everything enclosing the function; the
    /// function's own name is appended to it when resolving.
    pub fn new(scope: ScopePath, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope,
            params: Vec::new(),
            returns: TypeDecl::Empty,
            doc: None,
            binding: Binding::Free,
        }
    }

    /// Declares a function from its Rust item, using the item's path as
    /// the scope and its last segment as the name.
    pub fn of_item<F>(item: &F) -> Self {
        let mut path = ScopePath::of_item(item);
        let name = path.pop().unwrap_or_default();
        Self::new(path, name)
    }

    /// Sets the binding style, declaring the receiver parameter if the
    /// style has one.
    pub fn binding(mut self, binding: Binding) -> Self {
        self.params.retain(|param| param.kind != ParamKind::Receiver);
        if let Some(receiver) = binding.receiver() {
            self.params.insert(0, Parameter::receiver(receiver));
        }
        self.binding = binding;
        self
    }

    pub fn method(self) -> Self {
        self.binding(Binding::Instance)
    }

    pub fn class_method(self) -> Self {
        self.binding(Binding::Class)
    }

    pub fn static_method(self) -> Self {
        self.binding(Binding::Static)
    }

    /// Adds a required parameter of type `T`.
    pub fn param<T: Describe + ?Sized>(self, name: impl Into<String>) -> Self {
        self.push(Parameter::of::<T>(name))
    }

    /// Adds a parameter of type `T` with a declared default.
    pub fn param_with_default<T: Describe + ?Sized>(
        self,
        name: impl Into<String>,
        default: Value,
    ) -> Self {
        self.push(Parameter::of::<T>(name).with_default(default))
    }

    pub fn push(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns<T: Describe + ?Sized>(self) -> Self {
        self.returns_decl(T::type_decl())
    }

    pub fn returns_decl(mut self, returns: TypeDecl) -> Self {
        self.returns = returns;
        self
    }

    /// Attaches documentation text. Blank text is dropped.
    pub fn doc(mut self, doc: impl AsRef<str>) -> Self {
        self.doc = clean_doc(doc.as_ref());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &ScopePath {
        &self.scope
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn returns_type(&self) -> &TypeDecl {
        &self.returns
    }

    pub fn documentation(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn binding_style(&self) -> Binding {
        self.binding
    }

    /// The globally unique dotted name of this callable.
    pub fn scope_name(&self) -> String {
        self.scope.resolve(&self.name)
    }
}

/// Strips the common leading indentation of documentation text along with
/// leading and trailing blank lines.
pub fn clean_doc(doc: &str) -> Option<String> {
    let lines: Vec<&str> = doc.lines().map(str::trim_end).collect();

    let indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let line: &str = line;
            if i == 0 {
                line.trim_start()
            } else {
                line.get(indent..).unwrap_or_else(|| line.trim_start())
            }
        })
        .collect();

    let first = cleaned.iter().position(|line| !line.is_empty())?;
    let last = cleaned.iter().rposition(|line| !line.is_empty())?;
    Some(cleaned[first..=last].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> ScopePath {
        ScopePath::new("app::services")
    }

    #[test]
    fn test_binding_declares_receiver() {
        let decl = FunctionDecl::new(scope().class("CustomerService"), "generate_response")
            .param::<String>("query")
            .method();
        assert_eq!(decl.params()[0].name, "self");
        assert_eq!(decl.params()[0].kind, ParamKind::Receiver);
        assert_eq!(decl.params()[1].name, "query");

        let decl = decl.class_method();
        assert_eq!(decl.params()[0].name, "cls");
        assert_eq!(decl.params().len(), 2);

        let decl = decl.static_method();
        assert_eq!(decl.params().len(), 1);
        assert_eq!(decl.binding_style(), Binding::Static);
    }

    #[test]
    fn test_binding_does_not_change_scope_name() {
        let base = FunctionDecl::new(scope().class("Svc"), "run");
        let names: Vec<String> = [
            Binding::Free,
            Binding::Instance,
            Binding::Class,
            Binding::Static,
        ]
        .into_iter()
        .map(|binding| base.clone().binding(binding).scope_name())
        .collect();
        assert!(names.iter().all(|name| name == "app.services.Svc.run"));
    }

    #[test]
    fn test_required_parameters() {
        let decl = FunctionDecl::new(scope(), "answer")
            .param::<String>("query")
            .param_with_default::<i64>("max_tokens", json!(100));
        assert!(decl.params()[0].is_required());
        assert!(!decl.params()[1].is_required());
    }

    #[test]
    fn test_clean_doc() {
        let doc = "
            Summarize a document.

              Indented detail.
        ";
        assert_eq!(
            clean_doc(doc).as_deref(),
            Some("Summarize a document.\n\n  Indented detail.")
        );
        assert_eq!(clean_doc("   \n  "), None);
        assert_eq!(clean_doc("One line").as_deref(), Some("One line"));
    }

    fn helper() {}

    #[test]
    fn test_of_item_splits_name_from_scope() {
        let decl = FunctionDecl::of_item(&helper);
        assert_eq!(decl.name(), "helper");
        assert!(decl.scope_name().ends_with("function.tests.helper"));
    }
}
