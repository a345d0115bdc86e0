//! Globally unique dotted names for instrumented callables.
//!
//! A scope name is `<module path>.<enclosing declarations>.<name>`. It is
//! computed once from static metadata and never depends on how the callable
//! is later invoked, so two methods with the same name in different types
//! always resolve differently.

use crate::core::function::FunctionDecl;

const CLOSURE_MARKER: &str = "{{closure}}";
const CLOSURE_SEGMENT: &str = "<closure>";

/// The lexical path enclosing a callable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopePath {
    module: Vec<String>,
    nesting: Vec<String>,
}

impl ScopePath {
    /// Starts a path from a module path such as the output of `module_path!()`.
    pub fn new(module: &str) -> Self {
        Self {
            module: split_path(module),
            nesting: Vec::new(),
        }
    }

    /// Enters an enclosing type.
    pub fn class(self, name: impl Into<String>) -> Self {
        self.nested(name)
    }

    /// Enters an enclosing function.
    pub fn function(self, name: impl Into<String>) -> Self {
        self.nested(name)
    }

    pub fn nested(mut self, name: impl Into<String>) -> Self {
        self.nesting.push(name.into());
        self
    }

    /// Derives the full path of a Rust item from its type name.
    ///
    /// Works for function items, including methods and functions nested in
    /// other functions. Closures are reported as `<closure>` inside their
    /// enclosing function and should be given an explicit name instead.
    pub fn of_item<F>(_item: &F) -> Self {
        Self::from_type_name(std::any::type_name::<F>())
    }

    /// Parses a Rust type path. Segments up to the first one that looks like
    /// a type are treated as the module path.
    pub fn from_type_name(type_name: &str) -> Self {
        let segments = split_path(type_name);
        let boundary = segments
            .iter()
            .position(|segment| segment.starts_with(|c: char| c.is_ascii_uppercase()))
            .unwrap_or(segments.len().saturating_sub(1));
        let (module, nesting) = segments.split_at(boundary);
        Self {
            module: module.to_vec(),
            nesting: nesting.to_vec(),
        }
    }

    /// Removes and returns the innermost segment.
    pub fn pop(&mut self) -> Option<String> {
        self.nesting.pop().or_else(|| self.module.pop())
    }

    pub fn module(&self) -> String {
        self.module.join(".")
    }

    pub fn nesting(&self) -> &[String] {
        &self.nesting
    }

    /// The dotted scope name of `name` declared inside this path.
    pub fn resolve(&self, name: &str) -> String {
        self.module
            .iter()
            .chain(self.nesting.iter())
            .map(String::as_str)
            .chain(std::iter::once(name))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Resolves the scope name of a declared callable.
pub fn resolve(decl: &FunctionDecl) -> String {
    decl.scope().resolve(decl.name())
}

/// Splits a Rust path on `::` outside generic brackets, dropping generic
/// arguments and expanding qualified `<Type as Trait>` segments to the type.
fn split_path(path: &str) -> Vec<String> {
    let mut raw = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let bytes = path.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                raw.push(&path[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    raw.push(&path[start..]);

    let mut segments = Vec::new();
    for segment in raw {
        let segment = segment.trim();
        if let Some(qualified) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            let self_type = qualified.split(" as ").next().unwrap_or(qualified);
            segments.extend(split_path(self_type));
        } else if segment == CLOSURE_MARKER {
            segments.push(CLOSURE_SEGMENT.to_string());
        } else {
            let base = segment.split('<').next().unwrap_or(segment).trim();
            if !base.is_empty() {
                segments.push(base.to_string());
            }
        }
    }
    segments
}

/// Builds a [`ScopePath`] rooted at the calling module.
///
/// ```rust
/// use blackbox::scope;
///
/// let path = scope!("CustomerService");
/// assert!(path.resolve("generate_response").ends_with("CustomerService.generate_response"));
/// ```
#[macro_export]
macro_rules! scope {
    () => {
        $crate::ScopePath::new(module_path!())
    };
    ($($segment:expr),+ $(,)?) => {
        $crate::ScopePath::new(module_path!())$(.nested($segment))+
    };
}
