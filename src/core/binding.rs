//! Mapping call-site arguments onto declared parameters.

use crate::core::function::{ParamKind, Parameter};
use crate::error::BindError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Serializes a value for capture.
///
/// Records become field maps and sequences become arrays. A value that
/// cannot be serialized is captured as null rather than failing the call.
pub fn to_capture_value<T: Serialize + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Could not serialize captured value: {}", e);
            Value::Null
        }
    }
}

/// Arguments as passed at a call site, serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.positional.push(to_capture_value(value));
        self
    }

    /// Appends a keyword argument.
    pub fn kwarg<T: Serialize + ?Sized>(mut self, name: impl Into<String>, value: &T) -> Self {
        self.keyword.push((name.into(), to_capture_value(value)));
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &[(String, Value)] {
        &self.keyword
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Reads positional argument `index` as `T`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Option<T> {
        self.positional
            .get(index)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Reads keyword argument `name` as `T`.
    pub fn get_kw<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.keyword
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| serde_json::from_value(value.clone()).ok())
    }

    /// The best-effort input used when binding fails: positional values
    /// keyed `arg0`, `arg1`, ... followed by keywords under their own names.
    pub fn fallback_input(&self) -> Value {
        let mut input = Map::new();
        for (i, value) in self.positional.iter().enumerate() {
            input.insert(format!("arg{}", i), value.clone());
        }
        for (name, value) in &self.keyword {
            input.insert(name.clone(), value.clone());
        }
        Value::Object(input)
    }
}

/// Values a wrapped callable can be invoked with.
///
/// Implemented for tuples of serializable values (positional arguments)
/// and for [`CallArgs`] itself, for callables that take keywords.
pub trait Arguments {
    fn call_args(&self) -> CallArgs;
}

impl Arguments for CallArgs {
    fn call_args(&self) -> CallArgs {
        self.clone()
    }
}

impl Arguments for () {
    fn call_args(&self) -> CallArgs {
        CallArgs::new()
    }
}

macro_rules! impl_arguments {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Serialize),+> Arguments for ($($name,)+) {
            fn call_args(&self) -> CallArgs {
                CallArgs::new()$(.arg(&self.$idx))+
            }
        }
    };
}

impl_arguments!(A: 0);
impl_arguments!(A: 0, B: 1);
impl_arguments!(A: 0, B: 1, C: 2);
impl_arguments!(A: 0, B: 1, C: 2, D: 3);
impl_arguments!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_arguments!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

/// Arguments mapped onto parameter names, in declaration order, with
/// defaults applied and receivers left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    arguments: Vec<(String, Value)>,
}

impl BoundArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().map(|(name, _)| name.as_str())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.arguments.into_iter().collect())
    }
}

/// Binds call-site arguments to declared parameters.
pub fn bind(params: &[Parameter], args: &CallArgs) -> Result<BoundArguments, BindError> {
    let regular: Vec<&Parameter> = params
        .iter()
        .filter(|param| param.kind == ParamKind::Regular)
        .collect();

    if args.positional.len() > regular.len() {
        return Err(BindError::TooManyPositional {
            expected: regular.len(),
            got: args.positional.len(),
        });
    }

    let mut slots: Vec<Option<Value>> = vec![None; regular.len()];
    for (slot, value) in slots.iter_mut().zip(&args.positional) {
        *slot = Some(value.clone());
    }

    for (name, value) in &args.keyword {
        let index = regular
            .iter()
            .position(|param| &param.name == name)
            .ok_or_else(|| BindError::UnknownKeyword(name.clone()))?;
        if slots[index].is_some() {
            return Err(BindError::DuplicateArgument(name.clone()));
        }
        slots[index] = Some(value.clone());
    }

    let mut arguments = Vec::with_capacity(regular.len());
    for (param, slot) in regular.into_iter().zip(slots) {
        let value = match (slot, &param.default) {
            (Some(value), _) => value,
            (None, Some(default)) => default.clone(),
            (None, None) => return Err(BindError::MissingArgument(param.name.clone())),
        };
        arguments.push((param.name.clone(), value));
    }

    Ok(BoundArguments { arguments })
}

/// The captured input of a call: bound arguments when binding succeeds,
/// the positional/keyword fallback otherwise.
pub fn capture_input(params: &[Parameter], args: &CallArgs) -> Value {
    match bind(params, args) {
        Ok(bound) => bound.into_value(),
        Err(e) => {
            log::warn!("Argument binding failed, capturing raw arguments: {}", e);
            args.fallback_input()
        }
    }
}
