use crate::core::binding::{capture_input, Arguments};
use crate::core::capture::CaptureAdapter;
use crate::core::function::FunctionDecl;
use crate::core::signature::Signature;
use serde_json::Value;
use std::sync::Arc;

/// The immutable state shared by every wrapper kind.
/// Sealing a declaration snapshots its identity once, at decoration time;
/// nothing about it changes per call.
pub struct Sealed {
    decl: FunctionDecl,
    signature: Arc<Signature>,
    adapter: CaptureAdapter,
}

impl Sealed {
    pub fn new(decl: FunctionDecl, adapter: CaptureAdapter) -> Self {
        let signature = Arc::new(Signature::from_decl(&decl));
        log::debug!(
            "Sealed {} as {}",
            signature.scope_name(),
            signature.signature_hash()
        );
        Self {
            decl,
            signature,
            adapter,
        }
    }

    pub fn decl(&self) -> &FunctionDecl {
        &self.decl
    }

    pub fn signature(&self) -> &Arc<Signature> {
        &self.signature
    }

    pub fn adapter(&self) -> &CaptureAdapter {
        &self.adapter
    }

    /// Serializes call-site arguments against the declared parameters.
    pub(crate) fn capture_input<A: Arguments + ?Sized>(&self, args: &A) -> Value {
        capture_input(self.decl.params(), &args.call_args())
    }

    pub(crate) fn emit(&self, input: Value, output: Value) {
        self.adapter.emit(&self.signature, input, output);
    }
}

/// Introspection shared by all wrapped callables.
pub trait Sealable {
    fn sealed(&self) -> &Sealed;

    fn is_async(&self) -> bool;

    /// The callable's own name, without its scope.
    fn name(&self) -> &str {
        self.sealed().decl().name()
    }

    fn doc(&self) -> Option<&str> {
        self.sealed().decl().documentation()
    }

    fn scope_name(&self) -> &str {
        self.sealed().signature().scope_name()
    }

    fn signature_hash(&self) -> &str {
        self.sealed().signature().signature_hash()
    }

    fn signature(&self) -> &Signature {
        self.sealed().signature()
    }

    fn decl(&self) -> &FunctionDecl {
        self.sealed().decl()
    }
}
