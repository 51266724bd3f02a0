//! Selva host-interop bridge
//!
//! Lets Selva scripts transparently call into, and be called from, a
//! reflected host runtime reached through the capability registry. The
//! bridge synthesizes script-callable members for host types, caches one
//! class descriptor per type, resolves overloads deterministically,
//! marshals values between the two universes, and adapts script closures
//! to host behavioral contracts.
//!
//! Everything hangs off a [`Bridge`]: the registry, the evaluator seam, the
//! per-type metadata caches, and the installed global surface.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod adapter;
pub mod classes;
pub mod globals;
pub mod marshal;
pub mod members;
pub mod rescue;
pub mod synth;

use std::sync::Arc;

use dashmap::DashMap;

use selva_core::ast::Stmt;
use selva_core::error::RuntimeResult;
use selva_core::host::registry::{HostType, TypeRegistry};
use selva_core::value::{Class, Instance};
use selva_core::Interpreter;

/// External lexer/parser collaborator
///
/// The bridge performs the synchronous file read itself and hands the source
/// text over; the frontend returns the parsed statement sequence.
pub trait Frontend: Send + Sync {
    /// Parse source text into a statement sequence
    fn parse(&self, source: &str) -> RuntimeResult<Vec<Stmt>>;
}

/// Start-up configuration for a bridge
#[derive(Default)]
pub struct BridgeOptions {
    /// Process-supplied arguments exposed through `ARGS`
    pub args: Vec<String>,
    /// Optional frontend collaborator backing `parse`
    pub frontend: Option<Arc<dyn Frontend>>,
}

/// The interop bridge: registry, caches, evaluator, and global surface
pub struct Bridge {
    registry: Arc<TypeRegistry>,
    interp: Interpreter,
    pub(crate) classes: DashMap<HostType, Arc<Class>>,
    pub(crate) statics: DashMap<HostType, Arc<Instance>>,
    frontend: Option<Arc<dyn Frontend>>,
    args: Vec<String>,
}

impl Bridge {
    /// Create a bridge over a registry with default options
    pub fn new(registry: Arc<TypeRegistry>) -> Arc<Bridge> {
        Self::with_options(registry, BridgeOptions::default())
    }

    /// Create a bridge over a registry and install the global surface
    pub fn with_options(registry: Arc<TypeRegistry>, options: BridgeOptions) -> Arc<Bridge> {
        let bridge = Arc::new(Bridge {
            registry,
            interp: Interpreter::new(),
            classes: DashMap::new(),
            statics: DashMap::new(),
            frontend: options.frontend,
            args: options.args,
        });
        globals::install(&bridge);
        bridge
    }

    /// The capability registry this bridge reflects over
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The evaluator seam the bridge dispatches script calls through
    pub fn interp(&self) -> &Interpreter {
        &self.interp
    }

    /// Process-supplied arguments
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub(crate) fn frontend(&self) -> Option<&Arc<dyn Frontend>> {
        self.frontend.as_ref()
    }
}
