//! Extension dispatch: resolving a namespace URI to a handler and
//! containing handler failures.
//!
//! The registry is per-run state. A namespace is resolved at most once,
//! through the installed loaders and the stylesheet's declared
//! script/class metadata; the outcome — including failure to resolve —
//! is cached for the rest of the run. Handler faults are explicit
//! [`Result`] values, never unwinding control flow: the dispatcher turns
//! them into a warning plus fallback execution.

use crate::ast::ExtensionDecl;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use weft_model::node::{Name, SourceNode};
use weft_model::sink::EventSink;

#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct ExtensionError(pub String);

impl ExtensionError {
    pub fn new(message: impl Into<String>) -> Self {
        ExtensionError(message.into())
    }
}

/// One extension-instruction invocation, with attribute value templates
/// already evaluated against the calling context.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionInvocation {
    pub namespace: String,
    pub local_name: String,
    pub attributes: Vec<(Name, String)>,
}

/// A resolved extension handler. Output goes through the sink it is
/// handed; the dispatcher isolates that sink, so a failing handler
/// leaves no partial output behind.
pub trait ExtensionHandler<'a, N: SourceNode<'a>> {
    fn invoke(
        &self,
        call: &ExtensionInvocation,
        node: Option<N>,
        sink: &mut dyn EventSink,
    ) -> Result<(), ExtensionError>;
}

/// Turns declared metadata into a handler. Loaders are tried in
/// registration order; the first one that recognizes the declaration
/// wins. A general scripting loader and a native-class loader are the
/// expected implementations.
pub trait HandlerLoader<'a, N: SourceNode<'a>> {
    fn load(
        &self,
        namespace: &str,
        decl: &ExtensionDecl,
    ) -> Option<Arc<dyn ExtensionHandler<'a, N> + 'a>>;
}

/// Adapter making a closure usable as a handler.
pub struct FnHandler<F>(pub F);

impl<'a, N, F> ExtensionHandler<'a, N> for FnHandler<F>
where
    N: SourceNode<'a>,
    F: Fn(&ExtensionInvocation, Option<N>, &mut dyn EventSink) -> Result<(), ExtensionError>,
{
    fn invoke(
        &self,
        call: &ExtensionInvocation,
        node: Option<N>,
        sink: &mut dyn EventSink,
    ) -> Result<(), ExtensionError> {
        (self.0)(call, node, sink)
    }
}

/// Per-run namespace → handler map with lazy, memoized resolution.
pub struct ExtensionRegistry<'a, N: SourceNode<'a>> {
    loaders: Vec<Box<dyn HandlerLoader<'a, N> + 'a>>,
    cache: HashMap<String, Option<Arc<dyn ExtensionHandler<'a, N> + 'a>>>,
}

impl<'a, N: SourceNode<'a>> Default for ExtensionRegistry<'a, N> {
    fn default() -> Self {
        ExtensionRegistry {
            loaders: Vec::new(),
            cache: HashMap::new(),
        }
    }
}

impl<'a, N: SourceNode<'a>> ExtensionRegistry<'a, N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_loader(&mut self, loader: Box<dyn HandlerLoader<'a, N> + 'a>) {
        self.loaders.push(loader);
    }

    /// Installs a handler directly, bypassing loader resolution.
    pub fn register_handler(
        &mut self,
        namespace: impl Into<String>,
        handler: Arc<dyn ExtensionHandler<'a, N> + 'a>,
    ) {
        self.cache.insert(namespace.into(), Some(handler));
    }

    /// Resolves the handler for a namespace, consulting the loaders on
    /// first reference and caching the outcome. `None` means the
    /// namespace is unavailable for the rest of the run.
    pub fn handler_for(
        &mut self,
        namespace: &str,
        decl: Option<&ExtensionDecl>,
    ) -> Option<Arc<dyn ExtensionHandler<'a, N> + 'a>> {
        if let Some(cached) = self.cache.get(namespace) {
            return cached.clone();
        }
        let resolved = decl.and_then(|decl| {
            self.loaders
                .iter()
                .find_map(|loader| loader.load(namespace, decl))
        });
        if resolved.is_none() {
            log::debug!("extension namespace '{}' did not resolve to a handler", namespace);
        }
        self.cache.insert(namespace.to_string(), resolved.clone());
        resolved
    }
}
