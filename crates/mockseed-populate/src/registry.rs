use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rand::RngCore;

use mockseed_config::PopulateConfig;
use mockseed_core::{CompositeRef, Field, FieldKind, PersistenceBackend, RecordId, Value};

use crate::errors::PopulateError;
use crate::handlers;
use crate::node::FieldNode;

/// Value generator for one field.
pub type HandlerFn =
    dyn Fn(&mut HandlerContext<'_>) -> Result<Value, PopulateError> + Send + Sync;

/// What a handler sees while generating a value.
pub struct HandlerContext<'a> {
    node: FieldNode<'a>,
    store: &'a dyn PersistenceBackend,
    rng: &'a mut dyn RngCore,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        node: FieldNode<'a>,
        store: &'a dyn PersistenceBackend,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self { node, store, rng }
    }

    pub fn node(&self) -> FieldNode<'a> {
        self.node
    }

    pub fn field(&self) -> &'a Field {
        self.node.field
    }

    pub fn composite(&self) -> &'a CompositeRef {
        self.node.composite
    }

    pub fn path(&self) -> String {
        self.node.path()
    }

    /// Read access to stored records, including the ones staged by this run.
    pub fn store(&self) -> &'a dyn PersistenceBackend {
        self.store
    }

    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }
}

/// Which tier of the registry a handler came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerSource {
    Strict,
    Global,
}

impl HandlerSource {
    /// Usage label for the run report.
    pub fn label(&self, node: &FieldNode<'_>) -> String {
        match self {
            HandlerSource::Strict => format!("strict:{}", node.path()),
            HandlerSource::Global => format!("global:{}", node.field.kind),
        }
    }
}

/// Two-tier handler lookup: exact field paths first, then field kinds.
///
/// Registering a key that is already present replaces the earlier handler.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    strict: HashMap<String, Arc<HandlerFn>>,
    global: HashMap<FieldKind, Arc<HandlerFn>>,
}

impl HandlerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `defaults` pack applied.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        handlers::defaults::register(&mut registry);
        registry
    }

    /// Build the registry a config asks for: defaults, then each listed pack
    /// in order, then constant strict values.
    pub fn from_config(config: &PopulateConfig) -> Result<Self, PopulateError> {
        let mut registry = Self::with_defaults();
        for pack in &config.handler_packs {
            if pack == handlers::DEFAULTS_PACK {
                continue;
            }
            registry.apply_pack(pack)?;
        }
        for (path, value) in &config.strict_values {
            registry.register_json_constant(path.clone(), value.clone());
        }
        Ok(registry)
    }

    pub fn apply_pack(&mut self, name: &str) -> Result<&mut Self, PopulateError> {
        handlers::apply_pack(self, name)?;
        Ok(self)
    }

    /// Install a handler for one exact `container.Composite.field` path.
    pub fn register_strict<F>(&mut self, path: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&mut HandlerContext<'_>) -> Result<Value, PopulateError> + Send + Sync + 'static,
    {
        self.strict.insert(path.into(), Arc::new(handler));
        self
    }

    /// Install a handler for every field of a kind.
    pub fn register_global<F>(&mut self, kind: FieldKind, handler: F) -> &mut Self
    where
        F: Fn(&mut HandlerContext<'_>) -> Result<Value, PopulateError> + Send + Sync + 'static,
    {
        self.global.insert(kind, Arc::new(handler));
        self
    }

    /// Strict handler for a constant read from a config file.
    ///
    /// On relation fields the constant names record ids: one id for a to-one
    /// relation, an id or a list of ids for a many relation.
    pub fn register_json_constant(
        &mut self,
        path: impl Into<String>,
        value: serde_json::Value,
    ) -> &mut Self {
        self.register_strict(path, move |ctx| match &ctx.field().relation {
            None => Ok(Value::from_json(&value)),
            Some(relation) => relation_constant(&value, relation.many).ok_or_else(|| {
                PopulateError::handler(
                    ctx.path(),
                    format!("{value} is not a record id for {}", relation.target()),
                )
            }),
        })
    }

    pub fn remove_strict(&mut self, path: &str) -> bool {
        self.strict.remove(path).is_some()
    }

    pub fn remove_global(&mut self, kind: &FieldKind) -> bool {
        self.global.remove(kind).is_some()
    }

    /// Best handler for a field, or `None` when nothing applies.
    ///
    /// With `strict_only` the kind-level fallback is not consulted.
    pub fn resolve(&self, node: &FieldNode<'_>, strict_only: bool) -> Option<&HandlerFn> {
        self.lookup(node, strict_only).map(|(_, handler)| handler)
    }

    pub fn lookup(
        &self,
        node: &FieldNode<'_>,
        strict_only: bool,
    ) -> Option<(HandlerSource, &HandlerFn)> {
        if let Some(handler) = self.strict.get(&node.path()) {
            return Some((HandlerSource::Strict, handler.as_ref()));
        }
        if strict_only {
            return None;
        }
        self.global
            .get(&node.field.kind)
            .map(|handler| (HandlerSource::Global, handler.as_ref()))
    }

    pub fn strict_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.strict.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn global_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.global.keys().map(|kind| kind.to_string()).collect();
        keys.sort();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.strict.is_empty() && self.global.is_empty()
    }
}

fn relation_constant(value: &serde_json::Value, many: bool) -> Option<Value> {
    let id = |value: &serde_json::Value| value.as_u64().map(RecordId::new);
    match value {
        serde_json::Value::Null if many => Some(Value::Refs(Vec::new())),
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Array(items) if many => items
            .iter()
            .map(id)
            .collect::<Option<Vec<_>>>()
            .map(Value::Refs),
        other if many => id(other).map(|id| Value::Refs(vec![id])),
        other => id(other).map(Value::Ref),
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("strict", &self.strict_keys())
            .field("global", &self.global_keys())
            .finish()
    }
}
