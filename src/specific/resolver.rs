//! Schema name to generated type resolution.
//!
//! Generated types are registered once at startup into a [`TypeRegistry`].
//! The [`TypeResolver`] maps writer schema names onto registered types and
//! memoizes each successful lookup.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::error::ResolutionError;
use crate::schema::RecordSchema;

use super::record::{Generated, SpecificRecord};

/// Descriptor of a registered generated type.
pub struct TargetType {
    name: String,
    type_id: TypeId,
    rust_type: &'static str,
    schema: Arc<RecordSchema>,
    construct: fn() -> Box<dyn SpecificRecord>,
}

fn construct_default<T: Generated>() -> Box<dyn SpecificRecord> {
    Box::new(T::default())
}

impl TargetType {
    /// Describe `T`, registered under its schema's full name.
    pub fn of<T: Generated>() -> Self {
        let schema = Arc::clone(T::class_schema());
        Self {
            name: schema.fullname().to_string(),
            type_id: TypeId::of::<T>(),
            rust_type: std::any::type_name::<T>(),
            schema,
            construct: construct_default::<T>,
        }
    }

    /// Name the type is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn rust_type(&self) -> &'static str {
        self.rust_type
    }

    /// New instance with every slot empty.
    pub fn construct(&self) -> Box<dyn SpecificRecord> {
        (self.construct)()
    }

    /// Whether `record` is an instance of this type.
    pub fn is_instance(&self, record: &dyn SpecificRecord) -> bool {
        record.as_any().type_id() == self.type_id
    }
}

impl fmt::Debug for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetType")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type)
            .field("schema", &self.schema.id())
            .finish()
    }
}

/// Explicit table of generated types, keyed by schema full name.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<TargetType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its schema's full name.
    pub fn register<T: Generated>(&mut self) -> &mut Self {
        let target = TargetType::of::<T>();
        let name = target.name.clone();
        self.insert(name, target)
    }

    /// Register `T` under an explicit name, e.g. an alias used by older writers.
    pub fn register_as<T: Generated>(&mut self, name: impl Into<String>) -> &mut Self {
        let mut target = TargetType::of::<T>();
        target.name = name.into();
        let name = target.name.clone();
        self.insert(name, target)
    }

    /// Builder form of [`TypeRegistry::register`].
    pub fn with<T: Generated>(mut self) -> Self {
        self.register::<T>();
        self
    }

    fn insert(&mut self, name: String, target: TargetType) -> &mut Self {
        let rust_type = target.rust_type;
        if let Some(previous) = self.types.insert(name.clone(), Arc::new(target)) {
            info!(
                name = %name,
                previous = previous.rust_type,
                replacement = rust_type,
                "Replaced registered specific type"
            );
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TargetType>> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Memoizing resolver over a [`TypeRegistry`].
///
/// The cache is append-only. Two threads racing on the same first lookup
/// both consult the registry and store the same `Arc`.
#[derive(Debug)]
pub struct TypeResolver {
    registry: Arc<TypeRegistry>,
    namespace: Option<String>,
    cache: DashMap<String, Arc<TargetType>>,
}

impl TypeResolver {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_namespace(registry, None)
    }

    /// Resolver that looks names up as `"{namespace}.{simple name}"`.
    pub fn with_namespace(registry: Arc<TypeRegistry>, namespace: Option<String>) -> Self {
        Self {
            registry,
            namespace,
            cache: DashMap::new(),
        }
    }

    /// Resolve the target type for a record schema.
    pub fn resolve_schema(
        &self,
        schema: &RecordSchema,
    ) -> Result<Arc<TargetType>, ResolutionError> {
        match &self.namespace {
            Some(_) => self.resolve(schema.name()),
            None => self.resolve(schema.fullname()),
        }
    }

    /// Resolve a type name.
    ///
    /// With a configured namespace only the simple part of `name` is kept.
    pub fn resolve(&self, name: &str) -> Result<Arc<TargetType>, ResolutionError> {
        let key = self.qualify(name);
        if let Some(hit) = self.cache.get(key.as_ref()) {
            return Ok(Arc::clone(hit.value()));
        }

        match self.registry.get(key.as_ref()) {
            Some(target) => {
                debug!(
                    name = %key,
                    rust_type = target.rust_type(),
                    "Resolved specific type"
                );
                let target = Arc::clone(target);
                self.cache.insert(key.into_owned(), Arc::clone(&target));
                Ok(target)
            }
            None => {
                warn!(name = %key, "No specific type registered");
                Err(ResolutionError::UnknownType {
                    name: key.into_owned(),
                })
            }
        }
    }

    fn qualify<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match &self.namespace {
            Some(ns) => {
                let simple = name.rsplit('.').next().unwrap_or(name);
                Cow::Owned(format!("{}.{}", ns, simple))
            }
            None => Cow::Borrowed(name),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Number of memoized names.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
