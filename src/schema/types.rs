//! Avro schema types and representations.
//!
//! Schemas are immutable once built. Record schemas carry a process-unique
//! [`SchemaId`] assigned at construction, so two structurally identical
//! records compare equal with `==` but are still distinct instances for
//! caching purposes.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::error::SchemaError;

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a record schema instance.
///
/// Ids come from a global monotonic counter and are never reused, so a cache
/// keyed by `SchemaId` cannot confuse a dropped schema with a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u64);

impl SchemaId {
    fn next() -> Self {
        SchemaId(NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Top-level type tag of a schema.
///
/// Field matching between reader and writer compares only this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record,
    Enum,
    Array,
    Map,
    Union,
    Fixed,
}

impl SchemaKind {
    /// Avro name of the type tag.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::Bytes => "bytes",
            SchemaKind::String => "string",
            SchemaKind::Record => "record",
            SchemaKind::Enum => "enum",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Union => "union",
            SchemaKind::Fixed => "fixed",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents an Avro schema.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroSchema {
    // Primitive types
    /// Null type - no value.
    Null,
    /// Boolean type.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit IEEE 754 floating-point.
    Float,
    /// 64-bit IEEE 754 floating-point.
    Double,
    /// Sequence of bytes.
    Bytes,
    /// Unicode string.
    String,

    // Complex types
    /// Record type with named fields. Shared so clones keep the same identity.
    Record(Arc<RecordSchema>),
    /// Enumeration type.
    Enum(EnumSchema),
    /// Array of items with a single schema.
    Array(Box<AvroSchema>),
    /// Map with string keys and values of a single schema.
    Map(Box<AvroSchema>),
    /// Union of multiple schemas.
    Union(Vec<AvroSchema>),
    /// Fixed-size byte array.
    Fixed(FixedSchema),
}

/// Schema for a record type.
///
/// Construction validates field-name uniqueness and assigns each field its
/// declared position. Equality is structural and ignores [`SchemaId`]; use
/// [`RecordSchema::same_instance`] for identity.
#[derive(Debug)]
pub struct RecordSchema {
    id: SchemaId,
    name: String,
    namespace: Option<String>,
    fullname: String,
    fields: Vec<FieldSchema>,
    doc: Option<String>,
    field_index: HashMap<String, usize>,
}

impl RecordSchema {
    /// Create a new RecordSchema with the given name and fields.
    ///
    /// Field positions are reassigned to their index in `fields`.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::InvalidSchema(
                "Record name must not be empty".to_string(),
            ));
        }

        let mut field_index = HashMap::with_capacity(fields.len());
        let mut fields = fields;
        for (position, field) in fields.iter_mut().enumerate() {
            field.position = position;
            if field_index.insert(field.name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateField {
                    record: name,
                    field: field.name.clone(),
                });
            }
        }

        Ok(Self {
            id: SchemaId::next(),
            fullname: name.clone(),
            name,
            namespace: None,
            fields,
            doc: None,
            field_index,
        })
    }

    /// Create a record from a dotted full name such as `com.example.User`.
    pub fn from_fullname(fullname: &str, fields: Vec<FieldSchema>) -> Result<Self, SchemaError> {
        match fullname.rsplit_once('.') {
            Some((namespace, name)) => Ok(Self::new(name, fields)?.with_namespace(namespace)),
            None => Self::new(fullname, fields),
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        if namespace.is_empty() {
            self.namespace = None;
            self.fullname = self.name.clone();
        } else {
            self.fullname = format!("{}.{}", namespace, self.name);
            self.namespace = Some(namespace);
        }
        self
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Identity of this instance.
    pub fn id(&self) -> SchemaId {
        self.id
    }

    /// True when both references denote the same schema instance.
    pub fn same_instance(&self, other: &RecordSchema) -> bool {
        self.id == other.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Fields in declared order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.field_index.get(name).map(|&idx| &self.fields[idx])
    }

    /// Check whether a field with this name exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.field_index.contains_key(name)
    }

    /// Serialize the record schema to a JSON Value.
    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!("record"));
        obj.insert("name".to_string(), json!(&self.name));

        if let Some(ns) = &self.namespace {
            obj.insert("namespace".to_string(), json!(ns));
        }

        if let Some(doc) = &self.doc {
            obj.insert("doc".to_string(), json!(doc));
        }

        let fields: Vec<Value> = self.fields.iter().map(|f| f.to_json_value()).collect();
        obj.insert("fields".to_string(), Value::Array(fields));

        Value::Object(obj)
    }
}

impl PartialEq for RecordSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.namespace == other.namespace
            && self.doc == other.doc
            && self.fields == other.fields
    }
}

impl From<RecordSchema> for AvroSchema {
    fn from(record: RecordSchema) -> Self {
        AvroSchema::Record(Arc::new(record))
    }
}

impl From<Arc<RecordSchema>> for AvroSchema {
    fn from(record: Arc<RecordSchema>) -> Self {
        AvroSchema::Record(record)
    }
}

/// Schema for a field within a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// The name of the field.
    pub name: String,
    /// The schema of the field's value.
    pub schema: AvroSchema,
    /// Declared position within the owning record.
    pub position: usize,
    /// Optional documentation.
    pub doc: Option<String>,
}

impl FieldSchema {
    /// Create a new FieldSchema with the given name and schema.
    ///
    /// The position is assigned when the field is added to a record.
    pub fn new(name: impl Into<String>, schema: AvroSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            position: 0,
            doc: None,
        }
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Top-level type tag of this field.
    pub fn kind(&self) -> SchemaKind {
        self.schema.kind()
    }

    /// Serialize the field schema to a JSON Value.
    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), json!(&self.name));
        obj.insert("type".to_string(), self.schema.to_json_value());

        if let Some(doc) = &self.doc {
            obj.insert("doc".to_string(), json!(doc));
        }

        Value::Object(obj)
    }
}

/// Schema for an enumeration type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    /// The name of the enum.
    pub name: String,
    /// Optional namespace for the enum.
    pub namespace: Option<String>,
    /// The symbols (variants) of the enum.
    pub symbols: Vec<String>,
}

impl EnumSchema {
    /// Create a new EnumSchema with the given name and symbols.
    pub fn new(name: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            symbols,
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Get the index of a symbol.
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Serialize the enum schema to a JSON Value.
    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!("enum"));
        obj.insert("name".to_string(), json!(&self.name));
        if let Some(ns) = &self.namespace {
            obj.insert("namespace".to_string(), json!(ns));
        }
        obj.insert("symbols".to_string(), json!(&self.symbols));
        Value::Object(obj)
    }
}

/// Schema for a fixed-size byte array.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    /// The name of the fixed type.
    pub name: String,
    /// Optional namespace for the fixed type.
    pub namespace: Option<String>,
    /// The size in bytes.
    pub size: usize,
}

impl FixedSchema {
    /// Create a new FixedSchema with the given name and size.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            size,
        }
    }

    /// Serialize the fixed schema to a JSON Value.
    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!("fixed"));
        obj.insert("name".to_string(), json!(&self.name));
        if let Some(ns) = &self.namespace {
            obj.insert("namespace".to_string(), json!(ns));
        }
        obj.insert("size".to_string(), json!(self.size));
        Value::Object(obj)
    }
}

impl AvroSchema {
    /// Top-level type tag.
    pub fn kind(&self) -> SchemaKind {
        match self {
            AvroSchema::Null => SchemaKind::Null,
            AvroSchema::Boolean => SchemaKind::Boolean,
            AvroSchema::Int => SchemaKind::Int,
            AvroSchema::Long => SchemaKind::Long,
            AvroSchema::Float => SchemaKind::Float,
            AvroSchema::Double => SchemaKind::Double,
            AvroSchema::Bytes => SchemaKind::Bytes,
            AvroSchema::String => SchemaKind::String,
            AvroSchema::Record(_) => SchemaKind::Record,
            AvroSchema::Enum(_) => SchemaKind::Enum,
            AvroSchema::Array(_) => SchemaKind::Array,
            AvroSchema::Map(_) => SchemaKind::Map,
            AvroSchema::Union(_) => SchemaKind::Union,
            AvroSchema::Fixed(_) => SchemaKind::Fixed,
        }
    }

    /// Check if this schema is a primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            AvroSchema::Null
                | AvroSchema::Boolean
                | AvroSchema::Int
                | AvroSchema::Long
                | AvroSchema::Float
                | AvroSchema::Double
                | AvroSchema::Bytes
                | AvroSchema::String
        )
    }

    /// Get the name of a named type, if applicable.
    pub fn name(&self) -> Option<&str> {
        match self {
            AvroSchema::Record(r) => Some(r.name()),
            AvroSchema::Enum(e) => Some(&e.name),
            AvroSchema::Fixed(f) => Some(&f.name),
            _ => None,
        }
    }

    /// The record schema, if this is a record.
    pub fn as_record(&self) -> Option<&Arc<RecordSchema>> {
        match self {
            AvroSchema::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Convenience for a nullable union `["null", inner]`.
    pub fn nullable(inner: AvroSchema) -> Self {
        AvroSchema::Union(vec![AvroSchema::Null, inner])
    }

    /// Serialize the schema to a JSON string.
    ///
    /// # Example
    /// ```
    /// use specific_avro::schema::AvroSchema;
    ///
    /// let schema = AvroSchema::String;
    /// assert_eq!(schema.to_json(), r#""string""#);
    /// ```
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Serialize the schema to a JSON Value.
    pub fn to_json_value(&self) -> Value {
        match self {
            AvroSchema::Null => json!("null"),
            AvroSchema::Boolean => json!("boolean"),
            AvroSchema::Int => json!("int"),
            AvroSchema::Long => json!("long"),
            AvroSchema::Float => json!("float"),
            AvroSchema::Double => json!("double"),
            AvroSchema::Bytes => json!("bytes"),
            AvroSchema::String => json!("string"),
            AvroSchema::Record(r) => r.to_json_value(),
            AvroSchema::Enum(e) => e.to_json_value(),
            AvroSchema::Array(items) => json!({
                "type": "array",
                "items": items.to_json_value()
            }),
            AvroSchema::Map(values) => json!({
                "type": "map",
                "values": values.to_json_value()
            }),
            AvroSchema::Union(variants) => {
                Value::Array(variants.iter().map(|v| v.to_json_value()).collect())
            }
            AvroSchema::Fixed(f) => f.to_json_value(),
        }
    }
}

impl fmt::Display for AvroSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json_value())
    }
}
