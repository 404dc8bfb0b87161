//! Writer-to-reader field mapping for schema evolution.
//!
//! A [`FieldMap`] tells the decoder, for every writer field in wire order,
//! which reader slot receives the value (or that the value must be skipped).
//! Maps are computed once per (reader, writer) schema instance pair and kept
//! in a [`FieldMapper`] cache for the lifetime of the decoder.
//!
//! Matching is shallow: a writer field matches a reader field
//! when the names are equal and the top-level type tags are equal. The first
//! matching reader field in declared order wins. No type promotion is applied.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::schema::{RecordSchema, SchemaId, SchemaKind};

/// Resolved field mapping from writer order to reader slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    /// Entry `i` is the reader slot for writer field `i`, or `None` to skip.
    slots: Vec<Option<usize>>,
    /// Reader slots that no writer field targets, in declared order.
    unmatched: Vec<usize>,
    /// Number of reader fields the map was built against.
    reader_len: usize,
    identity: bool,
}

impl FieldMap {
    /// Build the map for a writer/reader pair.
    ///
    /// When both arguments are the same instance the identity map is returned
    /// without scanning.
    pub fn build(reader: &RecordSchema, writer: &RecordSchema) -> Self {
        if reader.same_instance(writer) {
            return Self::identity(reader.fields().len());
        }

        let reader_len = reader.fields().len();
        let mut matched = vec![false; reader_len];
        let slots: Vec<Option<usize>> = writer
            .fields()
            .iter()
            .map(|field| {
                let slot = reader_slot(reader, &field.name, field.kind());
                if let Some(slot) = slot {
                    matched[slot] = true;
                }
                slot
            })
            .collect();

        let unmatched = matched
            .iter()
            .enumerate()
            .filter(|&(_, &hit)| !hit)
            .map(|(slot, _)| slot)
            .collect();

        Self {
            slots,
            unmatched,
            reader_len,
            identity: false,
        }
    }

    /// Identity map over `len` fields: writer field `k` goes to reader slot `k`.
    pub fn identity(len: usize) -> Self {
        Self {
            slots: (0..len).map(Some).collect(),
            unmatched: Vec::new(),
            reader_len: len,
            identity: true,
        }
    }

    /// Number of entries (the writer's field count).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Reader slot for writer field `writer_index`.
    ///
    /// Returns `None` both for unmatched fields and out-of-range indices.
    pub fn get(&self, writer_index: usize) -> Option<usize> {
        self.slots.get(writer_index).copied().flatten()
    }

    /// Iterate entries in writer order.
    pub fn iter(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.slots.iter().copied()
    }

    /// Reader slots with no writer counterpart.
    pub fn unmatched_slots(&self) -> &[usize] {
        &self.unmatched
    }

    /// Number of writer fields that land in a reader slot.
    pub fn matched_count(&self) -> usize {
        self.reader_len - self.unmatched.len()
    }

    /// Number of reader fields the map was built against.
    pub fn reader_len(&self) -> usize {
        self.reader_len
    }

    /// True when this map was produced by the same-instance fast path.
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Entries in the signed form used on other Avro implementations, with
    /// `-1` marking skipped writer fields.
    pub fn to_signed(&self) -> Vec<i64> {
        self.slots
            .iter()
            .map(|slot| slot.map_or(-1, |s| s as i64))
            .collect()
    }
}

/// First reader slot with an equal name and equal top-level type tag.
fn reader_slot(reader: &RecordSchema, name: &str, kind: SchemaKind) -> Option<usize> {
    reader
        .fields()
        .iter()
        .position(|field| field.name == name && field.kind() == kind)
}

type InnerCache = HashMap<SchemaId, Arc<FieldMap>>;

/// Two-level cache of field maps keyed by (reader id, writer id).
///
/// Lookups of populated pairs take only the shared read guard. Creating an
/// inner map for a new reader and inserting into it happen under one write
/// guard on the outer cache, so concurrent first requests cannot install
/// competing inner maps. Maps are built outside any lock; if two threads race
/// on the same pair the first insert wins and the equal duplicate is dropped.
#[derive(Debug, Default)]
pub struct FieldMapper {
    cache: RwLock<HashMap<SchemaId, InnerCache>>,
}

impl FieldMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the field map for a reader/writer pair, building it on first use.
    pub fn get_map(&self, reader: &RecordSchema, writer: &RecordSchema) -> Arc<FieldMap> {
        // Fast path: read lock only
        {
            let cache = self.cache.read();
            if let Some(map) = cache.get(&reader.id()).and_then(|inner| inner.get(&writer.id())) {
                return Arc::clone(map);
            }
        }

        let built = Arc::new(FieldMap::build(reader, writer));
        debug!(
            reader = %reader.fullname(),
            reader_id = %reader.id(),
            writer = %writer.fullname(),
            writer_id = %writer.id(),
            writer_fields = built.len(),
            reader_fields = built.reader_len(),
            matched = built.matched_count(),
            identity = built.is_identity(),
            "Built field map"
        );

        let mut cache = self.cache.write();
        let inner = cache.entry(reader.id()).or_default();
        Arc::clone(inner.entry(writer.id()).or_insert(built))
    }

    /// Number of cached (reader, writer) pairs.
    pub fn len(&self) -> usize {
        self.cache.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
