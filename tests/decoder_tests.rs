//! End-to-end tests for decoding generated records across schema versions.

use std::sync::Arc;

use specific_avro::schema::{AvroSchema, FieldSchema, RecordSchema};
use specific_avro::specific::{
    DecoderConfig, Generated, RecordAccess, SpecificDecoder, SpecificRecord, TypeRegistry,
};
use specific_avro::reader::write_zigzag;
use specific_avro::{
    encode_record, specific_record, AvroValue, BinaryCursor, DecodeError, ResolutionError,
    SchemaError, SpecificError,
};

specific_record! {
    /// Reader with fields in the opposite order of the common writer.
    pub struct Swapped("test.Swapped") {
        0 => b: String = AvroSchema::String,
        1 => a: i32 = AvroSchema::Int,
    }
}

specific_record! {
    /// Reader with one field more than its writer.
    pub struct Wide("test.Wide") {
        0 => a: i32 = AvroSchema::Int,
        1 => c: i32 = AvroSchema::Int,
    }
}

specific_record! {
    /// Reader with one field less than its writer.
    pub struct Narrow("test.Narrow") {
        0 => a: i32 = AvroSchema::Int,
    }
}

specific_record! {
    /// Reader whose `x` has a different type tag than the writer's.
    pub struct Retyped("test.Retyped") {
        0 => x: String = AvroSchema::String,
        1 => y: i64 = AvroSchema::Long,
    }
}

specific_record! {
    /// Record exercising complex field types.
    pub struct Order("shop.v2.Order") {
        0 => id: i64 = AvroSchema::Long,
        1 => lines: AvroValue = AvroSchema::Array(Box::new(AvroSchema::String)),
        2 => note: AvroValue = AvroSchema::nullable(AvroSchema::String),
        3 => paid: bool = AvroSchema::Boolean,
    }
}

specific_record! {
    /// Record holding a list of ints.
    pub struct Holder("test.Holder") {
        0 => xs: AvroValue = AvroSchema::Array(Box::new(AvroSchema::Int)),
    }
}

specific_record! {
    /// Nested reader record.
    pub struct Address("test.Address") {
        0 => street: String = AvroSchema::String,
        1 => zip: i32 = AvroSchema::Int,
    }
}

specific_record! {
    /// Reader embedding a generated record.
    pub struct Customer("test.Customer") {
        0 => name: String = AvroSchema::String,
        1 => address: Address = AvroSchema::from(Arc::clone(Address::class_schema())),
    }
}

fn registry() -> Arc<TypeRegistry> {
    Arc::new(
        TypeRegistry::new()
            .with::<Swapped>()
            .with::<Wide>()
            .with::<Narrow>()
            .with::<Retyped>()
            .with::<Order>()
            .with::<Holder>()
            .with::<Address>()
            .with::<Customer>(),
    )
}

fn writer(fullname: &str, fields: Vec<FieldSchema>) -> RecordSchema {
    RecordSchema::from_fullname(fullname, fields).unwrap()
}

fn int(v: i32) -> AvroValue {
    AvroValue::Int(v)
}

fn string(v: &str) -> AvroValue {
    AvroValue::String(v.to_string())
}

/// Route decoder logs to the test harness; filter with `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn downcast<T: Generated>(record: Box<dyn SpecificRecord>) -> T {
    *record.into_any().downcast::<T>().unwrap()
}

// ============================================================================
// Field mapping through decode
// ============================================================================

#[test]
fn test_reordered_fields() {
    init_tracing();
    let decoder = SpecificDecoder::new(registry());
    let writer = writer(
        "test.Swapped",
        vec![
            FieldSchema::new("a", AvroSchema::Int),
            FieldSchema::new("b", AvroSchema::String),
        ],
    );
    let bytes = encode_record(&[("a", int(5)), ("b", string("x"))], &writer).unwrap();

    let mut cursor = BinaryCursor::new(&bytes);
    let record: Swapped = decoder.decode_into(None, &writer, &mut cursor).unwrap();

    assert_eq!(record.a, Some(5));
    assert_eq!(record.b.as_deref(), Some("x"));
    assert!(cursor.is_empty());

    let map = decoder
        .field_mapper()
        .get_map(Swapped::class_schema(), &writer);
    assert_eq!(map.to_signed(), vec![1, 0]);
}

#[test]
fn test_added_reader_field_is_empty() {
    let decoder = SpecificDecoder::new(registry());
    let writer = writer("test.Wide", vec![FieldSchema::new("a", AvroSchema::Int)]);
    let bytes = encode_record(&[("a", int(7))], &writer).unwrap();

    let mut cursor = BinaryCursor::new(&bytes);
    let record: Wide = decoder.decode_into(None, &writer, &mut cursor).unwrap();

    assert_eq!(record, Wide { a: Some(7), c: None });
}

#[test]
fn test_removed_writer_field_is_skipped() {
    let decoder = SpecificDecoder::new(registry());
    let writer = writer(
        "test.Narrow",
        vec![
            FieldSchema::new("a", AvroSchema::Int),
            FieldSchema::new("b", AvroSchema::String),
        ],
    );
    let mut bytes = encode_record(&[("a", int(3)), ("b", string("y"))], &writer).unwrap();
    let record_len = bytes.len();
    bytes.extend_from_slice(&[0xff, 0xff]);

    let mut cursor = BinaryCursor::new(&bytes);
    let record: Narrow = decoder.decode_into(None, &writer, &mut cursor).unwrap();

    assert_eq!(record, Narrow { a: Some(3) });
    // int 3 (1 byte) + string "y" (1 length byte + 1 byte)
    assert_eq!(record_len, 3);
    assert_eq!(cursor.position(), record_len);
    assert_eq!(cursor.remaining(), &[0xff, 0xff]);
}

#[test]
fn test_type_tag_mismatch_skips_and_clears() {
    init_tracing();
    let decoder = SpecificDecoder::new(registry());
    let writer = writer(
        "test.Retyped",
        vec![
            FieldSchema::new("x", AvroSchema::Int),
            FieldSchema::new("y", AvroSchema::Long),
        ],
    );
    let bytes = encode_record(&[("x", int(42)), ("y", AvroValue::Long(-1))], &writer).unwrap();

    let stale = Retyped {
        x: Some("stale".to_string()),
        y: Some(100),
    };
    let mut cursor = BinaryCursor::new(&bytes);
    let record = decoder
        .decode_into(Some(stale), &writer, &mut cursor)
        .unwrap();

    assert_eq!(record, Retyped { x: None, y: Some(-1) });
    assert!(cursor.is_empty());
}

#[test]
fn test_int_does_not_promote_to_long() {
    let decoder = SpecificDecoder::new(registry());
    let writer = writer("test.Retyped", vec![FieldSchema::new("y", AvroSchema::Int)]);
    let bytes = encode_record(&[("y", int(9))], &writer).unwrap();

    let mut cursor = BinaryCursor::new(&bytes);
    let record: Retyped = decoder.decode_into(None, &writer, &mut cursor).unwrap();

    assert_eq!(record, Retyped::default());
    assert!(cursor.is_empty());
}

#[test]
fn test_empty_writer_clears_everything() {
    let decoder = SpecificDecoder::new(registry());
    let writer = writer("test.Wide", vec![]);
    let mut cursor = BinaryCursor::new(&[]);
    let record = decoder
        .decode_into(
            Some(Wide {
                a: Some(1),
                c: Some(2),
            }),
            &writer,
            &mut cursor,
        )
        .unwrap();
    assert_eq!(record, Wide::default());
}

// ============================================================================
// Identity and complex values
// ============================================================================

#[test]
fn test_identity_schema_round_trip() {
    let decoder = SpecificDecoder::new(registry());
    let schema = Order::class_schema();
    let bytes = encode_record(
        &[
            ("id", AvroValue::Long(77)),
            (
                "lines",
                AvroValue::Array(vec![string("apple"), string("pear")]),
            ),
            ("note", AvroValue::Union(1, Box::new(string("gift")))),
            ("paid", AvroValue::Boolean(true)),
        ],
        schema,
    )
    .unwrap();

    let mut cursor = BinaryCursor::new(&bytes);
    let record = decoder
        .decode(None, schema, Some(schema.as_ref()), &mut cursor)
        .unwrap();
    for slot in 0..4 {
        assert!(record.get_slot(slot).is_some(), "slot {} empty", slot);
    }
    let order: Order = downcast(record);

    assert_eq!(order.id, Some(77));
    assert_eq!(
        order.lines,
        Some(AvroValue::Array(vec![string("apple"), string("pear")]))
    );
    assert_eq!(
        order.note,
        Some(AvroValue::Union(1, Box::new(string("gift"))))
    );
    assert_eq!(order.paid, Some(true));
    assert!(decoder.field_mapper().get_map(schema, schema).is_identity());
}

#[test]
fn test_reused_instance_gets_fresh_values() {
    let decoder = SpecificDecoder::new(registry());
    let schema = Order::class_schema();
    let first = encode_record(
        &[
            ("id", AvroValue::Long(1)),
            ("lines", AvroValue::Array(vec![string("a"), string("b")])),
            ("note", AvroValue::Union(1, Box::new(string("first")))),
            ("paid", AvroValue::Boolean(false)),
        ],
        schema,
    )
    .unwrap();
    let second = encode_record(
        &[
            ("id", AvroValue::Long(2)),
            ("lines", AvroValue::Array(vec![])),
            ("note", AvroValue::Union(0, Box::new(AvroValue::Null))),
            ("paid", AvroValue::Boolean(true)),
        ],
        schema,
    )
    .unwrap();

    let mut record: Option<Order> = None;
    for bytes in [&first, &second] {
        let mut cursor = BinaryCursor::new(bytes);
        record = Some(decoder.decode_into(record, schema, &mut cursor).unwrap());
    }

    assert_eq!(
        record,
        Some(Order {
            id: Some(2),
            lines: Some(AvroValue::Array(vec![])),
            note: Some(AvroValue::Union(0, Box::new(AvroValue::Null))),
            paid: Some(true),
        })
    );
}

#[test]
fn test_reuse_values_disabled_decodes_identically() {
    let decoder = SpecificDecoder::with_config(
        registry(),
        DecoderConfig::new().with_reuse_values(false),
    );
    let writer = writer(
        "test.Swapped",
        vec![
            FieldSchema::new("a", AvroSchema::Int),
            FieldSchema::new("b", AvroSchema::String),
        ],
    );
    let bytes = encode_record(&[("a", int(1)), ("b", string("new"))], &writer).unwrap();
    let mut cursor = BinaryCursor::new(&bytes);
    let record = decoder
        .decode_into(
            Some(Swapped {
                b: Some("old".to_string()),
                a: Some(0),
            }),
            &writer,
            &mut cursor,
        )
        .unwrap();
    assert_eq!(
        record,
        Swapped {
            b: Some("new".to_string()),
            a: Some(1),
        }
    );
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_unregistered_name_fails() {
    init_tracing();
    let decoder = SpecificDecoder::new(registry());
    let writer = writer("test.Unknown", vec![FieldSchema::new("a", AvroSchema::Int)]);
    let bytes = encode_record(&[("a", int(1))], &writer).unwrap();
    let mut cursor = BinaryCursor::new(&bytes);

    let err = decoder.decode(None, &writer, None, &mut cursor).unwrap_err();
    match err {
        SpecificError::Resolution(ResolutionError::UnknownType { name }) => {
            assert_eq!(name, "test.Unknown")
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(cursor.position(), 0);
}

#[test]
fn test_namespace_config_remaps_writer_names() {
    init_tracing();
    let decoder = SpecificDecoder::with_config(
        registry(),
        DecoderConfig::new().with_namespace("shop.v2"),
    );
    let writer = writer(
        "shop.v1.Order",
        vec![
            FieldSchema::new("id", AvroSchema::Long),
            FieldSchema::new("paid", AvroSchema::Boolean),
        ],
    );
    let bytes = encode_record(
        &[("id", AvroValue::Long(5)), ("paid", AvroValue::Boolean(true))],
        &writer,
    )
    .unwrap();

    let mut cursor = BinaryCursor::new(&bytes);
    let order: Order = decoder.decode_into(None, &writer, &mut cursor).unwrap();
    assert_eq!(
        order,
        Order {
            id: Some(5),
            lines: None,
            note: None,
            paid: Some(true),
        }
    );
}

#[test]
fn test_resolution_is_cached() {
    let decoder = SpecificDecoder::new(registry());
    let writer = writer("test.Narrow", vec![FieldSchema::new("a", AvroSchema::Int)]);
    let bytes = encode_record(&[("a", int(1))], &writer).unwrap();
    for _ in 0..3 {
        let mut cursor = BinaryCursor::new(&bytes);
        decoder.decode(None, &writer, None, &mut cursor).unwrap();
    }
    assert_eq!(decoder.resolver().cached_len(), 1);
    assert_eq!(decoder.field_mapper().len(), 1);
}

// ============================================================================
// Nested records
// ============================================================================

/// Writer for `test.Customer` whose address is the given record schema.
fn customer_writer(address: RecordSchema) -> RecordSchema {
    writer(
        "test.Customer",
        vec![
            FieldSchema::new("address", AvroSchema::from(address)),
            FieldSchema::new("name", AvroSchema::String),
        ],
    )
}

#[test]
fn test_nested_record_fields_resolved_by_name() {
    init_tracing();
    let decoder = SpecificDecoder::new(registry());
    let address = writer(
        "test.Address",
        vec![
            FieldSchema::new("zip", AvroSchema::Int),
            FieldSchema::new("floor", AvroSchema::Int),
            FieldSchema::new("street", AvroSchema::String),
        ],
    );
    let writer = customer_writer(address);
    let bytes = encode_record(
        &[
            (
                "address",
                AvroValue::Record(vec![
                    ("zip".to_string(), int(1234)),
                    ("floor".to_string(), int(3)),
                    ("street".to_string(), string("Main")),
                ]),
            ),
            ("name", string("Ada")),
        ],
        &writer,
    )
    .unwrap();

    let mut cursor = BinaryCursor::new(&bytes);
    let customer: Customer = decoder.decode_into(None, &writer, &mut cursor).unwrap();

    assert_eq!(
        customer,
        Customer {
            name: Some("Ada".to_string()),
            address: Some(Address {
                street: Some("Main".to_string()),
                zip: Some(1234),
            }),
        }
    );
    assert!(cursor.is_empty());
    // One map for the outer pair, one for the nested pair
    assert_eq!(decoder.field_mapper().len(), 2);
}

#[test]
fn test_nested_record_reused_and_cleared() {
    let address = writer("test.Address", vec![FieldSchema::new("zip", AvroSchema::Int)]);
    let writer = customer_writer(address);
    let bytes = encode_record(
        &[
            ("address", AvroValue::Record(vec![("zip".to_string(), int(5))])),
            ("name", string("Bo")),
        ],
        &writer,
    )
    .unwrap();
    let stale = Customer {
        name: Some("old".to_string()),
        address: Some(Address {
            street: Some("stale street".to_string()),
            zip: Some(1),
        }),
    };
    let expected = Customer {
        name: Some("Bo".to_string()),
        address: Some(Address {
            street: None,
            zip: Some(5),
        }),
    };

    for config in [
        DecoderConfig::new(),
        DecoderConfig::new().with_reuse_values(false),
    ] {
        let decoder = SpecificDecoder::with_config(registry(), config);
        let mut cursor = BinaryCursor::new(&bytes);
        let customer: Customer = decoder
            .decode_into(Some(stale.clone()), &writer, &mut cursor)
            .unwrap();
        assert_eq!(customer, expected);
    }
}

#[test]
fn test_nested_record_missing_from_writer_is_cleared() {
    let decoder = SpecificDecoder::new(registry());
    let writer = writer("test.Customer", vec![FieldSchema::new("name", AvroSchema::String)]);
    let bytes = encode_record(&[("name", string("Cy"))], &writer).unwrap();
    let stale = Customer {
        name: None,
        address: Some(Address::default()),
    };

    let mut cursor = BinaryCursor::new(&bytes);
    let customer: Customer = decoder
        .decode_into(Some(stale), &writer, &mut cursor)
        .unwrap();
    assert_eq!(customer.name.as_deref(), Some("Cy"));
    assert_eq!(customer.address, None);
}

#[test]
fn test_nested_record_unregistered_name_fails() {
    let decoder = SpecificDecoder::new(registry());
    let address = writer("test.Location", vec![FieldSchema::new("zip", AvroSchema::Int)]);
    let writer = customer_writer(address);
    let bytes = encode_record(
        &[
            ("address", AvroValue::Record(vec![("zip".to_string(), int(9))])),
            ("name", string("Di")),
        ],
        &writer,
    )
    .unwrap();

    let mut cursor = BinaryCursor::new(&bytes);
    let err = decoder.decode(None, &writer, None, &mut cursor).unwrap_err();
    assert!(matches!(
        err,
        SpecificError::Resolution(ResolutionError::UnknownType { ref name }) if name == "test.Location"
    ));
}

#[test]
fn test_nested_record_of_other_type_fails() {
    let decoder = SpecificDecoder::new(registry());
    // Resolves to `Narrow`, which cannot fill an `Address` slot
    let address = writer("test.Narrow", vec![FieldSchema::new("a", AvroSchema::Int)]);
    let writer = customer_writer(address);
    let bytes = encode_record(
        &[
            ("address", AvroValue::Record(vec![("a".to_string(), int(1))])),
            ("name", string("Ed")),
        ],
        &writer,
    )
    .unwrap();

    let mut cursor = BinaryCursor::new(&bytes);
    let err = decoder.decode(None, &writer, None, &mut cursor).unwrap_err();
    assert!(matches!(
        err,
        SpecificError::Decode(DecodeError::TypeMismatch(_))
    ));
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn test_oversized_array_block_rejected() {
    let decoder = SpecificDecoder::new(registry());
    let writer = writer(
        "test.Holder",
        vec![FieldSchema::new("xs", AvroSchema::Array(Box::new(AvroSchema::Int)))],
    );
    let mut bytes = Vec::new();
    write_zigzag(1 << 60, &mut bytes);

    let mut cursor = BinaryCursor::new(&bytes);
    let err = decoder.decode(None, &writer, None, &mut cursor).unwrap_err();
    assert!(matches!(
        err,
        SpecificError::Decode(DecodeError::InvalidData(_))
    ));
}

#[test]
fn test_oversized_skipped_block_rejected() {
    let decoder = SpecificDecoder::new(registry());
    for item in [AvroSchema::Int, AvroSchema::Null] {
        let writer = writer(
            "test.Narrow",
            vec![
                FieldSchema::new("junk", AvroSchema::Array(Box::new(item))),
                FieldSchema::new("a", AvroSchema::Int),
            ],
        );
        let mut bytes = Vec::new();
        write_zigzag(1 << 60, &mut bytes);
        write_zigzag(0, &mut bytes);
        write_zigzag(1, &mut bytes);

        let mut cursor = BinaryCursor::new(&bytes);
        let err = decoder.decode(None, &writer, None, &mut cursor).unwrap_err();
        assert!(matches!(
            err,
            SpecificError::Decode(DecodeError::InvalidData(_))
        ));
    }
}

#[test]
fn test_non_record_writer_rejected() {
    let decoder = SpecificDecoder::new(registry());
    let mut cursor = BinaryCursor::new(&[0x02]);
    let err = decoder
        .decode_datum(None, &AvroSchema::Int, &mut cursor)
        .unwrap_err();
    match err {
        SpecificError::Schema(SchemaError::NotARecord(kind)) => assert_eq!(kind, "int"),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(cursor.position(), 0);

    let narrow = writer("test.Narrow", vec![FieldSchema::new("a", AvroSchema::Int)]);
    let narrow = AvroSchema::from(narrow);
    let record = decoder.decode_datum(None, &narrow, &mut cursor).unwrap();
    assert_eq!(downcast::<Narrow>(record).a, Some(1));
}

// ============================================================================
// Unsupported operations
// ============================================================================

#[test]
fn test_structural_mutation_is_unsupported() {
    let decoder = SpecificDecoder::new(registry());
    let mut record = Narrow::default();

    let errors = [
        decoder
            .add_field(&mut record, "b", AvroValue::Null)
            .unwrap_err(),
        decoder.get_field(&record, "a").unwrap_err(),
        decoder.remove_field(&mut record, "a").unwrap_err(),
        decoder.new_record(Narrow::class_schema()).unwrap_err(),
    ];
    let operations: Vec<_> = errors.iter().map(|e| e.operation).collect();
    assert_eq!(
        operations,
        vec!["add_field", "get_field", "remove_field", "new_record"]
    );

    let err: SpecificError = errors[0].clone().into();
    assert!(matches!(err, SpecificError::Unsupported(_)));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_shared_decoder_across_threads() {
    init_tracing();
    let decoder = SpecificDecoder::new(registry());
    let writer = writer(
        "test.Swapped",
        vec![
            FieldSchema::new("a", AvroSchema::Int),
            FieldSchema::new("b", AvroSchema::String),
        ],
    );

    std::thread::scope(|s| {
        for t in 0..8 {
            let decoder = &decoder;
            let writer = &writer;
            s.spawn(move || {
                let mut record: Option<Swapped> = None;
                for i in 0..200 {
                    let value = t * 1000 + i;
                    let bytes = encode_record(
                        &[("a", int(value)), ("b", string(&value.to_string()))],
                        writer,
                    )
                    .unwrap();
                    let mut cursor = BinaryCursor::new(&bytes);
                    let decoded: Swapped =
                        decoder.decode_into(record, writer, &mut cursor).unwrap();
                    assert_eq!(decoded.a, Some(value));
                    assert_eq!(decoded.b, Some(value.to_string()));
                    record = Some(decoded);
                }
            });
        }
    });

    assert_eq!(decoder.field_mapper().len(), 1);
    assert_eq!(decoder.resolver().cached_len(), 1);
}
