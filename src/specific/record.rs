//! Generated record types and slot access.
//!
//! A generated ("specific") record is a plain Rust struct whose layout is
//! fixed by its schema. The decoder reaches its fields only through integer
//! slots, one per declared field, via the [`SpecificRecord`] trait.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::DecodeError;
use crate::reader::AvroValue;
use crate::schema::RecordSchema;

/// Slot-addressed access to a generated record.
///
/// An empty slot is `None`; decoding stores `Some(value)` into matched slots
/// and clears the rest.
pub trait SpecificRecord: Any + Send + fmt::Debug {
    /// The schema this record type was generated from.
    fn schema(&self) -> &Arc<RecordSchema>;

    /// Current value of a slot, or `None` if it is empty or out of range.
    fn get_slot(&self, slot: usize) -> Option<AvroValue>;

    /// Move the current value out of a slot, leaving it empty.
    ///
    /// Used to hand the old value to the cursor as a reuse hint. The default
    /// falls back to [`SpecificRecord::get_slot`].
    fn take_slot(&mut self, slot: usize) -> Option<AvroValue> {
        self.get_slot(slot)
    }

    /// Store a value into a slot; `None` clears it.
    fn set_slot(&mut self, slot: usize, value: Option<AvroValue>) -> Result<(), DecodeError>;

    /// Whether a slot holds a nested generated record.
    fn is_record_slot(&self, _slot: usize) -> bool {
        false
    }

    /// Move a nested record out of a slot so the decoder can reuse it.
    fn take_record(&mut self, _slot: usize) -> Option<Box<dyn SpecificRecord>> {
        None
    }

    /// Store a nested record produced by the decoder.
    fn set_record(
        &mut self,
        slot: usize,
        record: Box<dyn SpecificRecord>,
    ) -> Result<(), DecodeError> {
        Err(DecodeError::TypeMismatch(format!(
            "slot {} cannot hold record {}",
            slot,
            record.schema().fullname()
        )))
    }

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A specific record type that can be registered and constructed empty.
pub trait Generated: SpecificRecord + Default + Sized {
    /// Schema shared by every instance of the type.
    fn class_schema() -> &'static Arc<RecordSchema>;
}

/// Conversion between a typed field and its decoded value.
///
/// Generated types implement this too, with `IS_RECORD` set. Their slots are
/// filled by the decoder recursing into the nested writer schema instead of
/// through `from_value`.
pub trait SlotValue: Sized {
    /// Whether this type is a generated record.
    const IS_RECORD: bool = false;

    fn from_value(value: AvroValue) -> Result<Self, DecodeError>;

    fn to_value(&self) -> AvroValue;

    fn into_value(self) -> AvroValue {
        self.to_value()
    }

    /// Unwrap a nested record decoded for this slot.
    fn from_record(record: Box<dyn SpecificRecord>) -> Result<Self, DecodeError> {
        Err(DecodeError::TypeMismatch(format!(
            "expected a non-record value, found record {}",
            record.schema().fullname()
        )))
    }

    /// Hand this value back as a nested record, if it is one.
    fn into_record(self) -> Option<Box<dyn SpecificRecord>> {
        None
    }
}

fn mismatch(expected: &str, value: &AvroValue) -> DecodeError {
    DecodeError::TypeMismatch(format!(
        "expected {} value, found {}",
        expected,
        value.type_name()
    ))
}

macro_rules! copy_slot_value {
    ($ty:ty, $variant:ident, $label:literal) => {
        impl SlotValue for $ty {
            fn from_value(value: AvroValue) -> Result<Self, DecodeError> {
                match value {
                    AvroValue::$variant(v) => Ok(v),
                    other => Err(mismatch($label, &other)),
                }
            }

            fn to_value(&self) -> AvroValue {
                AvroValue::$variant(*self)
            }
        }
    };
}

copy_slot_value!(bool, Boolean, "boolean");
copy_slot_value!(i32, Int, "int");
copy_slot_value!(i64, Long, "long");
copy_slot_value!(f32, Float, "float");
copy_slot_value!(f64, Double, "double");

impl SlotValue for String {
    fn from_value(value: AvroValue) -> Result<Self, DecodeError> {
        match value {
            AvroValue::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }

    fn to_value(&self) -> AvroValue {
        AvroValue::String(self.clone())
    }

    fn into_value(self) -> AvroValue {
        AvroValue::String(self)
    }
}

/// Accepts both `bytes` and `fixed` values.
impl SlotValue for Vec<u8> {
    fn from_value(value: AvroValue) -> Result<Self, DecodeError> {
        match value {
            AvroValue::Bytes(b) | AvroValue::Fixed(b) => Ok(b),
            other => Err(mismatch("bytes", &other)),
        }
    }

    fn to_value(&self) -> AvroValue {
        AvroValue::Bytes(self.clone())
    }

    fn into_value(self) -> AvroValue {
        AvroValue::Bytes(self)
    }
}

/// Untyped slot for complex fields (records, arrays, maps, unions, enums).
impl SlotValue for AvroValue {
    fn from_value(value: AvroValue) -> Result<Self, DecodeError> {
        Ok(value)
    }

    fn to_value(&self) -> AvroValue {
        self.clone()
    }

    fn into_value(self) -> AvroValue {
        self
    }
}

/// Declare a generated record type.
///
/// Emits a struct with one `Option<T>` field per schema field, a lazily built
/// static schema, and a [`SpecificRecord`] impl dispatching slots with a
/// `match`. Slots must be numbered `0..n` in declaration order.
///
/// The struct also implements [`SlotValue`], so it can be the field type of
/// another generated record. Its schema is then embedded with
/// `AvroSchema::from(Arc::clone(Inner::class_schema()))`.
///
/// ```
/// use specific_avro::schema::AvroSchema;
/// use specific_avro::specific_record;
///
/// specific_record! {
///     /// A user profile.
///     pub struct User("com.example.User") {
///         0 => id: i64 = AvroSchema::Long,
///         1 => name: String = AvroSchema::String,
///     }
/// }
///
/// let user = User { id: Some(7), name: None };
/// assert_eq!(user.id, Some(7));
/// ```
#[macro_export]
macro_rules! specific_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident ($fullname:literal) {
            $( $slot:literal => $field:ident : $ty:ty = $schema:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( pub $field: ::core::option::Option<$ty>, )*
        }

        impl $crate::specific::Generated for $name {
            fn class_schema() -> &'static ::std::sync::Arc<$crate::schema::RecordSchema> {
                static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<$crate::schema::RecordSchema>> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    let slots: &[usize] = &[$($slot),*];
                    assert!(
                        slots.iter().enumerate().all(|(i, &s)| i == s),
                        "slots of {} must be numbered 0..n in order",
                        $fullname
                    );
                    let fields = ::std::vec![
                        $( $crate::schema::FieldSchema::new(stringify!($field), $schema) ),*
                    ];
                    match $crate::schema::RecordSchema::from_fullname($fullname, fields) {
                        Ok(schema) => ::std::sync::Arc::new(schema),
                        Err(err) => panic!("invalid generated schema {}: {}", $fullname, err),
                    }
                })
            }
        }

        impl $crate::specific::SlotValue for $name {
            const IS_RECORD: bool = true;

            /// Accepts a record value by field name; unknown names are ignored.
            fn from_value(
                value: $crate::reader::AvroValue,
            ) -> ::core::result::Result<Self, $crate::error::DecodeError> {
                match value {
                    $crate::reader::AvroValue::Record(fields) => {
                        let schema = <Self as $crate::specific::Generated>::class_schema();
                        let mut record = <Self as ::core::default::Default>::default();
                        for (name, value) in fields {
                            if let Some(field) = schema.field(&name) {
                                $crate::specific::SpecificRecord::set_slot(
                                    &mut record,
                                    field.position,
                                    Some(value),
                                )?;
                            }
                        }
                        Ok(record)
                    }
                    other => Err($crate::error::DecodeError::TypeMismatch(format!(
                        "expected record {} value, found {}",
                        $fullname,
                        other.type_name()
                    ))),
                }
            }

            /// Populated fields only, in declaration order.
            fn to_value(&self) -> $crate::reader::AvroValue {
                let schema = <Self as $crate::specific::Generated>::class_schema();
                $crate::reader::AvroValue::Record(
                    schema
                        .fields()
                        .iter()
                        .filter_map(|field| {
                            $crate::specific::SpecificRecord::get_slot(self, field.position)
                                .map(|value| (field.name.clone(), value))
                        })
                        .collect(),
                )
            }

            fn from_record(
                record: ::std::boxed::Box<dyn $crate::specific::SpecificRecord>,
            ) -> ::core::result::Result<Self, $crate::error::DecodeError> {
                let actual = $crate::specific::SpecificRecord::schema(&*record)
                    .fullname()
                    .to_string();
                $crate::specific::SpecificRecord::into_any(record)
                    .downcast::<Self>()
                    .map(|record| *record)
                    .map_err(|_| {
                        $crate::error::DecodeError::TypeMismatch(format!(
                            "expected record {}, found {}",
                            $fullname, actual
                        ))
                    })
            }

            fn into_record(
                self,
            ) -> ::core::option::Option<::std::boxed::Box<dyn $crate::specific::SpecificRecord>> {
                Some(::std::boxed::Box::new(self))
            }
        }

        impl $crate::specific::SpecificRecord for $name {
            fn schema(&self) -> &::std::sync::Arc<$crate::schema::RecordSchema> {
                <Self as $crate::specific::Generated>::class_schema()
            }

            fn get_slot(&self, slot: usize) -> ::core::option::Option<$crate::reader::AvroValue> {
                match slot {
                    $( $slot => self.$field.as_ref().map($crate::specific::SlotValue::to_value), )*
                    _ => None,
                }
            }

            fn take_slot(&mut self, slot: usize) -> ::core::option::Option<$crate::reader::AvroValue> {
                match slot {
                    $( $slot => self.$field.take().map($crate::specific::SlotValue::into_value), )*
                    _ => None,
                }
            }

            fn set_slot(
                &mut self,
                slot: usize,
                value: ::core::option::Option<$crate::reader::AvroValue>,
            ) -> ::core::result::Result<(), $crate::error::DecodeError> {
                match slot {
                    $(
                        $slot => {
                            self.$field = value
                                .map(<$ty as $crate::specific::SlotValue>::from_value)
                                .transpose()?;
                            Ok(())
                        }
                    )*
                    _ => Err($crate::error::DecodeError::InvalidData(format!(
                        "slot {} out of range for {}",
                        slot, $fullname
                    ))),
                }
            }

            fn is_record_slot(&self, slot: usize) -> bool {
                match slot {
                    $( $slot => <$ty as $crate::specific::SlotValue>::IS_RECORD, )*
                    _ => false,
                }
            }

            fn take_record(
                &mut self,
                slot: usize,
            ) -> ::core::option::Option<::std::boxed::Box<dyn $crate::specific::SpecificRecord>> {
                match slot {
                    $(
                        $slot if <$ty as $crate::specific::SlotValue>::IS_RECORD => self
                            .$field
                            .take()
                            .and_then($crate::specific::SlotValue::into_record),
                    )*
                    _ => None,
                }
            }

            fn set_record(
                &mut self,
                slot: usize,
                record: ::std::boxed::Box<dyn $crate::specific::SpecificRecord>,
            ) -> ::core::result::Result<(), $crate::error::DecodeError> {
                match slot {
                    $(
                        $slot => {
                            self.$field = Some(
                                <$ty as $crate::specific::SlotValue>::from_record(record)?,
                            );
                            Ok(())
                        }
                    )*
                    _ => Err($crate::error::DecodeError::InvalidData(format!(
                        "slot {} out of range for {}",
                        slot, $fullname
                    ))),
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }
    };
}
