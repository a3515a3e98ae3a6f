use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use super::controller::{FormController, FormError, FormOptions, FormResult};
use super::value::{FieldKey, FieldValue, FormValues};

/// A record type whose named fields map one-to-one onto form fields.
///
/// Usually derived with `#[derive(FormRecord)]`.
pub trait FormRecord: Sized {
    type Fields;

    fn fields() -> Self::Fields;
    fn field_keys() -> Vec<FieldKey>;
    fn to_values(&self) -> FormValues;
    fn from_values(values: &FormValues) -> FormResult<Self>;
}

pub trait ToFieldValue {
    fn to_field_value(&self) -> FieldValue;
}

pub trait FromFieldValue: Sized {
    const EXPECTED: &'static str;

    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

impl ToFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        if self.is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Text(self.clone())
        }
    }
}

impl FromFieldValue for String {
    const EXPECTED: &'static str = "text";

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Empty => Some(String::new()),
            FieldValue::Text(text) => Some(text.clone()),
            _ => None,
        }
    }
}

impl ToFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }
}

impl FromFieldValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Empty => Some(false),
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

macro_rules! impl_scalar_field_value {
    ($type:ty, $variant:ident, $expected:literal) => {
        impl ToFieldValue for $type {
            fn to_field_value(&self) -> FieldValue {
                FieldValue::$variant(*self)
            }
        }

        impl FromFieldValue for $type {
            const EXPECTED: &'static str = $expected;

            fn from_field_value(value: &FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$variant(value) => Some(*value),
                    _ => None,
                }
            }
        }
    };
}

impl_scalar_field_value!(Decimal, Number, "number");
impl_scalar_field_value!(NaiveDate, Date, "date");
impl_scalar_field_value!(NaiveDateTime, DateTime, "date and time");

impl<T: ToFieldValue> ToFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        self.as_ref()
            .map_or(FieldValue::Empty, ToFieldValue::to_field_value)
    }
}

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Empty => Some(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

/// Reads one record field out of submitted values. Missing keys read as
/// [`FieldValue::Empty`].
pub fn read_field<T: FromFieldValue>(values: &FormValues, key: &str) -> FormResult<T> {
    let value = values.get(key).unwrap_or(&FieldValue::Empty);
    T::from_field_value(value).ok_or_else(|| FormError::FieldType {
        field: FieldKey::new(key),
        expected: T::EXPECTED,
    })
}

impl FormValues {
    pub fn to_record<R: FormRecord>(&self) -> FormResult<R> {
        R::from_values(self)
    }
}

impl FormController {
    /// Creates a form whose fields and initial values come from `record`.
    pub fn from_record<R: FormRecord>(record: &R, options: FormOptions) -> Self {
        Self::with_values(record.to_values(), options)
    }
}
