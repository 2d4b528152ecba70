//! # Typed Literals
//!
//! A [`Literal`] pairs an immutable [`ScalarValue`] with its declared [`DataType`].
//! The declared type may be narrower than the value's natural type (a text value
//! declared as `varchar(3)`), so construction validates the value against the
//! declared domain and fails with [`ValidationError`] instead of letting an
//! out-of-domain literal reach any rule.
//!
//! Literals decode from JSON through the same validation path (`serde(try_from)`),
//! so a malformed literal in a wire plan is rejected during decoding.

use crate::error::ValidationError;
use crate::types::DataType;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar constant carried by a literal.
///
/// `Float64` is wrapped in `OrderedFloat` so that expressions, and therefore plans,
/// can derive `Eq` and `Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Utf8(String),
    /// Days since 1970-01-01.
    Date(i32),
}

impl ScalarValue {
    /// The type a value has when no narrower type is declared.
    pub fn natural_type(&self) -> DataType {
        match self {
            ScalarValue::Null => DataType::Null,
            ScalarValue::Bool(_) => DataType::Boolean,
            ScalarValue::Int64(_) => DataType::BigInt,
            ScalarValue::Float64(_) => DataType::Double,
            ScalarValue::Utf8(_) => DataType::VARCHAR,
            ScalarValue::Date(_) => DataType::Date,
        }
    }

    /// Check that this value is a member of `data_type`.
    ///
    /// `NULL` belongs to every type. Integers are accepted by `double` columns.
    /// Text length is counted in Unicode scalar values.
    pub fn check_domain(&self, data_type: &DataType) -> Result<(), ValidationError> {
        match (self, data_type) {
            (ScalarValue::Null, _) => Ok(()),
            (ScalarValue::Bool(_), DataType::Boolean) => Ok(()),
            (ScalarValue::Int64(_), DataType::BigInt | DataType::Double) => Ok(()),
            (ScalarValue::Float64(_), DataType::Double) => Ok(()),
            (ScalarValue::Date(_), DataType::Date) => Ok(()),
            (ScalarValue::Utf8(s), DataType::Varchar { max_len }) => {
                let actual = s.chars().count();
                match max_len {
                    Some(n) if actual > *n as usize => Err(ValidationError::LengthExceeded {
                        data_type: *data_type,
                        actual,
                    }),
                    _ => Ok(()),
                }
            }
            (value, data_type) => Err(ValidationError::TypeMismatch {
                data_type: *data_type,
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Bool(v) => write!(f, "{}", v),
            ScalarValue::Int64(v) => write!(f, "{}", v),
            ScalarValue::Float64(v) => write!(f, "{}", v),
            ScalarValue::Utf8(v) => write!(f, "'{}'", v),
            ScalarValue::Date(v) => write!(f, "DATE({})", v),
        }
    }
}

/// A typed, immutable, domain-checked constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "LiteralRepr", into = "LiteralRepr")]
pub struct Literal {
    value: ScalarValue,
    data_type: DataType,
}

impl Literal {
    /// Build a literal of the declared type, validating the value's domain.
    pub fn new(value: ScalarValue, data_type: DataType) -> Result<Self, ValidationError> {
        value.check_domain(&data_type)?;
        Ok(Self { value, data_type })
    }

    /// Text literal declared as `varchar(max_len)`.
    pub fn varchar(value: impl Into<String>, max_len: u32) -> Result<Self, ValidationError> {
        let data_type = DataType::varchar(max_len)?;
        Self::new(ScalarValue::Utf8(value.into()), data_type)
    }

    /// Text literal of the unbounded default text type.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: ScalarValue::Utf8(value.into()),
            data_type: DataType::VARCHAR,
        }
    }

    pub fn int64(value: i64) -> Self {
        Self {
            value: ScalarValue::Int64(value),
            data_type: DataType::BigInt,
        }
    }

    pub fn float64(value: f64) -> Self {
        Self {
            value: ScalarValue::Float64(OrderedFloat(value)),
            data_type: DataType::Double,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            value: ScalarValue::Bool(value),
            data_type: DataType::Boolean,
        }
    }

    pub fn date(days_since_epoch: i32) -> Self {
        Self {
            value: ScalarValue::Date(days_since_epoch),
            data_type: DataType::Date,
        }
    }

    /// A typed `NULL`.
    pub fn null(data_type: DataType) -> Self {
        Self {
            value: ScalarValue::Null,
            data_type,
        }
    }

    pub fn value(&self) -> &ScalarValue {
        &self.value
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Wire shape of a literal: `{"value": {...}, "type": ...}`.
#[derive(Serialize, Deserialize)]
struct LiteralRepr {
    value: ScalarValue,
    #[serde(rename = "type")]
    data_type: Option<DataType>,
}

impl TryFrom<LiteralRepr> for Literal {
    type Error = ValidationError;

    fn try_from(repr: LiteralRepr) -> Result<Self, Self::Error> {
        let data_type = repr.data_type.unwrap_or_else(|| repr.value.natural_type());
        Literal::new(repr.value, data_type)
    }
}

impl From<Literal> for LiteralRepr {
    fn from(lit: Literal) -> Self {
        LiteralRepr {
            value: lit.value,
            data_type: Some(lit.data_type),
        }
    }
}
