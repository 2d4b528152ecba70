//! SQL data types attached to columns, literals and expressions.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Static type of a column or expression.
///
/// `Varchar` carries an optional declared maximum length. `None` is the system
/// default text type, which accepts values of any length. Decoding runs the same
/// length check as [`DataType::varchar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "DataTypeRepr")]
pub enum DataType {
    /// Type of an untyped `NULL`.
    Null,
    Boolean,
    /// 64-bit signed integer.
    BigInt,
    /// 64-bit floating point.
    Double,
    /// Days since the Unix epoch.
    Date,
    Varchar {
        #[serde(rename = "maxLen", skip_serializing_if = "Option::is_none")]
        max_len: Option<u32>,
    },
}

impl DataType {
    /// Largest declarable `varchar(n)` length.
    pub const MAX_VARCHAR_LENGTH: u32 = 65533;

    /// The unbounded text type.
    pub const VARCHAR: DataType = DataType::Varchar { max_len: None };

    /// `varchar(len)`; fails for a zero length or one above [`Self::MAX_VARCHAR_LENGTH`].
    pub fn varchar(len: u32) -> Result<DataType, ValidationError> {
        if len == 0 || len > Self::MAX_VARCHAR_LENGTH {
            return Err(ValidationError::InvalidVarcharLength(len));
        }
        Ok(DataType::Varchar { max_len: Some(len) })
    }
}

/// Unchecked decoded form of [`DataType`].
#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum DataTypeRepr {
    Null,
    Boolean,
    BigInt,
    Double,
    Date,
    Varchar {
        #[serde(rename = "maxLen", default)]
        max_len: Option<u32>,
    },
}

impl TryFrom<DataTypeRepr> for DataType {
    type Error = ValidationError;

    fn try_from(repr: DataTypeRepr) -> Result<Self, Self::Error> {
        Ok(match repr {
            DataTypeRepr::Null => DataType::Null,
            DataTypeRepr::Boolean => DataType::Boolean,
            DataTypeRepr::BigInt => DataType::BigInt,
            DataTypeRepr::Double => DataType::Double,
            DataTypeRepr::Date => DataType::Date,
            DataTypeRepr::Varchar { max_len: Some(len) } => DataType::varchar(len)?,
            DataTypeRepr::Varchar { max_len: None } => DataType::VARCHAR,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "null"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::BigInt => write!(f, "bigint"),
            DataType::Double => write!(f, "double"),
            DataType::Date => write!(f, "date"),
            DataType::Varchar { max_len: Some(n) } => write!(f, "varchar({})", n),
            DataType::Varchar { max_len: None } => write!(f, "varchar(*)"),
        }
    }
}
