//! Scalar values that travel through the binding list.
//!
//! [`Value`] is the closed set of things that may be bound to a placeholder:
//! NULL, booleans, 64-bit integers, 64-bit floats and text. Composite values
//! (arrays, objects) are rejected at the bind boundary when converting from
//! `serde_json::Value`.
//!
//! On the wire a `Value` follows the column type the server expects. Integers
//! and floats also encode as NUMERIC. Text is parsed into NUMERIC, timestamp,
//! date, time, UUID and JSON parameters. Reading goes the other way: NUMERIC
//! decodes to a float, temporal and UUID columns decode to their canonical
//! text, and JSON scalars decode to the matching variant.

use crate::error::DbError;
use bytes::BytesMut;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A scalar query parameter or result cell.
///
/// ```
/// use pgquery::Value;
///
/// let params: Vec<Value> = vec![1.into(), "alice".into(), true.into(), None::<i64>.into()];
/// assert_eq!(params[3], Value::Null);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text value
    Text(String),
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Loose integer coercion used for scalar results such as `COUNT(*)`.
    ///
    /// NULL and unparsable text coerce to `0`; floats truncate toward zero.
    pub fn coerce_i64(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Int(v) => *v,
            Value::Float(v) => *v as i64,
            Value::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .or_else(|_| s.parse::<f64>().map(|f| f as i64))
                    .unwrap_or(0)
            }
        }
    }

    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = DbError;

    /// Convert a JSON scalar. Arrays and objects are rejected.
    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        match v {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if n.is_u64() {
                    Err(DbError::InvalidValue(format!("integer {n} does not fit in i64")))
                } else {
                    n.as_f64()
                        .map(Value::Float)
                        .ok_or_else(|| DbError::InvalidValue(format!("unrepresentable number {n}")))
                }
            }
            serde_json::Value::Array(_) => Err(DbError::InvalidValue(
                "arrays cannot be bound as a scalar parameter".to_string(),
            )),
            serde_json::Value::Object(_) => Err(DbError::InvalidValue(
                "objects cannot be bound as a scalar parameter".to_string(),
            )),
        }
    }
}

// ─── ToSql / FromSql ────────────────────────────────────────────────────────

type BoxError = Box<dyn Error + Sync + Send>;

fn encode_error(value: &Value, ty: &Type, cause: impl fmt::Display) -> BoxError {
    Box::new(DbError::InvalidValue(format!(
        "cannot encode {} as {ty}: {cause}",
        value.type_name()
    )))
}

/// `YYYY-MM-DD HH:MM:SS[.fff]`, with either a space or `T` between date and time.
fn parse_naive_datetime(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
}

/// RFC 3339 text; a timestamp without an offset is taken as UTC.
fn parse_timestamptz(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match s.parse::<DateTime<FixedOffset>>() {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(e) => parse_naive_datetime(s).map(|dt| dt.and_utc()).map_err(|_| e),
    }
}

impl Value {
    fn text_to_sql(&self, s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let fail = |cause: &dyn fmt::Display| encode_error(self, ty, cause);
        match *ty {
            Type::NUMERIC => s.trim().parse::<Decimal>().map_err(|e| fail(&e))?.to_sql_checked(ty, out),
            Type::TIMESTAMPTZ => parse_timestamptz(s).map_err(|e| fail(&e))?.to_sql_checked(ty, out),
            Type::TIMESTAMP => parse_naive_datetime(s).map_err(|e| fail(&e))?.to_sql_checked(ty, out),
            Type::DATE => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| fail(&e))?
                .to_sql_checked(ty, out),
            Type::TIME => NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .map_err(|e| fail(&e))?
                .to_sql_checked(ty, out),
            Type::UUID => Uuid::parse_str(s.trim()).map_err(|e| fail(&e))?.to_sql_checked(ty, out),
            Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(s)
                .map_err(|e| fail(&e))?
                .to_sql_checked(ty, out),
            _ => s.to_sql_checked(ty, out),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => match *ty {
                Type::JSON | Type::JSONB => serde_json::Value::from(*v).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            // Integers follow the parameter type the server inferred; narrowing is checked.
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql_checked(ty, out),
                Type::JSON | Type::JSONB => serde_json::Value::from(*v).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)
                    .map_err(|e| encode_error(self, ty, e))?
                    .to_sql_checked(ty, out),
                Type::JSON | Type::JSONB => serde_json::Value::from(*v).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => self.text_to_sql(v, ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::UNKNOWN || <Value as FromSql>::accepts(ty)
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        match *ty {
            Type::BOOL => Ok(Value::Bool(bool::from_sql(ty, raw)?)),
            Type::INT2 => Ok(Value::Int(i64::from(i16::from_sql(ty, raw)?))),
            Type::INT4 => Ok(Value::Int(i64::from(i32::from_sql(ty, raw)?))),
            Type::INT8 => Ok(Value::Int(i64::from_sql(ty, raw)?)),
            Type::FLOAT4 => Ok(Value::Float(f64::from(f32::from_sql(ty, raw)?))),
            Type::FLOAT8 => Ok(Value::Float(f64::from_sql(ty, raw)?)),
            Type::NUMERIC => {
                let d = Decimal::from_sql(ty, raw)?;
                Ok(d.to_f64().map_or_else(|| Value::Text(d.to_string()), Value::Float))
            }
            Type::TIMESTAMPTZ => Ok(Value::Text(DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339())),
            Type::TIMESTAMP => Ok(Value::Text(NaiveDateTime::from_sql(ty, raw)?.to_string())),
            Type::DATE => Ok(Value::Text(NaiveDate::from_sql(ty, raw)?.to_string())),
            Type::TIME => Ok(Value::Text(NaiveTime::from_sql(ty, raw)?.to_string())),
            Type::UUID => Ok(Value::Text(Uuid::from_sql(ty, raw)?.to_string())),
            // Scalars map onto the matching variant; documents come back as JSON text.
            Type::JSON | Type::JSONB => match serde_json::Value::from_sql(ty, raw)? {
                doc @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                    Ok(Value::Text(doc.to_string()))
                }
                scalar => Ok(Value::try_from(scalar)?),
            },
            _ => Ok(Value::Text(String::from_sql(ty, raw)?)),
        }
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::TIME
                | Type::UUID
                | Type::JSON
                | Type::JSONB
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(5i32), Value::Int(5));
        assert_eq!(Value::from(7u32), Value::Int(7));
        assert_eq!(Value::from(1.5f64), Value::Float(1.5));
        assert_eq!(Value::from("a"), Value::Text("a".into()));
        assert_eq!(Value::from(false), Value::Bool(false));
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Int(3));
    }

    #[test]
    fn coerce_i64_rules() {
        assert_eq!(Value::Null.coerce_i64(), 0);
        assert_eq!(Value::Int(42).coerce_i64(), 42);
        assert_eq!(Value::Float(3.9).coerce_i64(), 3);
        assert_eq!(Value::Bool(true).coerce_i64(), 1);
        assert_eq!(Value::Text(" 17 ".into()).coerce_i64(), 17);
        assert_eq!(Value::Text("2.5".into()).coerce_i64(), 2);
        assert_eq!(Value::Text("many".into()).coerce_i64(), 0);
    }

    #[test]
    fn json_scalars_convert() {
        assert_eq!(Value::try_from(serde_json::json!(null)).unwrap(), Value::Null);
        assert_eq!(Value::try_from(serde_json::json!(12)).unwrap(), Value::Int(12));
        assert_eq!(Value::try_from(serde_json::json!(0.25)).unwrap(), Value::Float(0.25));
        assert_eq!(
            Value::try_from(serde_json::json!("x")).unwrap(),
            Value::Text("x".into())
        );
    }

    #[test]
    fn json_composites_are_rejected() {
        assert!(matches!(
            Value::try_from(serde_json::json!([1, 2])),
            Err(DbError::InvalidValue(_))
        ));
        assert!(matches!(
            Value::try_from(serde_json::json!({"a": 1})),
            Err(DbError::InvalidValue(_))
        ));
        assert!(matches!(
            Value::try_from(serde_json::json!(u64::MAX)),
            Err(DbError::InvalidValue(_))
        ));
    }

    #[test]
    fn serde_untagged_shape() {
        let values = vec![Value::Null, Value::Bool(true), Value::Int(1), Value::Text("t".into())];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,true,1,"t"]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn int_narrows_to_param_type() {
        let mut buf = BytesMut::new();
        Value::Int(7).to_sql_checked(&Type::INT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &7i32.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(Value::Int(i64::from(i32::MAX) + 1)
            .to_sql_checked(&Type::INT4, &mut buf)
            .is_err());
    }

    #[test]
    fn mismatched_type_is_an_encode_error() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(1).to_sql_checked(&Type::TEXT, &mut buf).is_err());
        assert!(Value::Text("x".into()).to_sql_checked(&Type::INT8, &mut buf).is_err());
    }

    #[test]
    fn null_encodes_for_any_accepted_type() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql_checked(&Type::INT8, &mut buf).unwrap(),
            IsNull::Yes
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn decodes_scalars() {
        assert_eq!(
            Value::from_sql(&Type::INT8, &42i64.to_be_bytes()).unwrap(),
            Value::Int(42)
        );
        assert_eq!(Value::from_sql(&Type::TEXT, b"hello").unwrap(), Value::Text("hello".into()));
        assert_eq!(Value::from_sql_null(&Type::INT4).unwrap(), Value::Null);
    }

    fn encode<T: ToSql>(value: &T, ty: &Type) -> Result<BytesMut, BoxError> {
        let mut buf = BytesMut::new();
        value.to_sql_checked(ty, &mut buf)?;
        Ok(buf)
    }

    #[test]
    fn numbers_encode_as_numeric() {
        let numeric = |value: Value| {
            let raw = encode(&value, &Type::NUMERIC).unwrap();
            Decimal::from_sql(&Type::NUMERIC, &raw).unwrap()
        };
        assert_eq!(numeric(Value::Int(100)), Decimal::from(100));
        assert_eq!(numeric(Value::Float(2.5)), Decimal::new(25, 1));
        assert_eq!(numeric(Value::Text(" 19.99".into())), Decimal::new(1999, 2));
        assert!(encode(&Value::Float(f64::NAN), &Type::NUMERIC).is_err());
        assert!(encode(&Value::Text("lots".into()), &Type::NUMERIC).is_err());
    }

    #[test]
    fn text_parses_into_temporal_params() {
        let noon = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();

        let utc = encode(&noon.and_utc(), &Type::TIMESTAMPTZ).unwrap();
        assert_eq!(encode(&Value::from("2024-05-01T12:30:00Z"), &Type::TIMESTAMPTZ).unwrap(), utc);
        assert_eq!(
            encode(&Value::from("2024-05-01 14:30:00+02:00"), &Type::TIMESTAMPTZ).unwrap(),
            utc
        );
        assert_eq!(encode(&Value::from("2024-05-01 12:30:00"), &Type::TIMESTAMPTZ).unwrap(), utc);

        assert_eq!(
            encode(&Value::from("2024-05-01T12:30:00"), &Type::TIMESTAMP).unwrap(),
            encode(&noon, &Type::TIMESTAMP).unwrap()
        );
        assert_eq!(
            encode(&Value::from("2024-05-01"), &Type::DATE).unwrap(),
            encode(&noon.date(), &Type::DATE).unwrap()
        );
        assert_eq!(
            encode(&Value::from("12:30:00"), &Type::TIME).unwrap(),
            encode(&noon.time(), &Type::TIME).unwrap()
        );
    }

    #[test]
    fn unparsable_text_names_the_value_and_column_type() {
        let err = encode(&Value::from("yesterday"), &Type::TIMESTAMPTZ).unwrap_err();
        assert!(
            err.to_string().starts_with("Invalid value: cannot encode text as timestamptz"),
            "got {err}"
        );
        let err = encode(&Value::Float(f64::INFINITY), &Type::NUMERIC).unwrap_err();
        assert!(err.to_string().contains("cannot encode float as numeric"), "got {err}");
    }

    #[test]
    fn text_parses_into_uuid() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(
            encode(&Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8"), &Type::UUID).unwrap(),
            encode(&id, &Type::UUID).unwrap()
        );
        assert!(encode(&Value::from("not-a-uuid"), &Type::UUID).is_err());
        assert!(encode(&Value::Int(7), &Type::UUID).is_err());
    }

    #[test]
    fn scalars_and_documents_encode_as_json() {
        assert_eq!(
            encode(&Value::from(r#"{"a":1}"#), &Type::JSONB).unwrap(),
            encode(&serde_json::json!({"a": 1}), &Type::JSONB).unwrap()
        );
        assert_eq!(
            encode(&Value::Int(3), &Type::JSON).unwrap(),
            encode(&serde_json::json!(3), &Type::JSON).unwrap()
        );
        assert_eq!(
            encode(&Value::Bool(true), &Type::JSONB).unwrap(),
            encode(&serde_json::json!(true), &Type::JSONB).unwrap()
        );
        assert!(encode(&Value::from("{oops"), &Type::JSONB).is_err());
    }

    #[test]
    fn decodes_numeric_temporal_uuid_and_json() {
        let raw = encode(&Decimal::new(25, 1), &Type::NUMERIC).unwrap();
        assert_eq!(Value::from_sql(&Type::NUMERIC, &raw).unwrap(), Value::Float(2.5));

        let noon = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let raw = encode(&noon.and_utc(), &Type::TIMESTAMPTZ).unwrap();
        assert_eq!(
            Value::from_sql(&Type::TIMESTAMPTZ, &raw).unwrap(),
            Value::from("2024-05-01T12:30:00+00:00")
        );
        let raw = encode(&noon, &Type::TIMESTAMP).unwrap();
        assert_eq!(
            Value::from_sql(&Type::TIMESTAMP, &raw).unwrap(),
            Value::from("2024-05-01 12:30:00")
        );
        let raw = encode(&noon.date(), &Type::DATE).unwrap();
        assert_eq!(Value::from_sql(&Type::DATE, &raw).unwrap(), Value::from("2024-05-01"));

        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let raw = encode(&id, &Type::UUID).unwrap();
        assert_eq!(
            Value::from_sql(&Type::UUID, &raw).unwrap(),
            Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );

        let raw = encode(&serde_json::json!({"a": [1, 2]}), &Type::JSONB).unwrap();
        assert_eq!(Value::from_sql(&Type::JSONB, &raw).unwrap(), Value::from(r#"{"a":[1,2]}"#));
        let raw = encode(&serde_json::json!(3), &Type::JSON).unwrap();
        assert_eq!(Value::from_sql(&Type::JSON, &raw).unwrap(), Value::Int(3));
    }

    #[test]
    fn accepts_common_column_types() {
        for ty in [
            Type::NUMERIC,
            Type::TIMESTAMP,
            Type::TIMESTAMPTZ,
            Type::DATE,
            Type::TIME,
            Type::UUID,
            Type::JSON,
            Type::JSONB,
        ] {
            assert!(<Value as FromSql>::accepts(&ty), "decode {ty}");
            assert!(<Value as ToSql>::accepts(&ty), "encode {ty}");
        }
        assert!(<Value as ToSql>::accepts(&Type::UNKNOWN));
        assert!(!<Value as FromSql>::accepts(&Type::BYTEA));
    }
}
