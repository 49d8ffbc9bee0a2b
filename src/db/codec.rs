//! Conversions between PostgreSQL wire values and [`Value`].
//!
//! Rows from the simple query protocol arrive in text format, so anything
//! without a dedicated decoder is shown exactly as the server rendered it.
//! Prepared queries return binary values; those are decoded by type and a
//! binary payload of an unknown type is never read as text.

use crate::db::{Row, Value};
use crate::error::{PgdashError, Result};
use sqlx::decode::Decode;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::types::{Oid, PgInterval, PgTimeTz};
use sqlx::postgres::{
    PgArgumentBuffer, PgArguments, PgRow, PgTypeInfo, PgTypeKind, PgValueFormat, PgValueRef,
};
use sqlx::query::Query;
use sqlx::types::{BigDecimal, Uuid};
use sqlx::{Postgres, Row as _, Type, TypeInfo, ValueRef};
use std::borrow::Cow;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Type names whose binary wire format is plain UTF-8 text.
const TEXT_TYPES: &[&str] = &[
    "TEXT", "VARCHAR", "CHAR", "NAME", "UNKNOWN", "\"CHAR\"", "CITEXT", "XML",
];

// Family tags used by the inet/cidr binary format.
const PGSQL_AF_INET: u8 = 2;
const PGSQL_AF_INET6: u8 = 3;

/// Converts every column of a row.
pub(crate) fn convert_row(row: &PgRow) -> Row {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts a single column value.
pub(crate) fn convert_value(row: &PgRow, index: usize) -> Value {
    let raw = match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => raw,
        _ => return Value::Null,
    };
    let type_info = raw.type_info().into_owned();

    match raw.format() {
        // The server's text rendering is already the faithful representation.
        PgValueFormat::Text => decode_scalar(&raw, type_info.name())
            .unwrap_or_else(|| text_or_placeholder(&raw, &type_info)),
        PgValueFormat::Binary => {
            let base = base_type(&type_info);
            decode_scalar(&raw, base.name())
                .or_else(|| decode_binary_only(&raw, base.name()))
                .unwrap_or_else(|| {
                    if is_textual(&base) {
                        text_or_placeholder(&raw, &type_info)
                    } else {
                        placeholder(&type_info)
                    }
                })
        }
    }
}

fn decode<'r, T: Decode<'r, Postgres>>(raw: &PgValueRef<'r>) -> Option<T> {
    T::decode(raw.clone()).ok()
}

/// Decoders that read both wire formats.
fn decode_scalar(raw: &PgValueRef<'_>, type_name: &str) -> Option<Value> {
    match type_name {
        "BOOL" => decode::<bool>(raw).map(Value::Bool),
        "INT2" => decode::<i16>(raw).map(|v| Value::Int(v.into())),
        "INT4" => decode::<i32>(raw).map(|v| Value::Int(v.into())),
        "INT8" => decode::<i64>(raw).map(Value::Int),
        "OID" => decode::<Oid>(raw).map(|v| Value::Int(v.0.into())),
        "FLOAT4" => decode::<f32>(raw).map(|v| Value::Float(v.into())),
        "FLOAT8" => decode::<f64>(raw).map(Value::Float),
        "NUMERIC" => decode::<BigDecimal>(raw).map(|v| Value::Decimal(v.to_string())),
        "BYTEA" => decode::<Vec<u8>>(raw).map(Value::Bytes),
        "DATE" => decode::<NaiveDate>(raw).map(Value::Date),
        "TIME" => decode::<NaiveTime>(raw).map(Value::Time),
        "TIMESTAMP" => decode::<NaiveDateTime>(raw).map(Value::Timestamp),
        "TIMESTAMPTZ" => decode::<DateTime<Utc>>(raw).map(Value::TimestampTz),
        "JSON" | "JSONB" => decode::<serde_json::Value>(raw).map(Value::Json),
        "UUID" => decode::<Uuid>(raw).map(|v| Value::String(v.to_string())),
        _ => None,
    }
}

/// Decoders for binary values whose text rendering the server would
/// otherwise have produced.
fn decode_binary_only(raw: &PgValueRef<'_>, type_name: &str) -> Option<Value> {
    let text = match type_name {
        "INTERVAL" => decode::<PgInterval>(raw).map(|v| format_interval(&v)),
        "TIMETZ" => decode::<PgTimeTz<NaiveTime, FixedOffset>>(raw)
            .map(|v| format!("{}{}", v.time, format_utc_offset(v.offset.local_minus_utc()))),
        "INET" | "CIDR" => raw
            .as_bytes()
            .ok()
            .and_then(|bytes| decode_inet(bytes, type_name == "CIDR")),
        "BOOL[]" => decode_array::<bool>(raw, |b| String::from(if b { "t" } else { "f" })),
        "INT2[]" => decode_array::<i16>(raw, |v| v.to_string()),
        "INT4[]" => decode_array::<i32>(raw, |v| v.to_string()),
        "INT8[]" => decode_array::<i64>(raw, |v| v.to_string()),
        "OID[]" => decode_array::<Oid>(raw, |v| v.0.to_string()),
        "FLOAT4[]" => decode_array::<f32>(raw, |v| v.to_string()),
        "FLOAT8[]" => decode_array::<f64>(raw, |v| v.to_string()),
        "NUMERIC[]" => decode_array::<BigDecimal>(raw, |v| v.to_string()),
        "TEXT[]" | "VARCHAR[]" | "CHAR[]" | "NAME[]" => decode_array::<String>(raw, |v| v),
        "DATE[]" => decode_array::<NaiveDate>(raw, |v| v.to_string()),
        "TIME[]" => decode_array::<NaiveTime>(raw, |v| v.to_string()),
        "TIMESTAMP[]" => decode_array::<NaiveDateTime>(raw, |v| v.to_string()),
        "TIMESTAMPTZ[]" => decode_array::<DateTime<Utc>>(raw, |v| {
            v.format("%Y-%m-%d %H:%M:%S%.f+00").to_string()
        }),
        "UUID[]" => decode_array::<Uuid>(raw, |v| v.to_string()),
        "JSONB[]" | "JSON[]" => decode_array::<serde_json::Value>(raw, |v| v.to_string()),
        _ => None,
    };
    text.map(Value::String)
}

fn decode_array<T>(raw: &PgValueRef<'_>, render: impl Fn(T) -> String) -> Option<String>
where
    T: for<'a> Decode<'a, Postgres> + Type<Postgres>,
{
    let items = decode::<Vec<Option<T>>>(raw)?;
    Some(format_array(items.into_iter().map(|item| item.map(&render))))
}

fn text_or_placeholder(raw: &PgValueRef<'_>, type_info: &PgTypeInfo) -> Value {
    match raw.as_str() {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => placeholder(type_info),
    }
}

fn placeholder(type_info: &PgTypeInfo) -> Value {
    Value::String(format!("<{}>", type_info.name().to_lowercase()))
}

/// Follows domains down to the type that defines their wire format.
fn base_type(type_info: &PgTypeInfo) -> Cow<'_, PgTypeInfo> {
    let mut current = Cow::Borrowed(type_info);
    // Unresolved declarations have no kind to inspect.
    while current.name() != "?" {
        let next = match current.kind() {
            PgTypeKind::Domain(base) => base.clone(),
            _ => break,
        };
        current = Cow::Owned(next);
    }
    current
}

/// Returns true when the type's binary format is its text rendering.
fn is_textual(type_info: &PgTypeInfo) -> bool {
    let name = type_info.name();
    if TEXT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(name)) {
        return true;
    }
    if name == "?" {
        return false;
    }
    match type_info.kind() {
        PgTypeKind::Enum(_) => true,
        PgTypeKind::Domain(base) => is_textual(base),
        _ => false,
    }
}

/// Renders an interval the way PostgreSQL's default `IntervalStyle` does.
pub(crate) fn format_interval(interval: &PgInterval) -> String {
    fn unit(n: i64, name: &str) -> String {
        if n == 1 {
            format!("{n} {name}")
        } else {
            format!("{n} {name}s")
        }
    }

    let years = i64::from(interval.months / 12);
    let months = i64::from(interval.months % 12);
    let days = i64::from(interval.days);

    let mut parts = Vec::new();
    for (n, name) in [(years, "year"), (months, "mon"), (days, "day")] {
        if n != 0 {
            parts.push(unit(n, name));
        }
    }

    let micros = interval.microseconds;
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 {
            "-"
        } else if years < 0 || months < 0 || days < 0 {
            "+"
        } else {
            ""
        };
        let total = micros.unsigned_abs();
        let (hours, minutes) = (total / 3_600_000_000, total / 60_000_000 % 60);
        let (seconds, fraction) = (total / 1_000_000 % 60, total % 1_000_000);
        let mut time = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
        if fraction != 0 {
            let digits = format!("{fraction:06}");
            time.push('.');
            time.push_str(digits.trim_end_matches('0'));
        }
        parts.push(time);
    }

    parts.join(" ")
}

/// Formats a UTC offset as `+02`, `+05:30` or `-03:30:15`.
pub(crate) fn format_utc_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let total = seconds.unsigned_abs();
    let (hours, minutes, secs) = (total / 3600, total / 60 % 60, total % 60);
    match (minutes, secs) {
        (0, 0) => format!("{sign}{hours:02}"),
        (_, 0) => format!("{sign}{hours:02}:{minutes:02}"),
        _ => format!("{sign}{hours:02}:{minutes:02}:{secs:02}"),
    }
}

/// Decodes the binary inet/cidr format: family, prefix bits, cidr flag,
/// address length, then the address bytes.
pub(crate) fn decode_inet(bytes: &[u8], is_cidr: bool) -> Option<String> {
    let [family, bits, _, len, address @ ..] = bytes else {
        return None;
    };
    let address: IpAddr = match (*family, *len, address.len()) {
        (PGSQL_AF_INET, 4, 4) => Ipv4Addr::from(<[u8; 4]>::try_from(address).ok()?).into(),
        (PGSQL_AF_INET6, 16, 16) => Ipv6Addr::from(<[u8; 16]>::try_from(address).ok()?).into(),
        _ => return None,
    };
    let full = if address.is_ipv4() { 32 } else { 128 };

    if !is_cidr && *bits == full {
        Some(address.to_string())
    } else {
        Some(format!("{address}/{bits}"))
    }
}

/// Encodes `text` (an address with an optional `/prefix`) in the binary
/// inet/cidr format.
pub(crate) fn encode_inet(text: &str, is_cidr: bool) -> Option<Vec<u8>> {
    let (address, prefix) = match text.trim().split_once('/') {
        Some((address, prefix)) => (address, Some(prefix.parse::<u8>().ok()?)),
        None => (text.trim(), None),
    };
    let (family, full, octets) = match IpAddr::from_str(address).ok()? {
        IpAddr::V4(v4) => (PGSQL_AF_INET, 32, v4.octets().to_vec()),
        IpAddr::V6(v6) => (PGSQL_AF_INET6, 128, v6.octets().to_vec()),
    };
    let bits = prefix.unwrap_or(full);
    if bits > full {
        return None;
    }

    let mut bytes = vec![family, bits, u8::from(is_cidr), octets.len() as u8];
    bytes.extend(octets);
    Some(bytes)
}

/// Renders a one-dimensional array in PostgreSQL's `{a,b,NULL}` syntax.
pub(crate) fn format_array(items: impl Iterator<Item = Option<String>>) -> String {
    let body = items
        .map(|item| match item {
            None => "NULL".to_string(),
            Some(s) if array_item_needs_quotes(&s) => {
                format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            Some(s) => s,
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{body}}}")
}

fn array_item_needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.eq_ignore_ascii_case("NULL")
        || s.chars()
            .any(|c| matches!(c, '{' | '}' | ',' | '"' | '\\') || c.is_whitespace())
}

/// A parameter already encoded in the wire format of its declared type.
struct DeclaredParam {
    type_info: PgTypeInfo,
    payload: Option<Vec<u8>>,
}

impl Type<Postgres> for DeclaredParam {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }
}

impl Encode<'_, Postgres> for DeclaredParam {
    fn encode_by_ref(
        &self,
        buf: &mut PgArgumentBuffer,
    ) -> std::result::Result<IsNull, BoxDynError> {
        match &self.payload {
            Some(bytes) => {
                buf.extend_from_slice(bytes);
                Ok(IsNull::No)
            }
            None => Ok(IsNull::Yes),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(self.type_info.clone())
    }
}

/// Binds `value` as the type the server declared for parameter `position`.
///
/// Text and numbers coerce to the declared type the way an untyped literal
/// would, so `--param 2024-01-01` compares against a `date` column.
pub(crate) fn bind_declared<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
    declared: &PgTypeInfo,
    position: usize,
) -> Result<Query<'q, Postgres, PgArguments>> {
    if value.is_null() {
        return Ok(query.bind(DeclaredParam {
            type_info: declared.clone(),
            payload: None,
        }));
    }

    let base = base_type(declared);
    let type_name = base.name();
    let text = || param_text(value);
    let invalid = || {
        PgdashError::query(format!(
            "Parameter ${position} is not a valid {}: {}",
            declared.name().to_lowercase(),
            value
        ))
    };

    let query = match type_name {
        "BOOL" => match value {
            Value::Bool(b) => query.bind(*b),
            _ => query.bind(parse_bool(&text()).ok_or_else(invalid)?),
        },
        "INT2" => query.bind(text().trim().parse::<i16>().map_err(|_| invalid())?),
        "INT4" => query.bind(text().trim().parse::<i32>().map_err(|_| invalid())?),
        "INT8" => query.bind(text().trim().parse::<i64>().map_err(|_| invalid())?),
        "OID" => query.bind(Oid(text().trim().parse::<u32>().map_err(|_| invalid())?)),
        "FLOAT4" => query.bind(text().trim().parse::<f32>().map_err(|_| invalid())?),
        "FLOAT8" => query.bind(text().trim().parse::<f64>().map_err(|_| invalid())?),
        "NUMERIC" => query.bind(BigDecimal::from_str(text().trim()).map_err(|_| invalid())?),
        "DATE" => match value {
            Value::Date(d) => query.bind(*d),
            _ => query.bind(parse_date(&text()).ok_or_else(invalid)?),
        },
        "TIME" => match value {
            Value::Time(t) => query.bind(*t),
            _ => query.bind(parse_time(&text()).ok_or_else(invalid)?),
        },
        "TIMESTAMP" => match value {
            Value::Timestamp(ts) => query.bind(*ts),
            _ => query.bind(parse_timestamp(&text()).ok_or_else(invalid)?),
        },
        "TIMESTAMPTZ" => match value {
            Value::TimestampTz(ts) => query.bind(*ts),
            Value::Timestamp(ts) => query.bind(ts.and_utc()),
            _ => query.bind(parse_timestamptz(&text()).ok_or_else(invalid)?),
        },
        "UUID" => query.bind(Uuid::parse_str(text().trim()).map_err(|_| invalid())?),
        "JSONB" => match value {
            Value::Json(j) => query.bind(j.clone()),
            _ => query.bind(
                serde_json::from_str::<serde_json::Value>(&text()).map_err(|_| invalid())?,
            ),
        },
        "BYTEA" => match value {
            Value::Bytes(b) => query.bind(b.clone()),
            _ => query.bind(text().into_bytes()),
        },
        "INET" | "CIDR" => query.bind(DeclaredParam {
            type_info: declared.clone(),
            payload: Some(encode_inet(&text(), type_name == "CIDR").ok_or_else(invalid)?),
        }),
        // json's binary format is its text.
        "JSON" => query.bind(DeclaredParam {
            type_info: declared.clone(),
            payload: Some(text().into_bytes()),
        }),
        _ if is_textual(&base) => {
            let payload = match value {
                Value::Bytes(b) => String::from_utf8(b.clone()).map_err(|_| invalid())?,
                _ => text(),
            };
            query.bind(DeclaredParam {
                type_info: declared.clone(),
                payload: Some(payload.into_bytes()),
            })
        }
        _ => {
            return Err(PgdashError::query(format!(
                "Parameter ${position} has type {}, which cannot be bound from {value:?}; \
                 cast it from text instead, e.g. ${position}::text::{}",
                declared.name().to_lowercase(),
                declared.name().to_lowercase()
            )))
        }
    };

    Ok(query)
}

/// The text a parameter would have as an untyped literal.
fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        other => other.to_display_string(),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Some(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::from_str(text.trim()).ok()
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| parse_date(text).map(|d| d.and_time(NaiveTime::MIN)))
}

fn parse_timestamptz(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f %#z"]
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
        })
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|| parse_timestamp(text).map(|ts| ts.and_utc()))
}
