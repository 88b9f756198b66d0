//! Wire codec primitives
//!
//! The remote service speaks a compact JSON encoding: optional values are
//! 0/1-element sequences, tagged unions are single-key objects, money amounts
//! are arbitrary-precision integers in smallest units (10^-8 of the display
//! unit), and timestamps are signed nanosecond counts. This module is the
//! single translation boundary between that encoding and native types; no
//! other module inspects raw wire shapes.
//!
//! All operations are pure. Decoding failures are [`ClientError::Protocol`]
//! and abort the whole decode; the codec never guesses.

use crate::error::{ClientError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Smallest units per display unit.
pub const TOKEN_SCALE: u128 = 100_000_000;
const SCALE_DIGITS: u32 = 8;

// ============================================================================
// Optionals: 0/1-element sequences
// ============================================================================

/// Decode a wire optional. A sequence of more than one element is a protocol
/// violation, never "take the first".
pub fn decode_opt(v: &Value) -> Result<Option<&Value>> {
    let seq = v
        .as_array()
        .ok_or_else(|| ClientError::Protocol(format!("expected optional sequence, got {v}")))?;
    match seq.len() {
        0 => Ok(None),
        1 => Ok(Some(&seq[0])),
        n => Err(ClientError::Protocol(format!(
            "optional sequence has {n} elements"
        ))),
    }
}

/// Encode a native optional as a 0/1-element sequence.
pub fn encode_opt(v: Option<Value>) -> Value {
    match v {
        None => Value::Array(vec![]),
        Some(inner) => Value::Array(vec![inner]),
    }
}

// ============================================================================
// Tagged unions: single-key objects
// ============================================================================

/// Decode a wire tagged union: an object with exactly one own key, the key
/// being the variant tag (case-sensitive, verbatim).
pub fn decode_variant(v: &Value) -> Result<(&str, &Value)> {
    let obj = v
        .as_object()
        .ok_or_else(|| ClientError::Protocol(format!("expected variant object, got {v}")))?;
    let mut entries = obj.iter();
    match (entries.next(), entries.next()) {
        (Some((tag, payload)), None) => Ok((tag.as_str(), payload)),
        (None, _) => Err(ClientError::Protocol(
            "variant object has no key".to_string(),
        )),
        _ => Err(ClientError::Protocol(format!(
            "variant object has {} keys",
            obj.len()
        ))),
    }
}

/// Encode a tagged union as a single-key object.
pub fn encode_variant(tag: &str, payload: Value) -> Value {
    let mut obj = Map::with_capacity(1);
    obj.insert(tag.to_string(), payload);
    Value::Object(obj)
}

// ============================================================================
// Big integers: JSON number or decimal string
// ============================================================================

/// Decode a non-negative wire integer. Large values arrive as decimal
/// strings so they never transit through a float.
pub fn wire_nat(v: &Value) -> Result<u128> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| ClientError::Protocol(format!("expected unsigned integer, got {n}"))),
        Value::String(s) => s
            .parse::<u128>()
            .map_err(|_| ClientError::Protocol(format!("malformed unsigned integer {s:?}"))),
        other => Err(ClientError::Protocol(format!(
            "expected unsigned integer, got {other}"
        ))),
    }
}

/// Decode a signed wire integer (nanosecond timestamps).
pub fn wire_int(v: &Value) -> Result<i128> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .ok_or_else(|| ClientError::Protocol(format!("expected integer, got {n}"))),
        Value::String(s) => s
            .parse::<i128>()
            .map_err(|_| ClientError::Protocol(format!("malformed integer {s:?}"))),
        other => Err(ClientError::Protocol(format!(
            "expected integer, got {other}"
        ))),
    }
}

// ============================================================================
// Money
// ============================================================================

/// A money amount in smallest ledger units (1 display unit = 10^8 raw).
///
/// Never a float internally; conversion to a human decimal happens only in
/// [`Tokens::display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tokens(pub u128);

impl Tokens {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Tokens(wire_nat(v)?))
    }

    /// Encodes as a decimal string, which survives any magnitude.
    pub fn to_wire(self) -> Value {
        Value::String(self.0.to_string())
    }

    /// Render `raw / 10^8` with `frac_digits` fractional digits, rounding
    /// half-up. Monotonic in the raw amount.
    pub fn display(self, frac_digits: u32) -> String {
        if frac_digits >= SCALE_DIGITS {
            let int = self.0 / TOKEN_SCALE;
            let frac = self.0 % TOKEN_SCALE;
            let mut out = format!("{int}.{frac:08}");
            out.extend(std::iter::repeat('0').take((frac_digits - SCALE_DIGITS) as usize));
            out
        } else if frac_digits == 0 {
            let rounded = self.0.saturating_add(TOKEN_SCALE / 2) / TOKEN_SCALE;
            rounded.to_string()
        } else {
            let drop = 10u128.pow(SCALE_DIGITS - frac_digits);
            let rounded = self.0.saturating_add(drop / 2) / drop;
            let unit = 10u128.pow(frac_digits);
            format!(
                "{}.{:0width$}",
                rounded / unit,
                rounded % unit,
                width = frac_digits as usize
            )
        }
    }

    pub fn saturating_sub(self, other: Tokens) -> Tokens {
        Tokens(self.0.saturating_sub(other.0))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display(2))
    }
}

// ============================================================================
// Instants
// ============================================================================

/// Convert a nanosecond-since-epoch count to a native instant.
///
/// Integer floor division by 10^6 to milliseconds; no float intermediate.
pub fn instant_from_nanos(nanos: i128) -> Result<DateTime<Utc>> {
    let millis = nanos.div_euclid(1_000_000);
    let millis = i64::try_from(millis)
        .map_err(|_| ClientError::Protocol(format!("timestamp out of range: {nanos} ns")))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ClientError::Protocol(format!("timestamp out of range: {millis} ms")))
}

/// Encode a native instant as a nanosecond count.
pub fn nanos_from_instant(t: DateTime<Utc>) -> i128 {
    i128::from(t.timestamp_millis()) * 1_000_000
}

pub fn instant_from_wire(v: &Value) -> Result<DateTime<Utc>> {
    instant_from_nanos(wire_int(v)?)
}

// ============================================================================
// Identity handles
// ============================================================================

/// Opaque identity reference, compared only by its canonical textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn from_wire(v: &Value) -> Result<Self> {
        v.as_str()
            .map(|s| ActorId(s.to_string()))
            .ok_or_else(|| ClientError::Protocol(format!("expected identity handle, got {v}")))
    }

    pub fn to_wire(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Record field helpers
// ============================================================================

/// Fetch a required field from a wire record.
pub fn field<'a>(v: &'a Value, key: &str) -> Result<&'a Value> {
    v.as_object()
        .and_then(|obj| obj.get(key))
        .ok_or_else(|| ClientError::Protocol(format!("missing field {key:?}")))
}

pub fn str_field(v: &Value, key: &str) -> Result<String> {
    field(v, key)?
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| ClientError::Protocol(format!("field {key:?} is not a string")))
}

pub fn bool_field(v: &Value, key: &str) -> Result<bool> {
    field(v, key)?
        .as_bool()
        .ok_or_else(|| ClientError::Protocol(format!("field {key:?} is not a boolean")))
}

pub fn u64_field(v: &Value, key: &str) -> Result<u64> {
    let raw = wire_nat(field(v, key)?)?;
    u64::try_from(raw).map_err(|_| ClientError::Protocol(format!("field {key:?} out of range")))
}

pub fn u32_field(v: &Value, key: &str) -> Result<u32> {
    let raw = wire_nat(field(v, key)?)?;
    u32::try_from(raw).map_err(|_| ClientError::Protocol(format!("field {key:?} out of range")))
}

pub fn tokens_field(v: &Value, key: &str) -> Result<Tokens> {
    Tokens::from_wire(field(v, key)?)
}

pub fn instant_field(v: &Value, key: &str) -> Result<DateTime<Utc>> {
    instant_from_wire(field(v, key)?)
}

pub fn actor_field(v: &Value, key: &str) -> Result<ActorId> {
    ActorId::from_wire(field(v, key)?)
}

pub fn opt_str_field(v: &Value, key: &str) -> Result<Option<String>> {
    decode_opt(field(v, key)?)?
        .map(|inner| {
            inner
                .as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| ClientError::Protocol(format!("field {key:?} is not a string")))
        })
        .transpose()
}

pub fn opt_actor_field(v: &Value, key: &str) -> Result<Option<ActorId>> {
    decode_opt(field(v, key)?)?.map(ActorId::from_wire).transpose()
}

pub fn opt_instant_field(v: &Value, key: &str) -> Result<Option<DateTime<Utc>>> {
    decode_opt(field(v, key)?)?.map(instant_from_wire).transpose()
}

/// Decode a wire list with a per-item decoder. One malformed item fails the
/// whole list; a misleadingly short "successful" list is worse than an error.
pub fn decode_list<T>(v: &Value, item: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    let seq = v
        .as_array()
        .ok_or_else(|| ClientError::Protocol(format!("expected list, got {v}")))?;
    seq.iter().map(item).collect()
}
