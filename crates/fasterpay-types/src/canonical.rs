//! Canonical string forms of flat parameter sets.
//!
//! Both signing schemes operate on a [`ParameterSet`] rendered into a single,
//! reproducible string. Entries are always ordered lexicographically by key, so
//! the order in which a caller inserted parameters never affects the result.
//!
//! | Scheme | Canonical form | Example |
//! |--------|----------------|---------|
//! | [`SigningScheme::Legacy`] | `application/x-www-form-urlencoded` | `amount=10.00&description=Golden+Sword` |
//! | [`SigningScheme::Keyed`] | `key=value;` concatenation, no escaping | `amount=10.00;description=Golden Sword;` |
//!
//! The keyed form performs no escaping at all: a value that itself contains `;`
//! or `=` is emitted verbatim. The gateway computes the same literal string on its
//! side, so this must not be "fixed" here.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::fmt::Write;

use crate::signature::SigningScheme;

/// A scalar parameter value.
///
/// Values are coerced to their string representation (see the [`Display`](fmt::Display)
/// impl) before canonicalization. The same representation is used when the value is
/// rendered into a checkout form, so the gateway recomputes the digest over exactly
/// the strings it receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    /// Shortest round-trip form that keeps a fractional part: `1.0`, `0.1`, `1e+16`.
    Float(f64),
    /// Rendered as `True` / `False`.
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(s) => f.write_str(s),
            ParamValue::Integer(i) => write!(f, "{i}"),
            ParamValue::Float(x) => fmt_float(*x, f),
            ParamValue::Bool(true) => f.write_str("True"),
            ParamValue::Bool(false) => f.write_str("False"),
        }
    }
}

/// Writes `x` the way the gateway's reference encoder stringifies floats.
///
/// `Debug` already yields the shortest round-trip digits, keeps `.0` on whole numbers
/// and switches to exponent form below `1e-4` and from `1e16`; only the exponent
/// needs an explicit sign and at least two digits.
fn fmt_float(x: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("nan");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "inf" } else { "-inf" });
    }
    let repr = format!("{x:?}");
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            write!(f, "{mantissa}e{sign}{digits:0>2}")
        }
        None => f.write_str(&repr),
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Integer(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Monetary amounts keep their exact decimal text, e.g. `10.50` stays `"10.50"`.
impl From<Decimal> for ParamValue {
    fn from(value: Decimal) -> Self {
        ParamValue::String(value.to_string())
    }
}

/// A flat, key-unique set of scalar parameters.
///
/// Backed by an ordered map: iteration is always in canonical (lexicographic by key)
/// order, and inserting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, ParamValue>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, returning the previous value for the key if any.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<ParamValue>
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style [`ParameterSet::insert`].
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in canonical order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ParameterSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Renders `params` in the canonical form of `scheme`.
pub fn canonicalize(params: &ParameterSet, scheme: SigningScheme) -> String {
    match scheme {
        SigningScheme::Legacy => canonicalize_legacy(params),
        SigningScheme::Keyed => canonicalize_keyed(params),
    }
}

/// Bytes left as-is in the legacy form: alphanumerics, `_ . - ~`, and space (which
/// becomes `+` afterwards). `*` and every other byte are percent-encoded.
const LEGACY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b' ');

fn encode_legacy_component(component: &str) -> String {
    // A literal `+` is in the set, so only former spaces remain to be swapped.
    utf8_percent_encode(component, LEGACY_COMPONENT)
        .to_string()
        .replace(' ', "+")
}

/// URL-query canonical form: `k1=v1&k2=v2`, percent-encoded, space as `+`.
pub fn canonicalize_legacy(params: &ParameterSet) -> String {
    params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                encode_legacy_component(k),
                encode_legacy_component(&v.to_string())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Keyed canonical form: `k1=v1;k2=v2;`, every entry terminated by `;`, nothing escaped.
pub fn canonicalize_keyed(params: &ParameterSet) -> String {
    params.iter().fold(String::new(), |mut out, (k, v)| {
        // Writing into a String cannot fail.
        let _ = write!(out, "{k}={v};");
        out
    })
}
