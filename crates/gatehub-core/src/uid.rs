//! UID normalization.
//!
//! Card UIDs reach the system in several spellings: raw byte sequences from
//! the reader firmware (`[9, 37, 12, 5]`), delimited hex strings typed by
//! operators (`"09:25:0C:05"`, `"09 25 0c 05"`), or whatever a dashboard
//! client happens to send. All of them must resolve to the same canonical
//! uppercase hex string, because that string is the storage and lookup key:
//! two spellings with equal canonical form are the same card identity.
//!
//! # Storage vs. search
//!
//! There are two normalization functions, not one. [`normalize_for_search`]
//! strips a string down to its hex digits and uppercases the remainder, even
//! when nothing remains. [`normalize_for_storage`] does the same but, when the
//! string contains no hex content at all, falls back to rendering its decimal
//! number runs as two-digit hex, and finally to the uppercased original.
//!
//! The divergence is a compatibility quirk inherited from the system this one
//! replaces. Do not unify the two paths: doing so could change which existing
//! rows a given spelling matches. (The decimal-run fallback is unreachable
//! for string input, since every decimal digit is also a hex digit, but it
//! is kept so the storage rule reads the same as the rule it preserves.)

use serde_json::Value;

/// A card UID as received from the outside world, before normalization.
///
/// The reader firmware sends UIDs as JSON arrays of byte values; operators
/// and dashboards send strings. Anything else is coerced to its JSON text
/// form and treated as a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawUid {
    /// A sequence of byte values, e.g. `[9, 37, 12, 5]`.
    Bytes(Vec<u8>),
    /// Any textual spelling, delimiters and case preserved.
    Text(String),
}

impl RawUid {
    /// Build a `RawUid` from an arbitrary JSON value.
    ///
    /// Arrays whose elements all fit in a byte become [`RawUid::Bytes`];
    /// strings become [`RawUid::Text`]; every other shape is stringified.
    ///
    /// # Examples
    ///
    /// ```
    /// use gatehub_core::RawUid;
    /// use serde_json::json;
    ///
    /// assert_eq!(RawUid::from_json(&json!([9, 37, 12, 5])), RawUid::Bytes(vec![9, 37, 12, 5]));
    /// assert_eq!(RawUid::from_json(&json!("AA:BB")), RawUid::Text("AA:BB".into()));
    /// ```
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => {
                let mut bytes = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_u64() {
                        Some(n) if n <= u64::from(u8::MAX) => bytes.push(n as u8),
                        // Not a byte sequence after all; coerce the whole
                        // value to text like any other unexpected shape.
                        _ => return RawUid::Text(value.to_string()),
                    }
                }
                RawUid::Bytes(bytes)
            }
            Value::String(s) => RawUid::Text(s.clone()),
            other => RawUid::Text(other.to_string()),
        }
    }
}

impl From<&str> for RawUid {
    fn from(s: &str) -> Self {
        RawUid::Text(s.to_string())
    }
}

impl From<String> for RawUid {
    fn from(s: String) -> Self {
        RawUid::Text(s)
    }
}

impl From<Vec<u8>> for RawUid {
    fn from(bytes: Vec<u8>) -> Self {
        RawUid::Bytes(bytes)
    }
}

/// Normalize a UID for registry lookups.
///
/// Total function: byte sequences render as concatenated two-digit uppercase
/// hex; strings keep only their hex digits, uppercased. The result may be
/// empty for strings with no hex content.
///
/// # Examples
///
/// ```
/// use gatehub_core::{RawUid, normalize_for_search};
///
/// assert_eq!(normalize_for_search(&RawUid::Bytes(vec![9, 37, 12, 5])), "09250C05");
/// assert_eq!(normalize_for_search(&"aa:bb:cc:dd".into()), "AABBCCDD");
/// assert_eq!(normalize_for_search(&"zz--zz".into()), "");
/// ```
#[must_use]
pub fn normalize_for_search(uid: &RawUid) -> String {
    match uid {
        RawUid::Bytes(bytes) => hex_concat(bytes),
        RawUid::Text(text) => strip_to_hex(text),
    }
}

/// Normalize a UID for insertion into the registry.
///
/// Same as [`normalize_for_search`] for byte sequences and for strings with
/// any hex content. A string with no hex content falls back to its decimal
/// number runs rendered as two-digit hex, then to the uppercased original.
/// See the module docs for why the two functions stay separate.
///
/// # Examples
///
/// ```
/// use gatehub_core::{RawUid, normalize_for_storage};
///
/// assert_eq!(normalize_for_storage(&"09 25 0c 05".into()), "09250C05");
/// assert_eq!(normalize_for_storage(&"zz--zz".into()), "ZZ--ZZ");
/// ```
#[must_use]
pub fn normalize_for_storage(uid: &RawUid) -> String {
    match uid {
        RawUid::Bytes(bytes) => hex_concat(bytes),
        RawUid::Text(text) => {
            let cleaned = strip_to_hex(text);
            if !cleaned.is_empty() {
                return cleaned;
            }

            let runs: Vec<u64> = decimal_runs(text);
            if !runs.is_empty() {
                return runs.iter().map(|n| format!("{n:02X}")).collect();
            }

            text.to_uppercase()
        }
    }
}

/// Render a UID value the way its sender spelled it.
///
/// Strings come back verbatim; any other JSON shape is shown in its JSON
/// text form. Used when echoing a UID back in replies and events, where the
/// canonical form would surprise the client that sent it.
#[must_use]
pub fn display_spelling(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn hex_concat(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

fn strip_to_hex(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_hexdigit)
        .collect::<String>()
        .to_uppercase()
}

/// Extract runs of consecutive decimal digits as numbers.
///
/// Runs too large for `u64` are skipped rather than truncated.
fn decimal_runs(text: &str) -> Vec<u64> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn byte_sequence_renders_two_digit_hex() {
        let uid = RawUid::Bytes(vec![9, 37, 12, 5]);
        assert_eq!(normalize_for_search(&uid), "09250C05");
        assert_eq!(normalize_for_storage(&uid), "09250C05");
    }

    #[rstest]
    #[case("AABBCCDD", "AABBCCDD")]
    #[case("aa:bb:cc:dd", "AABBCCDD")]
    #[case("09 25 0C 05", "09250C05")]
    #[case("09-25-0c-05", "09250C05")]
    #[case("xx>AABB<xx", "AABB")]
    fn equivalent_spellings_share_canonical_form(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_for_search(&input.into()), expected);
        assert_eq!(normalize_for_storage(&input.into()), expected);
    }

    #[test]
    fn search_allows_empty_canonical_form() {
        assert_eq!(normalize_for_search(&"zz--zz".into()), "");
    }

    #[test]
    fn storage_falls_back_to_uppercased_original() {
        // No hex digits anywhere: search yields "", storage keeps the
        // original spelling (uppercased). This is the documented divergence.
        assert_eq!(normalize_for_storage(&"zz--zz".into()), "ZZ--ZZ");
    }

    #[test]
    fn decimal_list_string_strips_to_hex_digits() {
        // "9,37,12,5" contains hex digits, so the decimal-run fallback does
        // not apply; the digits themselves form the canonical string.
        assert_eq!(normalize_for_storage(&"9,37,12,5".into()), "937125");
        assert_eq!(normalize_for_search(&"9, 37, 12, 5".into()), "937125");
    }

    #[test]
    fn from_json_classifies_shapes() {
        assert_eq!(
            RawUid::from_json(&json!([0, 255, 16])),
            RawUid::Bytes(vec![0, 255, 16])
        );
        assert_eq!(
            RawUid::from_json(&json!("AABB")),
            RawUid::Text("AABB".into())
        );
        // Out-of-range element means the array is not a byte sequence.
        assert_eq!(
            RawUid::from_json(&json!([1, 300])),
            RawUid::Text("[1,300]".into())
        );
        assert_eq!(RawUid::from_json(&json!(1234)), RawUid::Text("1234".into()));
    }

    #[test]
    fn numeric_json_value_uppercases_text_form() {
        let uid = RawUid::from_json(&json!(1234));
        assert_eq!(normalize_for_search(&uid), "1234");
        assert_eq!(normalize_for_storage(&uid), "1234");
    }
}
