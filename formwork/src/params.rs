use alloc::borrow::{Cow, ToOwned};
use alloc::string::String;
use alloc::vec::Vec;

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

use crate::SourceError;

/// An ordered multimap of form parameters: each key maps to one or more
/// values, in the order they were added. Decoding reads the first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    entries: IndexMap<String, Vec<String>>,
}

impl ParamSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `application/x-www-form-urlencoded` text (a query string
    /// without its leading `?`, or a form body).
    ///
    /// Parameters are separated by `&`, empty segments are skipped, a `=`
    /// splits key from value (a segment without one has an empty value), `+`
    /// stands for a space. Percent escapes must be well formed and decode to
    /// UTF-8; a `;` anywhere in a segment is rejected.
    pub fn parse(input: &str) -> Result<Self, SourceError> {
        let mut params = ParamSet::new();
        for segment in input.split('&').filter(|s| !s.is_empty()) {
            if segment.contains(';') {
                return Err(SourceError::Semicolon {
                    segment: segment.to_owned(),
                });
            }
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            params.append(decode(key, segment)?, decode(value, segment)?);
        }
        Ok(params)
    }

    /// The first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value for `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if `key` has at least one value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Replaces every value of `key` with `value`, returning the old ones.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<Vec<String>> {
        self.entries.insert(key.into(), Vec::from([value.into()]))
    }

    /// Adds `value` after the existing values of `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys with all their values, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Every `(key, value)` pair, grouped by key.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ParamSet {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = ParamSet::new();
        params.extend(iter);
        params
    }
}

fn decode(component: &str, segment: &str) -> Result<String, SourceError> {
    let bytes = component.as_bytes();
    let mut rest = 0;
    while let Some(offset) = bytes[rest..].iter().position(|&b| b == b'%') {
        let at = rest + offset;
        let well_formed = matches!(
            (bytes.get(at + 1), bytes.get(at + 2)),
            (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
        );
        if !well_formed {
            return Err(SourceError::InvalidEscape {
                segment: segment.to_owned(),
            });
        }
        rest = at + 3;
    }

    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| SourceError::InvalidUtf8 {
            segment: segment.to_owned(),
        })
}

/// Something a [`ParamSet`] can be read from.
pub trait ParamSource {
    /// Reads the parameters.
    fn param_set(&self) -> Result<Cow<'_, ParamSet>, SourceError>;
}

impl ParamSource for ParamSet {
    fn param_set(&self) -> Result<Cow<'_, ParamSet>, SourceError> {
        Ok(Cow::Borrowed(self))
    }
}

impl ParamSource for str {
    fn param_set(&self) -> Result<Cow<'_, ParamSet>, SourceError> {
        ParamSet::parse(self).map(Cow::Owned)
    }
}

impl ParamSource for String {
    fn param_set(&self) -> Result<Cow<'_, ParamSet>, SourceError> {
        self.as_str().param_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic() {
        let params = ParamSet::parse("a=1&b=two+words&a=2&&flag").unwrap();
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get_all("a"), ["1", "2"]);
        assert_eq!(params.get("b"), Some("two words"));
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn parse_percent_escapes() {
        let params = ParamSet::parse("q=%E2%9C%93%2B1&k%20ey=v=w").unwrap();
        assert_eq!(params.get("q"), Some("\u{2713}+1"));
        assert_eq!(params.get("k ey"), Some("v=w"));
    }

    #[test]
    fn parse_rejects_bad_escapes() {
        for input in ["a=%", "a=%2", "a=%zz", "%g1=b"] {
            assert!(
                matches!(ParamSet::parse(input), Err(SourceError::InvalidEscape { .. })),
                "{input}"
            );
        }
    }

    #[test]
    fn parse_rejects_bad_utf8() {
        assert_eq!(
            ParamSet::parse("a=%ff"),
            Err(SourceError::InvalidUtf8 {
                segment: "a=%ff".into()
            })
        );
    }

    #[test]
    fn parse_rejects_semicolons() {
        assert_eq!(
            ParamSet::parse("a=1;b=2"),
            Err(SourceError::Semicolon {
                segment: "a=1;b=2".into()
            })
        );
    }

    #[test]
    fn insert_replaces_append_accumulates() {
        let mut params = ParamSet::new();
        params.append("a", "1");
        params.append("a", "2");
        assert_eq!(params.insert("a", "3"), Some(vec!["1".into(), "2".into()]));
        assert_eq!(params.get_all("a"), ["3"]);
        assert!(params.contains_key("a"));
    }

    #[test]
    fn collect_and_iterate() {
        let params: ParamSet = [("x", "1"), ("y", "2"), ("x", "3")].into_iter().collect();
        let pairs: Vec<_> = params.pairs().collect();
        assert_eq!(pairs, [("x", "1"), ("x", "3"), ("y", "2")]);
        let keys: Vec<_> = params.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["x", "y"]);
    }

    #[test]
    fn sources_borrow_or_parse() {
        let params = ParamSet::parse("a=1").unwrap();
        assert!(matches!(params.param_set(), Ok(Cow::Borrowed(_))));
        assert_eq!("a=1".param_set().unwrap().get("a"), Some("1"));
        assert_eq!(String::from("a=1").param_set().unwrap().get("a"), Some("1"));
    }
}
