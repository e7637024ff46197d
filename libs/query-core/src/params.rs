use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A query parameter value; repeated keys arrive as `Many`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl QueryValue {
    /// First element of an array, or the value itself.
    pub fn first(&self) -> &str {
        match self {
            QueryValue::One(v) => v,
            QueryValue::Many(vs) => vs.first().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            QueryValue::One(v) => vec![v],
            QueryValue::Many(vs) => vs,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::One(first) => {
                *self = QueryValue::Many(vec![std::mem::take(first), value]);
            }
            QueryValue::Many(vs) => vs.push(value),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::One(v.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::One(v)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(vs: Vec<&str>) -> Self {
        QueryValue::Many(vs.into_iter().map(str::to_owned).collect())
    }
}

/// HTTP query parameters in first-seen key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(IndexMap<String, QueryValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string.
    /// A leading `?` is ignored.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        Self::from_pairs(
            url::form_urlencoded::parse(raw.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Group key/value pairs; a repeated key becomes an array.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (k, v) in pairs {
            params.append(k, v);
        }
        params
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.0.entry(key.into()) {
            indexmap::map::Entry::Occupied(mut e) => e.get_mut().push(value),
            indexmap::map::Entry::Vacant(e) => {
                e.insert(QueryValue::One(value));
            }
        }
    }

    /// Set `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &QueryValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_become_arrays() {
        let params = QueryParams::parse("?__populate=author&x=1&__populate=comments");
        assert_eq!(
            params.get("__populate"),
            Some(&QueryValue::Many(vec!["author".into(), "comments".into()]))
        );
        assert_eq!(params.get("x"), Some(&QueryValue::One("1".into())));
        let keys: Vec<_> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["__populate", "x"]);
    }

    #[test]
    fn percent_decoding() {
        let params = QueryParams::parse("name__icontains=bob%20smith&tag=a+b");
        assert_eq!(params.get("name__icontains").unwrap().first(), "bob smith");
        assert_eq!(params.get("tag").unwrap().first(), "a b");
    }

    #[test]
    fn first_of_empty_array_is_empty() {
        assert_eq!(QueryValue::Many(vec![]).first(), "");
    }
}
