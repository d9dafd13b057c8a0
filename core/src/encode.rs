//! Option-encoder: splits an options value into query parameters and a JSON
//! body.
//!
//! # Design
//! Every options type implements [`Payload`]. The query surface is written
//! out field by field in [`Payload::query`]; the body surface is the type's
//! `serde::Serialize` output, where query-only fields are `#[serde(skip)]`.
//! A type whose wire body is not a plain object overrides [`Payload::body`].
//!
//! Nothing stops a field from appearing on both surfaces. Options types keep
//! each field on exactly one of them.

use serde::{Deserialize, Serialize};

use crate::validate::ValidationErrors;

/// A value that can be sent as a query parameter.
pub trait Scalar {
    /// Canonical string form, or `None` when the value is absent.
    fn to_scalar(&self) -> Option<String>;

    /// Whether this is the zero value of its type.
    fn is_zero(&self) -> bool;
}

impl Scalar for bool {
    fn to_scalar(&self) -> Option<String> {
        Some(if *self { "true" } else { "false" }.to_string())
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

macro_rules! integer_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                fn to_scalar(&self) -> Option<String> {
                    Some(self.to_string())
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

integer_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl Scalar for str {
    fn to_scalar(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Scalar for String {
    fn to_scalar(&self) -> Option<String> {
        Some(self.clone())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Scalar> Scalar for Option<T> {
    fn to_scalar(&self) -> Option<String> {
        self.as_ref().and_then(Scalar::to_scalar)
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: Scalar + ?Sized> Scalar for &T {
    fn to_scalar(&self) -> Option<String> {
        (**self).to_scalar()
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

/// Query parameters in insertion order. A key may appear more than once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key=value`. Absent optional values are skipped.
    pub fn push<V: Scalar + ?Sized>(&mut self, key: &str, value: &V) -> &mut Self {
        if let Some(value) = value.to_scalar() {
            self.pairs.push((key.to_string(), value));
        }
        self
    }

    /// Append `key=value` unless the value is the zero of its type.
    pub fn push_nonzero<V: Scalar + ?Sized>(&mut self, key: &str, value: &V) -> &mut Self {
        if !value.is_zero() {
            self.push(key, value);
        }
        self
    }

    /// Flatten an embedded options value into this query.
    pub fn inline<P: Payload + ?Sized>(&mut self, embedded: &P) -> &mut Self {
        embedded.query(self);
        self
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// URL-encode as `application/x-www-form-urlencoded`, sorted by key.
    /// Values sharing a key keep their insertion order.
    pub fn encode(&self) -> String {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish()
    }
}

/// An options value that can be attached to a request.
pub trait Payload: Serialize {
    /// Write this value's query parameters.
    fn query(&self, _query: &mut Query) {}

    /// Encode the JSON body. Override when the wire form differs from the
    /// type's own serialization.
    fn body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Check the value's constraints before any I/O happens.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl Payload for () {}

/// Query parameters of an optional payload; empty for no payload.
pub fn query_of<P: Payload>(payload: Option<&P>) -> Query {
    let mut query = Query::new();
    if let Some(payload) = payload {
        payload.query(&mut query);
    }
    query
}

/// JSON body of an optional payload; empty for no payload.
pub fn body_of<P: Payload>(payload: Option<&P>) -> Result<Vec<u8>, serde_json::Error> {
    match payload {
        Some(payload) => payload.body(),
        None => Ok(Vec::new()),
    }
}

/// Paging parameters shared by the list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    #[serde(skip)]
    pub page: u32,
    #[serde(skip)]
    pub per_page: u32,
}

impl Payload for ListOptions {
    fn query(&self, query: &mut Query) {
        query
            .push_nonzero("page", &self.page)
            .push_nonzero("per_page", &self.per_page);
    }
}
