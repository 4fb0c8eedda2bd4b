//! Query descriptors for the Redmine REST API.
//!
//! A [`Query`] is a resource name plus an ordered parameter map. Filters
//! follow Redmine's `f[]=name&op[name]=operator&v[name][]=value` convention
//! and accumulate: filtering the same field twice appends instead of
//! overwriting.

use std::fmt;

use indexmap::IndexMap;

/// Key listing the filtered field names.
const FILTER_FIELDS_KEY: &str = "f[]";

/// A single parameter value: one scalar or an ordered list of scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
}

impl ParamValue {
    /// All scalars carried by this value, in order.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Scalar(v) => vec![v.as_str()],
            Self::List(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Scalar(existing) => {
                let first = std::mem::take(existing);
                *self = Self::List(vec![first, value]);
            }
            Self::List(vs) => vs.push(value),
        }
    }
}

/// Query parameters: either an ordered key map or a pre-encoded raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    Map(IndexMap<String, ParamValue>),
    Raw(String),
}

impl Default for Params {
    fn default() -> Self {
        Self::Map(IndexMap::new())
    }
}

/// A REST query descriptor, built by value.
///
/// Every builder method returns a new `Query`, so a partially built query
/// can be reused as the base of several derived ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    resource: String,
    params: Params,
}

impl Query {
    /// Create an empty query for a resource such as `issues` or
    /// `enumerations/time_entry_activities`.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: Params::default(),
        }
    }

    /// Create a query whose parameters are an already encoded string.
    pub fn raw(resource: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: Params::Raw(raw.into()),
        }
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Look up a parameter by its unencoded key.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        match &self.params {
            Params::Map(map) => map.get(key),
            Params::Raw(_) => None,
        }
    }

    /// Return a copy with `key` set to a scalar, replacing any previous value.
    ///
    /// # Panics
    /// Panics if the query carries raw parameters.
    #[must_use]
    pub fn with_param(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.map_mut()
            .insert(key.into(), ParamValue::Scalar(value.into()));
        next
    }

    /// Return a copy with the filter `name <operator> value` appended.
    ///
    /// `name` is added to `f[]`, `op[name]` is set to `operator` and, when
    /// `value` is present and non-empty, it is appended to `v[name][]`.
    ///
    /// # Panics
    /// Panics on a filter name that is empty or contains brackets, or if the
    /// query carries raw parameters. Both are construction bugs.
    #[must_use]
    pub fn add_filter(&self, name: &str, operator: &str, value: Option<&str>) -> Self {
        assert!(
            !name.is_empty() && !name.contains(['[', ']']),
            "invalid filter name {name:?}"
        );

        let mut next = self.clone();
        let map = next.map_mut();

        append(map, FILTER_FIELDS_KEY.to_string(), name.to_string());
        map.insert(
            format!("op[{name}]"),
            ParamValue::Scalar(operator.to_string()),
        );
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            append(map, format!("v[{name}][]"), value.to_string());
        }

        next
    }

    /// Field names in `f[]`, in the order they were filtered.
    #[must_use]
    pub fn filter_names(&self) -> Vec<&str> {
        self.param(FILTER_FIELDS_KEY)
            .map(ParamValue::values)
            .unwrap_or_default()
    }

    /// Operator recorded for a filtered field.
    #[must_use]
    pub fn filter_operator(&self, name: &str) -> Option<&str> {
        match self.param(&format!("op[{name}]")) {
            Some(ParamValue::Scalar(op)) => Some(op.as_str()),
            _ => None,
        }
    }

    /// Values recorded for a filtered field.
    #[must_use]
    pub fn filter_values(&self, name: &str) -> Vec<&str> {
        self.param(&format!("v[{name}][]"))
            .map(ParamValue::values)
            .unwrap_or_default()
    }

    /// Render the wire path: `<resource>.json` optionally followed by
    /// `?` and the `&`-joined, percent-encoded parameters.
    #[must_use]
    pub fn to_wire(&self) -> String {
        let encoded = match &self.params {
            Params::Raw(raw) => raw.clone(),
            Params::Map(map) => map
                .iter()
                .flat_map(|(key, value)| {
                    value
                        .values()
                        .into_iter()
                        .map(move |v| format!("{}={}", urlencoding::encode(key), urlencoding::encode(v)))
                })
                .collect::<Vec<_>>()
                .join("&"),
        };

        if encoded.is_empty() {
            format!("{}.json", self.resource)
        } else {
            format!("{}.json?{encoded}", self.resource)
        }
    }

    fn map_mut(&mut self) -> &mut IndexMap<String, ParamValue> {
        match &mut self.params {
            Params::Map(map) => map,
            Params::Raw(raw) => panic!("cannot add parameters to raw query {raw:?}"),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

fn append(map: &mut IndexMap<String, ParamValue>, key: String, value: String) {
    match map.get_mut(&key) {
        Some(existing) => existing.push(value),
        None => {
            map.insert(key, ParamValue::List(vec![value]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_query_has_no_suffix() {
        assert_eq!(Query::new("issues").to_wire(), "issues.json");
        assert_eq!(Query::raw("issues", "").to_wire(), "issues.json");
    }

    #[test]
    fn test_raw_params_pass_through() {
        assert_eq!(
            Query::raw("issues", "limit=1").to_wire(),
            "issues.json?limit=1"
        );
    }

    #[test]
    fn test_filter_serialization() {
        let query = Query::new("issues")
            .add_filter("assigned_to_id", "=", Some("me"))
            .add_filter("status_id", "o", None);

        assert_eq!(
            query.to_wire(),
            "issues.json?f%5B%5D=assigned_to_id&f%5B%5D=status_id\
             &op%5Bassigned_to_id%5D=%3D&v%5Bassigned_to_id%5D%5B%5D=me\
             &op%5Bstatus_id%5D=o"
        );
    }

    #[test]
    fn test_same_filter_twice_accumulates() {
        let query = Query::new("issues")
            .add_filter("tracker_id", "=", Some("1"))
            .add_filter("tracker_id", "=", Some("2"));

        assert_eq!(query.filter_names(), vec!["tracker_id", "tracker_id"]);
        assert_eq!(query.filter_values("tracker_id"), vec!["1", "2"]);
        assert_eq!(query.filter_operator("tracker_id"), Some("="));
    }

    #[test]
    fn test_empty_value_is_not_recorded() {
        let query = Query::new("issues").add_filter("subject", "~", Some(""));
        assert_eq!(query.filter_names(), vec!["subject"]);
        assert!(query.filter_values("subject").is_empty());
    }

    #[test]
    fn test_base_query_is_not_mutated() {
        let base = Query::new("issues").add_filter("status_id", "o", None);
        let derived = base.add_filter("subject", "~", Some("login"));

        assert_eq!(base.filter_names(), vec!["status_id"]);
        assert_eq!(derived.filter_names(), vec!["status_id", "subject"]);
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let query = Query::new("issues").with_param("subject", "a b&c");
        assert_eq!(query.to_wire(), "issues.json?subject=a%20b%26c");
    }

    #[test]
    #[should_panic(expected = "invalid filter name")]
    fn test_bracketed_filter_name_panics() {
        let _ = Query::new("issues").add_filter("cf[1]", "=", Some("x"));
    }
}
