use crate::parameters::SearchPrefix;
use url::form_urlencoded;

/// Raw search arguments: parameter name (optionally `name:modifier`) to
/// value, in the order the client sent them.
///
/// Repeating a name is allowed; the engine ANDs the repetitions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchArguments {
    entries: Vec<(String, String)>,
}

impl SearchArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an application/x-www-form-urlencoded query string.
    /// Example: "name=Chalmers&identifier=http://sys|123"
    pub fn from_query(query: &str) -> Self {
        form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value supplied for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchArguments {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Split `name:modifier` into its parts.
pub fn split_name_and_modifier(key: &str) -> (&str, Option<&str>) {
    match key.split_once(':') {
        Some((name, modifier)) if !modifier.is_empty() => (name, Some(modifier)),
        Some((name, _)) => (name, None),
        None => (key, None),
    }
}

/// Recognize a two-letter comparison prefix at the start of a value.
///
/// Only `lt|le|gt|ge|ne` are prefixes. Anything else, including other
/// leading letters, stays part of the literal and is left for the numeric
/// parser to reject.
pub fn extract_prefix(value: &str) -> (Option<SearchPrefix>, &str) {
    if let Some(p2) = value.get(..2)
        && let Some(prefix) = SearchPrefix::parse(p2)
    {
        return (Some(prefix), &value[2..]);
    }
    (None, value)
}

/// Split a value on unescaped commas (FHIR OR lists). `\,` yields a literal
/// comma. Empty alternatives are dropped.
pub fn split_or_values(value: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                current.push(',');
                chars.next();
            }
            ',' => {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    values.push(trimmed.to_string());
                }
                current.clear();
            }
            other => current.push(other),
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        values.push(trimmed.to_string());
    }
    values
}
