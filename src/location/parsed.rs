//! Structured locations and history ingestion.

use crate::history::HistoryLocation;
use crate::location::search::SearchSerializer;
use crate::value::{replace_equal_deep, Value};

/// History state key carrying the real target of a masked location.
pub const TEMP_LOCATION_KEY: &str = "__tempLocation";
/// History state key tying a masked entry to one router instance.
pub const TEMP_KEY: &str = "__tempKey";

/// A fully parsed location.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLocation {
    pub pathname: String,
    pub search: Value,
    /// Serialised search, `""` or `?..`.
    pub search_str: String,
    /// Fragment without the leading `#`.
    pub hash: String,
    pub state: Value,
    pub href: String,
    /// What the URL bar shows when this location is masked.
    pub masked_location: Option<Box<ParsedLocation>>,
    pub unmask_on_reload: Option<bool>,
}

impl ParsedLocation {
    pub fn new(pathname: impl Into<String>, search: Value, search_str: String, hash: impl Into<String>, state: Value) -> Self {
        let pathname = pathname.into();
        let hash = hash.into();
        let href = href_of(&pathname, &search_str, &hash);
        Self {
            pathname,
            search,
            search_str,
            hash,
            state,
            href,
            masked_location: None,
            unmask_on_reload: None,
        }
    }

    /// Same pathname, search and hash.
    pub fn same_url(&self, other: &ParsedLocation) -> bool {
        self.href == other.href
    }

    /// The location as it would be written to history.
    pub fn to_history(&self) -> HistoryLocation {
        HistoryLocation {
            pathname: self.pathname.clone(),
            search: self.search_str.clone(),
            hash: if self.hash.is_empty() { String::new() } else { format!("#{}", self.hash) },
            state: self.state.clone(),
        }
    }
}

/// `pathname + search + #hash`.
pub fn href_of(pathname: &str, search_str: &str, hash: &str) -> String {
    if hash.is_empty() {
        format!("{pathname}{search_str}")
    } else {
        format!("{pathname}{search_str}#{hash}")
    }
}

/// Turn a history entry into a [`ParsedLocation`], sharing structure with `previous`.
///
/// Entries written for a masked navigation carry their real target in state;
/// that target is returned with the displayed entry as `masked_location`,
/// unless the entry belongs to another router instance.
pub fn parse_location(
    location: &HistoryLocation,
    previous: Option<&ParsedLocation>,
    serializer: &dyn SearchSerializer,
    temp_key: &str,
) -> ParsedLocation {
    let displayed = parse_plain(location, previous, serializer);

    let Some(temp) = location.state.get(TEMP_LOCATION_KEY) else {
        return displayed;
    };
    let owned = match location.state.get(TEMP_KEY) {
        None => true,
        Some(key) => key.as_str() == Some(temp_key),
    };
    if !owned {
        return displayed;
    }

    let real = HistoryLocation {
        pathname: temp.get("pathname").and_then(Value::as_str).unwrap_or("/").to_string(),
        search: temp.get("search").and_then(Value::as_str).unwrap_or_default().to_string(),
        hash: temp.get("hash").and_then(Value::as_str).unwrap_or_default().to_string(),
        state: {
            let state = temp.get("state").cloned().unwrap_or_else(Value::object);
            match location.state.get("key") {
                Some(key) => state.with("key", key.clone()),
                None => state,
            }
        },
    };

    let mut parsed = parse_plain(&real, previous, serializer);
    parsed.masked_location = Some(Box::new(displayed));
    parsed
}

fn parse_plain(
    location: &HistoryLocation,
    previous: Option<&ParsedLocation>,
    serializer: &dyn SearchSerializer,
) -> ParsedLocation {
    let search = serializer.parse(&location.search);
    let state = if location.state.is_object() {
        location.state.clone()
    } else {
        Value::object()
    };
    let (search, state) = match previous {
        Some(prev) => (
            replace_equal_deep(&prev.search, search),
            replace_equal_deep(&prev.state, state),
        ),
        None => (search, state),
    };

    ParsedLocation::new(
        location.pathname.clone(),
        search,
        location.search.clone(),
        location.hash.trim_start_matches('#'),
        state,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::search::JsonSearchSerializer;
    use serde_json::json;

    fn hl(href: &str, state: serde_json::Value) -> HistoryLocation {
        HistoryLocation::from_href(href, Value::from(state))
    }

    #[test]
    fn test_parse_plain_location() {
        let loc = parse_location(&hl("/a?page=2#top", json!({})), None, &JsonSearchSerializer, "k");
        assert_eq!(loc.pathname, "/a");
        assert_eq!(loc.search.get("page"), Some(&Value::from(2i64)));
        assert_eq!(loc.hash, "top");
        assert_eq!(loc.href, "/a?page=2#top");
        assert!(loc.masked_location.is_none());
    }

    #[test]
    fn test_search_shares_with_previous() {
        let first = parse_location(&hl("/a?f=%7B%22x%22%3A1%7D", json!({})), None, &JsonSearchSerializer, "k");
        let second = parse_location(&hl("/b?f=%7B%22x%22%3A1%7D", json!({})), Some(&first), &JsonSearchSerializer, "k");
        assert!(second.search.ptr_eq(&first.search));
    }

    #[test]
    fn test_temp_location_is_unwrapped() {
        let state = json!({
            "key": "abc",
            "__tempLocation": {"pathname": "/photos/1", "search": "?m=1", "hash": "", "state": {}},
            "__tempKey": "k",
        });
        let loc = parse_location(&hl("/photos", state), None, &JsonSearchSerializer, "k");
        assert_eq!(loc.pathname, "/photos/1");
        assert_eq!(loc.state.get("key").and_then(Value::as_str), Some("abc"));
        assert_eq!(loc.masked_location.as_ref().unwrap().pathname, "/photos");
    }

    #[test]
    fn test_foreign_temp_key_shows_mask() {
        let state = json!({
            "__tempLocation": {"pathname": "/photos/1", "search": "", "hash": "", "state": {}},
            "__tempKey": "other-instance",
        });
        let loc = parse_location(&hl("/photos", state), None, &JsonSearchSerializer, "k");
        assert_eq!(loc.pathname, "/photos");
        assert!(loc.masked_location.is_none());
    }
}
