/// An HTTP header as a name-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Render a header name in canonical `Content-Type` form: the first letter
/// and every letter following a hyphen upper-cased, the rest lower-cased.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// An ordered collection of HTTP headers.
///
/// Preserves insertion order and supports duplicate header names
/// (e.g., multiple `Set-Cookie` headers). All lookups compare names
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<Header>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a value, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Header::new(name, value));
    }

    /// Replace every value of `name` with a single `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.entries.push(Header::new(name, value));
    }

    /// Remove all values of `name`, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|h| !h.name.eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|h| h.name.eq_ignore_ascii_case(name))
    }

    /// Get the first header value matching `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Get all header values matching `name` (case-insensitive).
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    /// Group values by canonical header name, in order of first appearance.
    ///
    /// `content-type` and `Content-Type` land in the same group.
    pub fn grouped(&self) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for header in &self.entries {
            let name = canonical_name(&header.name);
            match groups.iter_mut().find(|(n, _)| *n == name) {
                Some((_, values)) => values.push(header.value.clone()),
                None => groups.push((name, vec![header.value.clone()])),
            }
        }
        groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Header> {
        self.entries
    }
}

impl FromIterator<Header> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<(String, String)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, v)| Header::new(n, v))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_forms() {
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("CONTENT-LENGTH"), "Content-Length");
        assert_eq!(canonical_name("x-amzn-trace-id"), "X-Amzn-Trace-Id");
        assert_eq!(canonical_name("etag"), "Etag");
        assert_eq!(canonical_name(""), "");
    }

    #[test]
    fn header_map_append_and_get() {
        let mut map = HeaderMap::new();
        map.append("Content-Type", "text/html");
        assert_eq!(map.get("content-type"), Some("text/html"));
        assert_eq!(map.get("CONTENT-TYPE"), Some("text/html"));
    }

    #[test]
    fn header_map_get_missing() {
        let map = HeaderMap::new();
        assert_eq!(map.get("X-Missing"), None);
        assert!(!map.contains("X-Missing"));
    }

    #[test]
    fn header_map_duplicate_headers() {
        let mut map = HeaderMap::new();
        map.append("Set-Cookie", "a=1");
        map.append("set-cookie", "b=2");

        assert_eq!(map.get("Set-Cookie"), Some("a=1"));
        assert_eq!(map.get_all("SET-COOKIE"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn header_map_set_replaces_all_case_variants() {
        let mut map = HeaderMap::new();
        map.append("x-test", "1");
        map.append("X-Test", "2");
        map.set("X-TEST", "3");

        assert_eq!(map.get_all("x-test"), vec!["3"]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn header_map_remove() {
        let mut map = HeaderMap::new();
        map.append("A", "1");
        map.append("a", "2");
        map.append("B", "3");

        assert_eq!(map.remove("a"), 2);
        assert_eq!(map.len(), 1);
        assert_eq!(map.remove("a"), 0);
    }

    #[test]
    fn header_map_grouped_folds_case_in_first_seen_order() {
        let mut map = HeaderMap::new();
        map.append("x-b", "1");
        map.append("Content-Type", "text/plain");
        map.append("X-B", "2");

        let groups = map.grouped();
        assert_eq!(
            groups,
            vec![
                ("X-B".to_string(), vec!["1".to_string(), "2".to_string()]),
                ("Content-Type".to_string(), vec!["text/plain".to_string()]),
            ]
        );
    }

    #[test]
    fn header_map_len_and_empty() {
        let mut map = HeaderMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);

        map.append("X-Test", "1");
        assert!(!map.is_empty());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn header_map_from_iterator() {
        let map: HeaderMap = vec![
            ("Host".to_string(), "example.com".to_string()),
            ("Accept".to_string(), "*/*".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("host"), Some("example.com"));
    }

    #[test]
    fn header_map_into_vec_preserves_order() {
        let mut map = HeaderMap::new();
        map.append("A", "1");
        map.append("B", "2");

        let vec = map.into_vec();
        assert_eq!(vec[0].name, "A");
        assert_eq!(vec[1].name, "B");
    }
}
