//! Transport (MIME) headers.
//!
//! Reading folds repeated headers into one comma-joined value. Writing sets a
//! single value per name and never splits it again, so a header read and
//! written back loses its original multiplicity.

/// Ordered, possibly repeated transport headers of one envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeHeaders {
    entries: Vec<(String, String)>,
}

impl MimeHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header instance, keeping existing ones with the same name.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replace all instances of `name` with a single value.
    ///
    /// The value takes the position of the first replaced instance.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(index) => {
                self.entries[index] = (name.clone(), value);
                let mut position = 0;
                self.entries.retain(|(existing, _)| {
                    let keep = position <= index || !existing.eq_ignore_ascii_case(&name);
                    position += 1;
                    keep
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// All values of `name`, in order.
    pub fn header(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fold repeated headers into single `", "`-joined values.
///
/// Names match ASCII case-insensitively; the first occurrence decides the
/// casing and position of the merged entry.
pub fn merge_headers<'a, I>(entries: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut merged: Vec<(String, String)> = Vec::new();
    for (name, value) in entries {
        match merged
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, joined)) => {
                joined.push_str(", ");
                joined.push_str(value);
            }
            None => merged.push((name.to_string(), value.to_string())),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_repeated_headers() {
        let merged = merge_headers(vec![("X", "a"), ("X", "b"), ("X", "c")]);
        assert_eq!(merged, vec![("X".to_string(), "a, b, c".to_string())]);
    }

    #[test]
    fn test_merge_keeps_first_casing_and_order() {
        let merged = merge_headers(vec![
            ("Accept", "text/xml"),
            ("Host", "localhost"),
            ("accept", "application/soap+xml"),
        ]);
        assert_eq!(
            merged,
            vec![
                ("Accept".to_string(), "text/xml, application/soap+xml".to_string()),
                ("Host".to_string(), "localhost".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_headers(Vec::new()).is_empty());
    }

    #[test]
    fn test_set_header_replaces_all_instances() {
        let mut headers = MimeHeaders::new();
        headers.add_header("Host", "localhost");
        headers.add_header("X-Trace", "1");
        headers.add_header("x-trace", "2");
        headers.set_header("X-Trace", "a, b");

        assert_eq!(headers.header("x-trace"), vec!["a, b"]);
        assert_eq!(headers.len(), 2);
        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Host", "X-Trace"]);
    }

    #[test]
    fn test_set_header_appends_new_name() {
        let mut headers = MimeHeaders::new();
        headers.set_header("Content-Type", "text/xml");
        assert_eq!(headers.header("content-type"), vec!["text/xml"]);
    }
}
