//! Metric tags.
//!
//! A tag is an immutable key/value pair identifying one dimension of a
//! metric (e.g., `db.operation=get`). A tag set is an ordered sequence
//! of tags; equality of two tag sets is order-sensitive.

use std::fmt;

/// Tag key naming the service an operation was issued against.
pub const SERVICE_TAG_KEY: &str = "db.coral.service";

/// Tag key naming the operation itself.
pub const OPERATION_TAG_KEY: &str = "db.operation";

/// A key/value label dimension attached to a metric name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Build the tag set for a completed operation.
///
/// The service tag comes first, then the operation tag. The operation
/// tag is only attached when a service is present.
pub fn operation_tags(op: Option<&str>, service: Option<&str>) -> Vec<Tag> {
    let mut tags = Vec::new();
    if let Some(service) = service {
        tags.push(Tag::new(SERVICE_TAG_KEY, service));
        if let Some(op) = op {
            tags.push(Tag::new(OPERATION_TAG_KEY, op));
        }
    }
    tags
}

/// Render a tag set as `{ key=value key=value }` for log emission.
pub fn format_tags(tags: &[Tag]) -> String {
    let mut out = String::from("{");
    for tag in tags {
        out.push(' ');
        out.push_str(&tag.key);
        out.push('=');
        out.push_str(&tag.value);
        out.push(' ');
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_tags_full() {
        let tags = operation_tags(Some("get"), Some("kv"));
        assert_eq!(
            tags,
            vec![
                Tag::new(SERVICE_TAG_KEY, "kv"),
                Tag::new(OPERATION_TAG_KEY, "get"),
            ]
        );
    }

    #[test]
    fn test_operation_tags_without_service() {
        // No service means no tags at all, even when an op is given.
        assert!(operation_tags(Some("get"), None).is_empty());
    }

    #[test]
    fn test_operation_tags_service_only() {
        let tags = operation_tags(None, Some("query"));
        assert_eq!(tags, vec![Tag::new(SERVICE_TAG_KEY, "query")]);
    }

    #[test]
    fn test_tag_set_equality_is_order_sensitive() {
        let a = vec![Tag::new("a", "1"), Tag::new("b", "2")];
        let b = vec![Tag::new("b", "2"), Tag::new("a", "1")];
        assert_ne!(a, b);
    }

    #[test]
    fn test_format_tags() {
        let tags = vec![Tag::new("db.coral.service", "kv")];
        assert_eq!(format_tags(&tags), "{ db.coral.service=kv }");
        assert_eq!(format_tags(&[]), "{}");
    }
}
