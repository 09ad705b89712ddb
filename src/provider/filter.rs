//! List filters for provider queries.
//!
//! The provider accepts a single-field JSON object marshaled into a query
//! parameter. When several fields are set, the most specific one wins:
//! `id` over `label` over `tag`.

use serde_json::json;

/// Filter for provider list operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub id: Option<String>,
    pub label: Option<String>,
    pub tag: Option<String>,
}

impl ListFilter {
    #[must_use]
    pub fn by_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_label(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            ..Self::default()
        }
    }

    /// Render the filter as the JSON query-parameter value, or `None` when
    /// the filter is empty (list everything).
    #[must_use]
    pub fn render(&self) -> Option<String> {
        if let Some(id) = &self.id {
            return Some(json!({ "id": id }).to_string());
        }
        if let Some(label) = &self.label {
            return Some(json!({ "label": label }).to_string());
        }
        if let Some(tag) = &self.tag {
            return Some(json!({ "tags": tag }).to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_fields() {
        assert_eq!(
            ListFilter::by_id("123").render().as_deref(),
            Some(r#"{"id":"123"}"#)
        );
        assert_eq!(
            ListFilter::by_label("web").render().as_deref(),
            Some(r#"{"label":"web"}"#)
        );
        assert_eq!(
            ListFilter::by_tag("owned-by:abc").render().as_deref(),
            Some(r#"{"tags":"owned-by:abc"}"#)
        );
    }

    #[test]
    fn test_most_specific_field_wins() {
        let filter = ListFilter {
            id: Some("42".to_string()),
            label: Some("web".to_string()),
            tag: Some("prod".to_string()),
        };
        assert_eq!(filter.render().as_deref(), Some(r#"{"id":"42"}"#));

        let filter = ListFilter {
            id: None,
            label: Some("web".to_string()),
            tag: Some("prod".to_string()),
        };
        assert_eq!(filter.render().as_deref(), Some(r#"{"label":"web"}"#));
    }

    #[test]
    fn test_empty_filter_renders_nothing() {
        assert_eq!(ListFilter::default().render(), None);
    }
}
