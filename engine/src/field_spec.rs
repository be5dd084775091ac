//! Output columns and sort keys.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    error::{QueryError, QueryResult},
    ordered::Keyed,
    toggle::Toggle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One returned field, optionally computed by a script, optionally the sort key.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    fieldname: String,
    title: String,
    script: Option<String>,
    sort: Option<SortDirection>,
    enabled: Toggle,
    displayed: Toggle,
}

impl FieldSpec {
    pub fn new(fieldname: impl Into<String>) -> Self {
        let fieldname = fieldname.into();
        Self {
            title: fieldname.clone(),
            fieldname,
            script: None,
            sort: None,
            enabled: Toggle::default(),
            displayed: Toggle::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn with_sort(mut self, direction: SortDirection) -> Self {
        self.sort = Some(direction);
        self
    }

    pub fn with_enabled(mut self, enabled: impl Into<Toggle>) -> Self {
        self.enabled = enabled.into();
        self
    }

    pub fn with_displayed(mut self, displayed: impl Into<Toggle>) -> Self {
        self.displayed = displayed.into();
        self
    }

    pub fn validate(&self) -> QueryResult<()> {
        if self.fieldname.is_empty() {
            return Err(QueryError::Configuration("a fieldname is required".to_string()));
        }
        Ok(())
    }

    pub fn fieldname(&self) -> &str {
        &self.fieldname
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn is_script_field(&self) -> bool {
        self.script.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn is_displayed(&self) -> bool {
        self.displayed.get()
    }

    pub fn sort_direction(&self) -> Option<SortDirection> {
        self.sort
    }

    pub fn is_sorted(&self) -> bool {
        self.sort.is_some()
    }

    /// Siblings are not touched here; `QueryContext` clears them.
    pub(crate) fn set_sort(&mut self, direction: Option<SortDirection>) {
        self.sort = direction;
    }

    /// Direction a toggle moves to: unsorted and descending go ascending, ascending goes descending.
    pub fn next_sort(&self) -> SortDirection {
        match self.sort.unwrap_or(SortDirection::Desc) {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub(crate) fn toggle_sort(&mut self) -> SortDirection {
        let next = self.next_sort();
        self.sort = Some(next);
        next
    }

    /// Entry for the `fields` list, unless this is a script field.
    pub fn compute_field_request(&self) -> Option<Value> {
        if !self.is_enabled() || self.is_script_field() {
            return None;
        }
        Some(Value::String(self.fieldname.clone()))
    }

    /// Entry for `script_fields.<fieldname>`.
    pub fn compute_script_field_request(&self) -> Option<Value> {
        if !self.is_enabled() {
            return None;
        }
        self.script.as_ref().map(|script| json!({ "script": script }))
    }

    pub fn compute_sort_request(&self) -> Option<Value> {
        if !self.is_enabled() {
            return None;
        }
        let direction = self.sort?;
        let mut sort = serde_json::Map::new();
        sort.insert(self.fieldname.clone(), Value::String(direction.as_str().to_string()));
        Some(Value::Object(sort))
    }
}

impl Keyed for FieldSpec {
    fn fieldname(&self) -> &str {
        &self.fieldname
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_field_requests_its_name() {
        let field = FieldSpec::new("title");
        assert_eq!(field.compute_field_request(), Some(json!("title")));
        assert_eq!(field.compute_script_field_request(), None);
        assert_eq!(field.compute_sort_request(), None);
        assert_eq!(field.title(), "title");
    }

    #[test]
    fn script_field_requests_its_script_only() {
        let field = FieldSpec::new("price_vat").with_script("doc['price'].value * 1.2");
        assert_eq!(field.compute_field_request(), None);
        assert_eq!(
            field.compute_script_field_request(),
            Some(json!({ "script": "doc['price'].value * 1.2" }))
        );
    }

    #[test]
    fn disabled_field_emits_nothing() {
        let field = FieldSpec::new("title").with_sort(SortDirection::Asc).with_enabled(false);
        assert_eq!(field.compute_field_request(), None);
        assert_eq!(field.compute_script_field_request(), None);
        assert_eq!(field.compute_sort_request(), None);
    }

    #[test]
    fn sorted_field_requests_its_direction() {
        let field = FieldSpec::new("date").with_sort(SortDirection::Desc);
        assert_eq!(field.compute_sort_request(), Some(json!({ "date": "desc" })));
    }

    #[test]
    fn toggle_never_returns_to_unsorted() {
        let mut field = FieldSpec::new("date");
        assert_eq!(field.toggle_sort(), SortDirection::Asc);
        assert_eq!(field.toggle_sort(), SortDirection::Desc);
        assert_eq!(field.toggle_sort(), SortDirection::Asc);
        assert!(field.is_sorted());
    }

    #[test]
    fn empty_fieldname_is_rejected() {
        assert!(matches!(FieldSpec::new("").validate(), Err(QueryError::Configuration(_))));
    }
}
