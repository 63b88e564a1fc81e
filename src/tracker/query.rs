//! Item query filter expressions
//!
//! Builds tracker query strings of the form
//! `project.id IN (1, 2) AND status IN ('Open')`. A filter without clauses
//! renders as a predicate that matches every item.

use std::fmt;

/// Predicate used when no clause was added
pub const MATCH_ALL: &str = "project.id > 0";

/// A literal inside an `IN (...)` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Rendered bare
    Number(i64),
    /// Rendered single-quoted
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Text(s) => write!(f, "'{}'", escape_text(s)),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(FilterValue::Number)
            .unwrap_or_else(|_| FilterValue::Text(value.to_string()))
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

/// Escapes single quotes inside a quoted literal
pub(crate) fn escape_text(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Conjunction of `field IN (values)` clauses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    clauses: Vec<(String, Vec<FilterValue>)>,
}

impl ItemFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `field IN (values)` clause. An empty value list adds nothing.
    pub fn field_in<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        let values: Vec<FilterValue> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.clauses.push((field.into(), values));
        }
        self
    }

    /// Restricts to items in the given projects
    pub fn projects<I: IntoIterator<Item = u64>>(self, ids: I) -> Self {
        self.field_in("project.id", ids)
    }

    /// Restricts to items in the given trackers
    pub fn trackers<I: IntoIterator<Item = u64>>(self, ids: I) -> Self {
        self.field_in("tracker.id", ids)
    }

    /// Restricts to items whose status name is one of `statuses`
    pub fn statuses<I, S>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_in("status", statuses.into_iter().map(Into::<String>::into))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Renders the filter as a tracker query string
    pub fn to_query_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ItemFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str(MATCH_ALL);
        }

        for (i, (field, values)) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
            write!(f, "{} IN ({})", field, rendered.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        assert_eq!(ItemFilter::new().to_query_string(), "project.id > 0");
    }

    #[test]
    fn test_single_clause() {
        let filter = ItemFilter::new().projects([1, 2, 3]);

        assert_eq!(filter.to_query_string(), "project.id IN (1, 2, 3)");
    }

    #[test]
    fn test_clauses_are_joined_with_and() {
        let filter = ItemFilter::new()
            .projects([10])
            .trackers([20, 21])
            .statuses(["Open", "In Progress"]);

        assert_eq!(
            filter.to_query_string(),
            "project.id IN (10) AND tracker.id IN (20, 21) AND status IN ('Open', 'In Progress')"
        );
    }

    #[test]
    fn test_empty_value_lists_are_skipped() {
        let filter = ItemFilter::new()
            .projects(Vec::new())
            .statuses(vec!["Closed".to_string()]);

        assert_eq!(filter.to_query_string(), "status IN ('Closed')");
    }

    #[test]
    fn test_quotes_are_escaped() {
        let filter = ItemFilter::new().statuses(["Won't fix"]);

        assert_eq!(filter.to_query_string(), r"status IN ('Won\'t fix')");
    }

    #[test]
    fn test_custom_field() {
        let filter = ItemFilter::new().field_in("priority.name", ["High"]);

        assert_eq!(filter.to_string(), "priority.name IN ('High')");
    }
}
