use contracts::shared::schema::ValidationIssue;
use std::collections::BTreeMap;

/// Field-keyed validation messages.
///
/// Keys are dotted paths (`name`, `steps.0.title`); only the first message
/// reported for a path is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    by_path: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a ValidationIssue>) -> Self {
        let mut by_path = BTreeMap::new();
        for issue in issues {
            by_path
                .entry(issue.joined_path())
                .or_insert_with(|| issue.message.clone());
        }
        Self { by_path }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_path.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True when `root` itself or anything nested under it has an error
    pub fn has_errors_under(&self, root: &str) -> bool {
        self.by_path.keys().any(|path| {
            path == root
                || path
                    .strip_prefix(root)
                    .map(|rest| rest.starts_with('.'))
                    .unwrap_or(false)
        })
    }
}
