use serde::{Deserialize, Serialize};

/// Name prefix the backend's functions log under.
pub const DEFAULT_GROUP_PREFIX: &str = "/aws/lambda/";

/// Keywords marking a log group as belonging to the email pipeline.
pub const RELEVANCE_KEYWORDS: &[&str] = &[
    "email",
    "parser",
    "processor",
    "supplier",
    "match",
    "extract",
    "upload",
    "feedback",
];

/// Preferred default groups, most preferred first.
pub const SELECTION_PRIORITY: &[&str] = &["email-processor", "email", "parser", "supplier"];

/// A selectable source of log records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroup {
    /// Full group name, used when querying events.
    pub id: String,
    pub display_name: String,
}

impl LogGroup {
    /// Builds a group from its full name, stripping `prefix` for display.
    pub fn from_name(name: &str, prefix: &str) -> Self {
        let display_name = name
            .strip_prefix(prefix)
            .filter(|rest| !rest.is_empty())
            .unwrap_or(name)
            .to_string();
        Self {
            id: name.to_string(),
            display_name,
        }
    }

    fn display_contains(&self, keyword: &str) -> bool {
        self.display_name
            .to_lowercase()
            .contains(&keyword.to_lowercase())
    }
}

/// Result of a discovery pass: the full listing, the relevant subset and the
/// default pick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupCatalog {
    pub all: Vec<LogGroup>,
    pub relevant: Vec<LogGroup>,
    pub selected: Option<LogGroup>,
    /// Set when filtering left nothing to select.
    pub diagnostic: Option<String>,
}

impl GroupCatalog {
    pub fn from_groups(all: Vec<LogGroup>) -> Self {
        let relevant: Vec<LogGroup> = all
            .iter()
            .filter(|group| is_relevant(group))
            .cloned()
            .collect();
        let selected = select_default(&relevant).cloned();
        let diagnostic = if relevant.is_empty() {
            Some(format!(
                "No relevant log groups: {} found, {} after filtering",
                all.len(),
                relevant.len()
            ))
        } else {
            None
        };

        Self {
            all,
            relevant,
            selected,
            diagnostic,
        }
    }

    /// Groups to list, either the relevant subset or everything.
    pub fn visible(&self, show_all: bool) -> &[LogGroup] {
        if show_all {
            &self.all
        } else {
            &self.relevant
        }
    }
}

pub fn is_relevant(group: &LogGroup) -> bool {
    RELEVANCE_KEYWORDS
        .iter()
        .any(|keyword| group.display_contains(keyword))
}

/// Picks the default group from the relevant set.
///
/// Walks [`SELECTION_PRIORITY`] in order and returns the first group whose
/// display name contains the keyword, falling back to the first group.
pub fn select_default(relevant: &[LogGroup]) -> Option<&LogGroup> {
    SELECTION_PRIORITY
        .iter()
        .find_map(|keyword| relevant.iter().find(|group| group.display_contains(keyword)))
        .or_else(|| relevant.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> Vec<LogGroup> {
        names
            .iter()
            .map(|name| LogGroup::from_name(&format!("{DEFAULT_GROUP_PREFIX}{name}"), DEFAULT_GROUP_PREFIX))
            .collect()
    }

    #[test]
    fn display_name_strips_prefix() {
        let group = LogGroup::from_name("/aws/lambda/email-parser", DEFAULT_GROUP_PREFIX);
        assert_eq!(group.id, "/aws/lambda/email-parser");
        assert_eq!(group.display_name, "email-parser");

        let bare = LogGroup::from_name("custom-group", DEFAULT_GROUP_PREFIX);
        assert_eq!(bare.display_name, "custom-group");
    }

    #[test]
    fn relevance_filter_is_case_insensitive() {
        let catalog = GroupCatalog::from_groups(groups(&["Email-Parser", "billing", "SupplierSync"]));

        let names: Vec<&str> = catalog.relevant.iter().map(|g| g.display_name.as_str()).collect();
        assert_eq!(names, vec!["Email-Parser", "SupplierSync"]);
        assert_eq!(catalog.all.len(), 3);
    }

    #[test]
    fn selection_follows_priority_list() {
        let catalog = GroupCatalog::from_groups(groups(&[
            "supplier-matcher",
            "email-parser",
            "prod-email-processor",
        ]));

        assert_eq!(
            catalog.selected.map(|g| g.display_name),
            Some("prod-email-processor".to_string())
        );
    }

    #[test]
    fn selection_falls_back_to_first_relevant() {
        let catalog = GroupCatalog::from_groups(groups(&["auth", "feedback-writer", "upload-hook"]));

        assert_eq!(
            catalog.selected.map(|g| g.display_name),
            Some("feedback-writer".to_string())
        );
    }

    #[test]
    fn empty_relevant_set_yields_diagnostic() {
        let catalog = GroupCatalog::from_groups(groups(&["auth", "billing"]));

        assert!(catalog.selected.is_none());
        assert_eq!(
            catalog.diagnostic.as_deref(),
            Some("No relevant log groups: 2 found, 0 after filtering")
        );
        assert_eq!(catalog.visible(false).len(), 0);
        assert_eq!(catalog.visible(true).len(), 2);
    }
}
