use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workspace {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub category: String,
    /// Rates are in minor currency units.
    pub hourly_rate: Option<i64>,
    pub daily_rate: i64,
    pub monthly_rate: Option<i64>,
    pub images: Vec<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceFilter {
    pub category: Option<String>,
    pub location: Option<String>,
}

impl WorkspaceFilter {
    /// Drops the "show everything" sentinels the search form sends.
    pub fn normalized(self) -> Self {
        let keep = |v: Option<String>, sentinel: &str| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && s != sentinel)
        };
        Self {
            category: keep(self.category, "All Workspaces"),
            location: keep(self.location, "All Locations"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_drops_sentinels() {
        let filter = WorkspaceFilter {
            category: Some("All Workspaces".to_string()),
            location: Some("  Nairobi ".to_string()),
        }
        .normalized();
        assert_eq!(filter.category, None);
        assert_eq!(filter.location.as_deref(), Some("Nairobi"));
    }

    #[test]
    fn test_filter_drops_blank_values() {
        let filter = WorkspaceFilter {
            category: Some("".to_string()),
            location: Some("All Locations".to_string()),
        }
        .normalized();
        assert_eq!(filter.category, None);
        assert_eq!(filter.location, None);
    }
}
