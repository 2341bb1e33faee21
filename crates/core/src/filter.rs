//! Filter specification for the issues table.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::issue::{Category, Issue, Status};

/// Query-string value meaning "do not filter on this field".
pub const FILTER_ALL: &str = "all";

/// Either every value or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: PartialEq + Copy> Choice<T> {
    pub fn accepts(&self, value: T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => *wanted == value,
        }
    }
}

impl<T: FromStr<Err = CoreError>> Choice<T> {
    /// Parse `"all"` (or an empty value) as [`Choice::All`].
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Choice::All),
            Some(v) if v.eq_ignore_ascii_case(FILTER_ALL) => Ok(Choice::All),
            Some(v) => v.parse().map(Choice::Only),
        }
    }
}

pub type StatusFilter = Choice<Status>;
pub type CategoryFilter = Choice<Category>;

/// Active filter state of the issues view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueFilter {
    pub status: StatusFilter,
    pub category: CategoryFilter,
    pub search: String,
}

/// Filter as it arrives in a query string (`?status=&category=&q=`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFilterParams {
    pub status: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
}

impl IssueFilter {
    pub fn from_params(params: &IssueFilterParams) -> Result<Self, CoreError> {
        Ok(Self {
            status: Choice::parse(params.status.as_deref())?,
            category: Choice::parse(params.category.as_deref())?,
            search: params.q.clone().unwrap_or_default(),
        })
    }

    /// Whether `issue` passes every active criterion.
    pub fn matches(&self, issue: &Issue) -> bool {
        self.status.accepts(issue.status)
            && self.category.accepts(issue.category)
            && self.matches_search(issue)
    }

    fn matches_search(&self, issue: &Issue) -> bool {
        let needle = self.search.to_lowercase();
        needle.is_empty()
            || issue.id.to_lowercase().contains(&needle)
            || issue.description.to_lowercase().contains(&needle)
    }

    /// Filter `issues`, preserving their input order.
    pub fn apply<'a>(&self, issues: &'a [Issue]) -> Vec<&'a Issue> {
        issues.iter().filter(|i| self.matches(i)).collect()
    }
}
