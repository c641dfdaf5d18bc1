//! Linear-scan filtering over summaries.

use crate::session::{CynefinDomain, SessionSummary};

/// Criteria for narrowing the history list. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    /// Case-insensitive substring of the query
    pub text: Option<String>,
    pub domain: Option<CynefinDomain>,
    /// Exact tag match
    pub tag: Option<String>,
}

impl HistoryFilter {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn domain(mut self, domain: CynefinDomain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn matches(&self, summary: &SessionSummary) -> bool {
        if let Some(domain) = self.domain
            && summary.domain != domain
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !summary.tags.iter().any(|t| t == tag)
        {
            return false;
        }
        match &self.text {
            Some(text) => summary.query.to_lowercase().contains(&text.to_lowercase()),
            None => true,
        }
    }
}
