//! Provider identifiers.
//!
//! [`ProviderKind`] is the closed set of third-party data providers an
//! operator can connect. It only selects a provider; the wire routes live in
//! the provider registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Provider Kind
// ============================================================================

/// Supported data providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Notion (document workspace)
    Notion,
    /// Airtable (spreadsheet-database)
    Airtable,
    /// HubSpot (CRM)
    #[serde(alias = "hub_spot")]
    HubSpot,
}

impl ProviderKind {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Notion => "Notion",
            Self::Airtable => "Airtable",
            Self::HubSpot => "HubSpot",
        }
    }

    /// Returns all available provider kinds.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::Notion, Self::Airtable, Self::HubSpot]
    }

    /// Returns the CLI name for this provider (lowercase, no spaces).
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Notion => "notion",
            Self::Airtable => "airtable",
            Self::HubSpot => "hubspot",
        }
    }

    /// Returns the kind of data source this provider represents.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Notion => "document workspace",
            Self::Airtable => "spreadsheet-database",
            Self::HubSpot => "CRM",
        }
    }

    /// Component name used when reporting lifecycle events for this provider.
    pub fn component_name(&self) -> String {
        format!("{}Integration", self.display_name())
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|kind| {
                kind.cli_name().eq_ignore_ascii_case(needle)
                    || kind.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| CoreError::UnknownProvider(needle.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("hubspot".parse::<ProviderKind>().unwrap(), ProviderKind::HubSpot);
        assert_eq!("HubSpot".parse::<ProviderKind>().unwrap(), ProviderKind::HubSpot);
        assert_eq!(" NOTION ".parse::<ProviderKind>().unwrap(), ProviderKind::Notion);
    }

    #[test]
    fn test_parse_unknown_provider() {
        let err = "salesforce".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownProvider(ref name) if name == "salesforce"));
    }

    #[test]
    fn test_component_name() {
        assert_eq!(ProviderKind::HubSpot.component_name(), "HubSpotIntegration");
    }

    #[test]
    fn test_all_kinds_have_distinct_cli_names() {
        let mut names: Vec<_> = ProviderKind::all().iter().map(|k| k.cli_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ProviderKind::all().len());
    }
}
