//! Provider registry for managing all provider descriptors.
//!
//! The registry provides static access to all provider configurations
//! and is the central point for looking up providers and their wire routes.
//! Adding a provider means adding its descriptor to [`init_descriptors`].

use conduit_core::{CoreError, ProviderKind};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::airtable::airtable_descriptor;
use crate::descriptor::{ProviderDescriptor, WireRoutes};
use crate::hubspot::hubspot_descriptor;
use crate::notion::notion_descriptor;

// ============================================================================
// Static Registry
// ============================================================================

/// Static storage for all provider descriptors.
static DESCRIPTORS: OnceLock<Vec<ProviderDescriptor>> = OnceLock::new();

/// Static storage for CLI name to provider kind mapping.
static CLI_NAME_MAP: OnceLock<HashMap<String, ProviderKind>> = OnceLock::new();

/// Initializes all provider descriptors, in the order they are offered.
fn init_descriptors() -> Vec<ProviderDescriptor> {
    vec![notion_descriptor(), airtable_descriptor(), hubspot_descriptor()]
}

/// Builds the CLI name to provider kind mapping.
fn build_cli_name_map(descriptors: &[ProviderDescriptor]) -> HashMap<String, ProviderKind> {
    let mut map = HashMap::new();

    for desc in descriptors {
        map.insert(desc.cli.name.to_string(), desc.id);

        for alias in desc.cli.aliases {
            map.insert((*alias).to_string(), desc.id);
        }
    }

    map
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Global registry of all provider descriptors.
///
/// The registry is initialized lazily on first access, never changes
/// afterwards, and is safe to share between concurrent connection attempts.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Returns all provider descriptors.
    pub fn all() -> &'static [ProviderDescriptor] {
        DESCRIPTORS.get_or_init(init_descriptors)
    }

    /// Gets a provider descriptor by kind.
    pub fn get(id: ProviderKind) -> Option<&'static ProviderDescriptor> {
        Self::all().iter().find(|d| d.id == id)
    }

    /// Resolves a provider to its wire routes.
    ///
    /// Pure lookup; fails with [`CoreError::UnknownProvider`] if the provider
    /// has no registered descriptor.
    pub fn resolve(id: ProviderKind) -> Result<&'static WireRoutes, CoreError> {
        Self::get(id)
            .map(|d| &d.routes)
            .ok_or_else(|| CoreError::UnknownProvider(id.cli_name().to_string()))
    }

    /// Returns the CLI name to provider kind mapping.
    pub fn cli_name_map() -> &'static HashMap<String, ProviderKind> {
        CLI_NAME_MAP.get_or_init(|| build_cli_name_map(Self::all()))
    }

    /// Looks up a provider by CLI name or alias.
    pub fn get_by_cli_name(name: &str) -> Option<&'static ProviderDescriptor> {
        let kind = Self::cli_name_map().get(name)?;
        Self::get(*kind)
    }

    /// Resolves user input (CLI name, alias, or display name, any case).
    pub fn resolve_name(name: &str) -> Result<&'static ProviderDescriptor, CoreError> {
        let needle = name.trim().to_ascii_lowercase();
        if let Some(desc) = Self::get_by_cli_name(&needle) {
            return Ok(desc);
        }
        let kind: ProviderKind = name.parse()?;
        Self::get(kind).ok_or_else(|| CoreError::UnknownProvider(name.trim().to_string()))
    }

    /// Returns the number of registered providers.
    pub fn count() -> usize {
        Self::all().len()
    }

    /// Returns all provider kinds.
    pub fn kinds() -> Vec<ProviderKind> {
        Self::all().iter().map(|d| d.id).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
