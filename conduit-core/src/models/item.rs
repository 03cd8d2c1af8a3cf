//! Records loaded from a connected provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single record returned by a provider's data endpoint.
///
/// Contacts, companies and deals (HubSpot), pages and databases (Notion),
/// bases and tables (Airtable) all share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationItem {
    /// Provider-side identifier.
    pub id: String,

    /// Record type, e.g. `contact`, `page`, `table`.
    #[serde(rename = "type")]
    pub item_type: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Whether the record contains other records.
    #[serde(default)]
    pub directory: bool,

    /// Identifier of the parent record.
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Name or path of the parent record.
    #[serde(default)]
    pub parent_path_or_name: Option<String>,

    /// Creation time.
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,

    /// Last modification time.
    #[serde(default)]
    pub last_modified_time: Option<DateTime<Utc>>,

    /// Link to the record in the provider's UI.
    #[serde(default)]
    pub url: Option<String>,

    /// MIME type, for file-like records.
    #[serde(default)]
    pub mime_type: Option<String>,

    /// Visibility flag reported by the provider.
    #[serde(default)]
    pub visibility: Option<bool>,
}
