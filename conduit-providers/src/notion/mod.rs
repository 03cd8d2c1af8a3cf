//! Notion provider.
//!
//! Notion is a document workspace. The data endpoint returns the pages and
//! databases shared with the integration during consent.

mod descriptor;

pub use descriptor::notion_descriptor;
