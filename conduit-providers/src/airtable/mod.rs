//! Airtable provider.
//!
//! Airtable is a spreadsheet-database. Items are the bases and tables the
//! operator granted access to.

mod descriptor;

pub use descriptor::airtable_descriptor;
