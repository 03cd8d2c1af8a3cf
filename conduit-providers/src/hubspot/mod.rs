//! HubSpot provider.
//!
//! HubSpot is a CRM. The data endpoint flattens contacts, companies and deals
//! into one item list; each item links back to the record in the HubSpot app.
//!
//! ## Consent
//!
//! The consent page is served by `app.hubspot.com`. Once the operator grants
//! access, the callback page closes its own window, which is what the
//! connection flow waits for.

mod descriptor;

pub use descriptor::hubspot_descriptor;
