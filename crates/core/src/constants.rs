//! Constants used throughout the flow core crate.
//!
//! Resource paths are relative to the configured API base.

/// API base used when none is configured.
pub const DEFAULT_API_BASE: &str = "/api/v1";

/// Outpatient flows collection.
pub const OPD_FLOWS_PATH: &str = "/opd/flows";

/// Inpatient flows collection.
pub const IPD_FLOWS_PATH: &str = "/ipd/flows";

/// Theatre cases collection.
pub const THEATRE_FLOWS_PATH: &str = "/theatre/flows";

/// Pharmacy orders collection.
pub const PHARMACY_ORDERS_PATH: &str = "/pharmacy/orders";

/// Legacy deep-link resolution endpoint.
pub const LEGACY_RESOLVE_PATH: &str = "/legacy-routes/resolve";
