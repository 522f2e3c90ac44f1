//! Canonical snapshots of workflow records returned by the remote service.
//!
//! The service is not consistent about field names, nesting or enum casing across its OPD, IPD,
//! Theatre and Pharmacy endpoints. Every normaliser here accepts whatever shape arrives and
//! produces one stable, fully populated structure:
//! - absent relations are `None`, absent collections are empty, absent text is `""`
//! - enum-like tags are trimmed and upper-cased (legacy slugs are lower-cased)
//! - display identifiers never expose a UUID when a friendly id exists
//! - each snapshot carries a merged, newest-first timeline of its dated events
//!
//! Normalisation is total: the only rejected input is one that is not a JSON object, and
//! re-normalising a serialised snapshot gives back the same id, stage and timeline.

pub mod common;
pub mod envelope;
pub mod ipd;
pub mod legacy;
pub mod opd;
pub mod pharmacy;
pub mod record;
pub mod theatre;
pub mod timeline;

pub use common::{PatientSummary, StageChange, VitalReading, UNKNOWN_PATIENT};
pub use envelope::{normalize_list, ListEnvelope, Pagination, WireList};
pub use ipd::{normalize_ipd_flow_list, normalize_ipd_flow_snapshot, IpdFlowSnapshot};
pub use legacy::{normalize_legacy_resolution, LegacyResolution};
pub use opd::{normalize_opd_flow_list, normalize_opd_flow_snapshot, OpdFlowSnapshot};
pub use pharmacy::{
    normalize_pharmacy_order_list, normalize_pharmacy_order_snapshot, PharmacyOrderSnapshot,
};
pub use theatre::{
    normalize_theatre_flow_list, normalize_theatre_flow_snapshot, TheatreFlowSnapshot,
};
pub use timeline::{merge_timeline, Timeline, TimelineEntry, TimelineEvent};
