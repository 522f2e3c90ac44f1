//! One service per workflow domain, all built over a shared [`Gateway`](crate::Gateway).
//!
//! Every operation follows the same path: validate the caller's input (no request is sent if
//! that fails), send one request, normalise the reply. Failures pass once through the
//! gateway's classifier and are returned; nothing is retried or recovered here.

pub mod ipd;
pub mod legacy;
pub mod opd;
pub mod pharmacy;
pub mod theatre;

pub use ipd::IpdService;
pub use legacy::LegacyRouteService;
pub use opd::OpdService;
pub use pharmacy::PharmacyService;
pub use theatre::TheatreService;
