//! Lookups that translate an old-style resource link into a current workflow route.

use crate::patterns::RESOURCE_SLUG_RE;
use crate::schema::{Contract, FieldKind, FieldSpec};
use crate::Contracted;
use flow_ids::FlowId;
use serde::{Deserialize, Serialize};

pub static LEGACY_LOOKUP: Contract = Contract {
    name: "LegacyLookup",
    fields: &[
        FieldSpec::required(
            "resource",
            FieldKind::Pattern {
                regex: &RESOURCE_SLUG_RE,
                hint: "a resource slug such as pharmacy-orders",
            },
        ),
        FieldSpec::required("identifier", FieldKind::Identifier),
    ],
    rules: &[],
};

/// Resource kind and identifier taken from a legacy link.
///
/// `resource` is kept as sent; the service matches it case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyLookup {
    pub resource: String,
    pub identifier: FlowId,
}

impl Contracted for LegacyLookup {
    fn contract() -> &'static Contract {
        &LEGACY_LOOKUP
    }
}
