//! Resolution of old deep links into current routes.

use crate::constants::LEGACY_RESOLVE_PATH;
use crate::error::ClassifiedResult;
use crate::gateway::Gateway;
use flow_contracts::legacy::LegacyLookup;
use flow_snapshots::{normalize_legacy_resolution, LegacyResolution};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct LegacyRouteService {
    gateway: Gateway,
}

impl LegacyRouteService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Asks the service where a legacy `{resource, identifier}` link now points. Matching happens
    /// server-side.
    pub async fn resolve(&self, lookup: &Value) -> ClassifiedResult<Option<LegacyResolution>> {
        const OP: &str = "legacy.resolve";
        let lookup: LegacyLookup = self.gateway.parse(OP, lookup)?;
        let url = self.gateway.list_url(OP, LEGACY_RESOLVE_PATH, &lookup)?;

        let data = self.gateway.get(OP, url).await?;
        Ok(normalize_legacy_resolution(&data))
    }
}
