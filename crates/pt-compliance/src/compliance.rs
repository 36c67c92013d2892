use std::collections::HashMap;

use serde::Deserialize;

/// Per-site compliance row.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SiteCompliance {
    pub hud_enabled: bool,
    pub tracking_enabled: bool,
    pub restricted_features: Vec<String>,
    pub max_tables: Option<u32>,
}

impl Default for SiteCompliance {
    fn default() -> Self {
        Self { hud_enabled: true, tracking_enabled: true, restricted_features: Vec::new(), max_tables: None }
    }
}

impl SiteCompliance {
    pub fn is_feature_restricted(&self, feature: &str) -> bool {
        self.restricted_features.iter().any(|f| f == feature)
    }
}

/// Read-mostly lookup the dispatcher consults before emitting tracking-only
/// events").
#[derive(Debug, Clone, Default)]
pub struct ComplianceMatrix {
    sites: HashMap<String, SiteCompliance>,
}

impl ComplianceMatrix {
    pub fn new(sites: HashMap<String, SiteCompliance>) -> Self {
        Self { sites }
    }

    /// Unconfigured sites are treated permissively ([`SiteCompliance::default`])
    /// so the core remains usable against sites with no explicit entry.
    pub fn for_site(&self, site: &str) -> SiteCompliance {
        self.sites.get(site).cloned().unwrap_or_default()
    }

    /// Whether the recorder may be active for `site`.
    pub fn recording_allowed(&self, site: &str) -> bool {
        self.for_site(site).tracking_enabled
    }

    pub fn hud_allowed(&self, site: &str) -> bool {
        self.for_site(site).hud_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_site_is_permissive() {
        let matrix = ComplianceMatrix::default();
        assert!(matrix.recording_allowed("unknown_site"));
        assert!(matrix.hud_allowed("unknown_site"));
    }

    #[test]
    fn tracking_disabled_blocks_recording() {
        let mut sites = HashMap::new();
        sites.insert("strict_site".to_string(), SiteCompliance { tracking_enabled: false, ..Default::default() });
        let matrix = ComplianceMatrix::new(sites);
        assert!(!matrix.recording_allowed("strict_site"));
    }

    #[test]
    fn restricted_feature_lookup() {
        let site = SiteCompliance { restricted_features: vec!["hud".to_string()], ..Default::default() };
        assert!(site.is_feature_restricted("hud"));
        assert!(!site.is_feature_restricted("recorder"));
    }
}
