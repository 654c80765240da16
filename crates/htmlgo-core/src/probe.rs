//! Prefix self-test.
//!
//! Converts a fixed snippet that uses both component libraries and checks the
//! generated code refers to them through the configured prefixes, and that the
//! package prefix was not glued onto either of them.

use smol_str::SmolStr;

use crate::prefix::PrefixConfig;
use crate::request::ConversionRequest;

/// Markup with one component from each library.
pub const PROBE_MARKUP: &str = r#"<div>
    <v-btn>probe button</v-btn>
    <vx-dialog title="probe dialog">probe content</vx-dialog>
</div>"#;

/// Package prefix used for the probe, independent of the user's setting.
pub const PROBE_PACKAGE_PREFIX: &str = "h";

/// The request the probe sends for the current prefixes.
pub fn probe_request(current: &PrefixConfig) -> ConversionRequest {
    ConversionRequest::ToCode {
        markup: PROBE_MARKUP.to_string(),
        prefixes: probe_prefixes(current),
        children_mode: false,
    }
}

fn probe_prefixes(current: &PrefixConfig) -> PrefixConfig {
    PrefixConfig {
        package_prefix: SmolStr::new_static(PROBE_PACKAGE_PREFIX),
        ..current.clone()
    }
}

/// Outcome of each probe check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Code uses `<primary>.VBtn`.
    pub primary_prefix_used: bool,
    /// Code uses `<extended>.VXDialog`.
    pub extended_prefix_used: bool,
    /// Code contains `<package><primary>.`, a fused prefix.
    pub primary_prefix_fused: bool,
    /// Code contains `<package><extended>.`, a fused prefix.
    pub extended_prefix_fused: bool,
    pub code: String,
}

impl ProbeReport {
    pub fn evaluate(current: &PrefixConfig, code: impl Into<String>) -> Self {
        let code = code.into();
        let prefixes = probe_prefixes(current);
        let package = &prefixes.package_prefix;
        let primary = &prefixes.component_prefix_primary;
        let extended = &prefixes.component_prefix_extended;

        Self {
            primary_prefix_used: code.contains(&format!("{primary}.VBtn")),
            extended_prefix_used: code.contains(&format!("{extended}.VXDialog")),
            primary_prefix_fused: code.contains(&format!("{package}{primary}.")),
            extended_prefix_fused: code.contains(&format!("{package}{extended}.")),
            code,
        }
    }

    pub fn passed(&self) -> bool {
        self.primary_prefix_used
            && self.extended_prefix_used
            && !self.primary_prefix_fused
            && !self.extended_prefix_fused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "h.Div(\n\tv.VBtn(h.Text(\"probe button\")),\n\tvx.VXDialog(h.Text(\"probe content\")).Title(\"probe dialog\"),\n)";

    #[test]
    fn test_probe_request_pins_package_prefix() {
        let mut current = PrefixConfig::default();
        current.package_prefix = "html".into();
        current.component_prefix_primary = "vt".into();

        let ConversionRequest::ToCode { prefixes, markup, .. } = probe_request(&current) else {
            panic!("probe must convert to code");
        };
        assert_eq!(markup, PROBE_MARKUP);
        assert_eq!(prefixes.package_prefix, "h");
        assert_eq!(prefixes.component_prefix_primary, "vt");
    }

    #[test]
    fn test_report_passes_on_correct_code() {
        let report = ProbeReport::evaluate(&PrefixConfig::default(), GOOD);
        assert!(report.passed(), "{report:?}");
    }

    #[test]
    fn test_report_flags_fused_prefix() {
        let code = GOOD.replace("v.VBtn", "hv.VBtn");
        let report = ProbeReport::evaluate(&PrefixConfig::default(), code);
        assert!(report.primary_prefix_fused);
        assert!(!report.passed());
    }

    #[test]
    fn test_report_flags_missing_prefix() {
        let mut current = PrefixConfig::default();
        current.component_prefix_extended = "ext".into();
        let report = ProbeReport::evaluate(&current, GOOD);
        assert!(report.primary_prefix_used);
        assert!(!report.extended_prefix_used);
        assert!(!report.passed());
    }
}
