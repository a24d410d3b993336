use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use sv_core::blocklist::{try_load, BlockSet, FileSource};
use sv_core::config::{EngineHardening, PolicyConfig};
use sv_core::policy::SecurityPolicy;
use sv_core::settings::{JsonSettings, SettingsSource};

/// Resolved configuration as printed by `sv-cli config`.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub policy: PolicyConfig,
    pub hardening: EngineHardening,
}

impl ConfigReport {
    pub fn resolve(settings: &dyn SettingsSource) -> Self {
        let policy = PolicyConfig::resolve(settings);
        let hardening = policy.hardening();
        Self { policy, hardening }
    }
}

pub fn read_settings(path: &str) -> Result<JsonSettings, String> {
    JsonSettings::try_from_path(Path::new(path)).map_err(|e| e.to_string())
}

pub fn read_blocklist(path: &str) -> Result<BlockSet, String> {
    try_load(&FileSource::new(path)).map_err(|e| e.to_string())
}

/// Build a policy from optional inputs.
///
/// Unlike an attaching surface, the CLI reports unreadable inputs instead of
/// falling back to defaults.
pub fn build_policy(settings: Option<&str>, blocklist: Option<&str>) -> Result<SecurityPolicy, String> {
    let settings = match settings {
        Some(path) => read_settings(path)?,
        None => JsonSettings::empty(),
    };

    let block_set = match blocklist {
        Some(path) => read_blocklist(path)?,
        None => BlockSet::new(),
    };

    Ok(SecurityPolicy::new(PolicyConfig::resolve(&settings), Arc::new(block_set)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_inputs_are_errors() {
        assert!(read_settings("/nonexistent/appsettings.json").is_err());
        assert!(read_blocklist("/nonexistent/blocklist.txt").is_err());
        assert!(build_policy(None, Some("/nonexistent/blocklist.txt")).is_err());
    }

    #[test]
    fn defaults_without_inputs() {
        let policy = build_policy(None, None).expect("defaults");
        assert!(policy.config().enforce_allowlist);
        assert!(policy.block_set().is_empty());
    }

    #[test]
    fn config_report_serializes() {
        let settings = JsonSettings::from_json_str(
            r#"{"TargetUrl": "https://portal.example.com", "AdditionalAllowedHosts": "b.example, a.example"}"#,
        )
        .expect("valid settings");
        let json = serde_json::to_value(ConfigReport::resolve(&settings)).expect("serialize");

        assert_eq!(
            json["policy"]["allowed_hosts"],
            serde_json::json!(["a.example", "b.example", "portal.example.com"])
        );
        assert_eq!(json["hardening"]["allow_mixed_content"], serde_json::json!(false));
    }
}
