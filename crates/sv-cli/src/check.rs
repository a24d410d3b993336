use serde::Serialize;

use sv_core::policy::{RenderingEngineHooks, SecurityPolicy};
use sv_core::types::{Decision, NavigationRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    MainFrame,
    SubFrame,
    Resource,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub url: String,
    pub kind: CheckKind,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub fn evaluate(policy: &SecurityPolicy, kind: CheckKind, urls: &[String]) -> Vec<CheckReport> {
    urls.iter().map(|url| check_one(policy, kind, url)).collect()
}

fn check_one(policy: &SecurityPolicy, kind: CheckKind, url: &str) -> CheckReport {
    let (decision, result) = match kind {
        CheckKind::Resource => (policy.decide_resource(url), policy.explain_resource(url)),
        CheckKind::MainFrame | CheckKind::SubFrame => {
            let req = NavigationRequest {
                url: url.to_string(),
                is_main_frame: kind == CheckKind::MainFrame,
            };
            (policy.decide_navigation(&req), policy.explain_navigation(&req))
        }
    };

    CheckReport {
        url: url.to_string(),
        kind,
        decision,
        reason: result.err().map(|reason| reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sv_core::blocklist::parse_blocklist;
    use sv_core::settings::MapSettings;
    use sv_core::PolicyConfig;

    use super::*;

    fn policy() -> SecurityPolicy {
        let settings = MapSettings::new().with("TargetUrl", "https://portal.example.com/");
        SecurityPolicy::new(
            PolicyConfig::resolve(&settings),
            Arc::new(parse_blocklist("ads.example.net")),
        )
    }

    #[test]
    fn reports_navigation_decisions() {
        let urls = vec![
            "https://app.portal.example.com/".to_string(),
            "https://evil.test/".to_string(),
            "http://portal.example.com/".to_string(),
        ];
        let reports = evaluate(&policy(), CheckKind::MainFrame, &urls);

        assert_eq!(reports[0].decision, Decision::Allow);
        assert_eq!(reports[0].reason, None);
        assert_eq!(reports[1].decision, Decision::Block);
        assert_eq!(
            reports[1].reason.as_deref(),
            Some("Navigation to external host 'evil.test' is blocked.")
        );
        assert_eq!(reports[2].decision, Decision::Block);
    }

    #[test]
    fn reports_resource_decisions() {
        let urls = vec![
            "https://x.ads.example.net/a.js".to_string(),
            "https://cdn.other.test/app.js".to_string(),
        ];
        let reports = evaluate(&policy(), CheckKind::Resource, &urls);

        assert_eq!(reports[0].decision, Decision::Block);
        assert_eq!(reports[1].decision, Decision::Allow);

        let json = serde_json::to_value(&reports[0]).expect("serialize");
        assert_eq!(json["decision"], "block");
        assert_eq!(json["kind"], "resource");
    }
}
