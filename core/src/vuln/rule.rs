use regex::Regex;
use serde::Deserialize;
use sonar_common::error::RuleError;
use sonar_common::models::{FindingKind, Severity};
use sonar_protocols::version;

/// A rule as written in YAML, before its pattern is compiled.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    pub id: String,
    pub target: FindingKind,
    /// Restricts a service rule to one identified service name.
    #[serde(default)]
    pub service: Option<String>,
    pub pattern: String,
    /// First fixed version; the pattern's first capture group is compared against it.
    #[serde(default)]
    pub fixed_in: Option<String>,
    pub vulnerability: String,
    /// May reference `{version}` and `{port}`.
    pub details: String,
    #[serde(default)]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    target: FindingKind,
    service: Option<String>,
    pattern: Regex,
    fixed_in: Option<String>,
    vulnerability: String,
    details: String,
    severity: Option<Severity>,
}

impl Rule {
    pub fn compile(def: RuleDefinition) -> Result<Self, RuleError> {
        let pattern = Regex::new(&def.pattern).map_err(|source| RuleError::Pattern {
            rule: def.id.clone(),
            source,
        })?;
        if def.fixed_in.is_some() && pattern.captures_len() < 2 {
            return Err(RuleError::Invalid {
                rule: def.id,
                reason: "fixed_in needs a capture group holding the version".to_string(),
            });
        }
        if def.target == FindingKind::Os && def.service.is_some() {
            return Err(RuleError::Invalid {
                rule: def.id,
                reason: "os rules cannot name a service".to_string(),
            });
        }

        Ok(Self {
            id: def.id,
            target: def.target,
            service: def.service,
            pattern,
            fixed_in: def.fixed_in,
            vulnerability: def.vulnerability,
            details: def.details,
            severity: def.severity,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target(&self) -> FindingKind {
        self.target
    }

    pub fn severity(&self) -> Option<Severity> {
        self.severity
    }

    pub fn vulnerability(&self) -> &str {
        &self.vulnerability
    }

    pub fn applies_to_service(&self, service: &str) -> bool {
        self.target == FindingKind::Service && self.service.as_deref().is_none_or(|name| name == service)
    }

    /// Tests `evidence` and returns the extracted version (empty if none) on a hit.
    ///
    /// A rule with `fixed_in` never fires when no version could be extracted.
    pub fn evaluate(&self, evidence: &str) -> Option<String> {
        let caps = self.pattern.captures(evidence)?;
        let version = caps.get(1).map(|m| m.as_str().to_string());

        match (&self.fixed_in, version) {
            (Some(fixed_in), Some(version)) => version::is_older(&version, fixed_in).then_some(version),
            (Some(_), None) => None,
            (None, version) => Some(version.unwrap_or_default()),
        }
    }

    pub fn render_details(&self, version: &str, port: Option<u16>) -> String {
        let port = port.map(|p| p.to_string()).unwrap_or_default();
        self.details.replace("{version}", version).replace("{port}", &port)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(pattern: &str, fixed_in: Option<&str>) -> RuleDefinition {
        RuleDefinition {
            id: "test".into(),
            target: FindingKind::Service,
            service: Some("ssh".into()),
            pattern: pattern.into(),
            fixed_in: fixed_in.map(Into::into),
            vulnerability: "test".into(),
            details: "{version} on {port}".into(),
            severity: None,
        }
    }

    #[test]
    fn fixed_in_compares_extracted_version() {
        let rule = Rule::compile(definition(r"OpenSSH_(\d+\.\d+(?:p\d+)?)", Some("7.7"))).unwrap();
        assert_eq!(rule.evaluate("SSH-2.0-OpenSSH_7.4"), Some("7.4".to_string()));
        assert_eq!(rule.evaluate("SSH-2.0-OpenSSH_8.9p1"), None);
        assert_eq!(rule.evaluate("SSH-2.0-dropbear"), None);
    }

    #[test]
    fn fixed_in_without_capture_group_is_rejected() {
        let err = Rule::compile(definition(r"OpenSSH", Some("7.7"))).unwrap_err();
        assert!(matches!(err, RuleError::Invalid { .. }));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let err = Rule::compile(definition(r"OpenSSH_(", None)).unwrap_err();
        assert!(matches!(err, RuleError::Pattern { .. }));
    }

    #[test]
    fn service_filter_and_details() {
        let rule = Rule::compile(definition(r"SSH-1\.", None)).unwrap();
        assert!(rule.applies_to_service("ssh"));
        assert!(!rule.applies_to_service("http"));
        assert_eq!(rule.render_details("1.5", Some(22)), "1.5 on 22");
    }
}
