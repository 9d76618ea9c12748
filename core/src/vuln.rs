//! # Vulnerability Correlation
//!
//! Offline matching of gathered evidence against a [`RuleTable`]. Nothing here
//! touches the network. Service rules look at banners, OS rules look at the
//! fingerprinted OS. A finding is only produced when a rule actually matched.

use std::path::Path;

use sonar_common::error::RuleError;
use sonar_common::models::{FindingKind, OsInfo, ServiceResult, Vulnerability};
use sonar_common::network::target::Target;
use tracing::debug;

pub mod rule;

pub use rule::{Rule, RuleDefinition};

const BUILTIN_RULES: &str = include_str!("vuln/builtin.yaml");

#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The rules shipped with the scanner.
    pub fn builtin() -> Result<Self, RuleError> {
        Self::from_yaml(BUILTIN_RULES)
    }

    pub fn from_yaml(content: &str) -> Result<Self, RuleError> {
        let definitions: Vec<RuleDefinition> = serde_yaml::from_str(content)?;
        let rules = definitions
            .into_iter()
            .map(Rule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RuleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_yaml(&content)?;
        debug!("Loaded {} vulnerability rules from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Matches `services` and `os_info` against `rules`.
///
/// Findings come out grouped by service in input order, then OS findings.
/// With no services there is nothing to correlate and the result is empty,
/// whatever the OS evidence says.
pub fn correlate_vulnerabilities(
    target: &Target,
    services: &[ServiceResult],
    os_info: Option<&OsInfo>,
    rules: &RuleTable,
) -> Vec<Vulnerability> {
    if services.is_empty() {
        return Vec::new();
    }

    let mut findings = Vec::new();
    for service in services {
        for rule in rules.rules().iter().filter(|r| r.applies_to_service(&service.service)) {
            if let Some(version) = rule.evaluate(&service.banner) {
                findings.push(finding(rule, FindingKind::Service, Some(service.port), &version));
            }
        }
    }

    if let Some(os) = os_info {
        let evidence = match &os.os_version {
            Some(version) => format!("{} {version}", os.os_name),
            None => os.os_name.clone(),
        };
        for rule in rules.rules().iter().filter(|r| r.target() == FindingKind::Os) {
            if let Some(version) = rule.evaluate(&evidence) {
                findings.push(finding(rule, FindingKind::Os, None, &version));
            }
        }
    }

    debug!("{} findings for {target}", findings.len());
    findings
}

fn finding(rule: &Rule, kind: FindingKind, port: Option<u16>, version: &str) -> Vulnerability {
    debug!("Rule {} matched", rule.id());
    Vulnerability {
        port,
        kind,
        vulnerability: rule.vulnerability().to_string(),
        details: rule.render_details(version, port),
        severity: rule.severity(),
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
    use sonar_common::models::Severity;
    use std::net::{IpAddr, Ipv4Addr};

    fn target() -> Target {
        Target::from(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)))
    }

    fn service(port: u16, name: &str, banner: &str) -> ServiceResult {
        ServiceResult {
            port,
            service: name.to_string(),
            banner: banner.to_string(),
        }
    }

    #[test]
    fn builtin_rules_compile() {
        let rules = RuleTable::builtin().unwrap();
        assert!(rules.len() >= 10);
    }

    #[test]
    fn old_openssh_is_flagged() {
        let rules = RuleTable::builtin().unwrap();
        let services = vec![service(22, "ssh", "SSH-2.0-OpenSSH_7.4\r\n")];

        let findings = correlate_vulnerabilities(&target(), &services, None, &rules);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].port, Some(22));
        assert_eq!(findings[0].kind, FindingKind::Service);
        assert!(findings[0].vulnerability.contains("CVE-2018-15473"));
        assert!(findings[0].details.contains("7.4"));
        assert_eq!(findings[0].severity, Some(Severity::Medium));
    }

    #[test]
    fn current_software_is_clean() {
        let rules = RuleTable::builtin().unwrap();
        let services = vec![
            service(22, "ssh", "SSH-2.0-OpenSSH_9.6p1 Ubuntu-3ubuntu13\r\n"),
            service(80, "http", "HTTP/1.1 200 OK\r\nServer: nginx/1.24.0\r\n"),
            service(5000, "unknown", ""),
        ];
        let findings = correlate_vulnerabilities(&target(), &services, None, &rules);
        assert!(findings.is_empty());
    }

    #[test]
    fn service_rules_only_see_their_service() {
        let rules = RuleTable::builtin().unwrap();
        // An OpenSSH string inside an HTTP banner is not SSH evidence.
        let services = vec![service(80, "http", "HTTP/1.0 200 OK\r\nX-Upstream: OpenSSH_7.4\r\n")];
        assert!(correlate_vulnerabilities(&target(), &services, None, &rules).is_empty());
    }

    #[test]
    fn os_findings_need_services() {
        let rules = RuleTable::builtin().unwrap();
        let os = OsInfo {
            os_name: "Linux".into(),
            os_version: Some("16.04".into()),
            confidence: 80,
        };

        assert!(correlate_vulnerabilities(&target(), &[], Some(&os), &rules).is_empty());

        let services = vec![service(80, "http", "HTTP/1.1 200 OK\r\n")];
        let findings = correlate_vulnerabilities(&target(), &services, Some(&os), &rules);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::Os);
        assert_eq!(findings[0].port, None);
    }

    #[test]
    fn one_banner_can_match_several_rules() {
        let rules = RuleTable::builtin().unwrap();
        let services = vec![service(80, "http", "HTTP/1.1 200 OK\r\nServer: Apache/2.4.49 (Unix)\r\n")];
        let findings = correlate_vulnerabilities(&target(), &services, None, &rules);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Some(Severity::Critical));
    }

    #[test]
    fn custom_rules_from_yaml() {
        let yaml = r#"
- id: banner-leak
  target: service
  pattern: 'internal-build'
  vulnerability: "Internal build exposed"
  details: "port {port}"
"#;
        let rules = RuleTable::from_yaml(yaml).unwrap();
        let services = vec![service(8080, "http", "HTTP/1.1 200 OK\r\nServer: internal-build\r\n")];
        let findings = correlate_vulnerabilities(&target(), &services, None, &rules);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].details, "port 8080");
        assert_eq!(findings[0].severity, None);
    }

    #[test]
    fn unknown_rule_fields_are_rejected() {
        let yaml = "- id: x\n  target: service\n  pattern: x\n  vulnerability: x\n  details: x\n  cvss: 9.8\n";
        assert!(matches!(RuleTable::from_yaml(yaml), Err(RuleError::Parse(_))));
    }
}
