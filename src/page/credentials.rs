use crate::handshake::HandshakeOutcome;
use crate::types::constants::LIVE_TOPIC_PREFIX;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

static START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<([A-Za-z][A-Za-z0-9-]*)([^>]*)>").expect("start tag pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

/// Tokens a rendered LiveView page hands to its socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeCredentials {
    pub csrf_token: String,
    pub session: String,
    pub static_data: String,
    pub element_id: String,
}

impl HandshakeCredentials {
    /// Channel topic of the mounted view
    pub fn topic(&self) -> String {
        format!("{}{}", LIVE_TOPIC_PREFIX, self.element_id)
    }
}

/// A credential the page failed to provide.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("csrf-token meta tag missing or empty")]
    CsrfMissing,
    #[error("data-phx-session missing on mount element")]
    SessionMissing,
    #[error("data-phx-static missing on mount element")]
    StaticMissing,
    #[error("mount element has no id")]
    ElementIdMissing,
}

impl CredentialError {
    pub fn outcome(&self) -> HandshakeOutcome {
        match self {
            Self::CsrfMissing => HandshakeOutcome::CsrfMissing,
            Self::SessionMissing => HandshakeOutcome::SessionMissing,
            Self::StaticMissing => HandshakeOutcome::StaticMissing,
            Self::ElementIdMissing => HandshakeOutcome::ElementIdMissing,
        }
    }
}

/// Per-field result of scraping a page.
///
/// Every field is reported separately so each can be recorded as its own check.
/// Empty attribute values count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialReport {
    pub csrf_token: Option<String>,
    pub session: Option<String>,
    pub static_data: Option<String>,
    pub element_id: Option<String>,
}

impl CredentialReport {
    /// Named checks for each field, in extraction order
    pub fn checks(&self) -> [(&'static str, bool); 4] {
        [
            ("csrf token present", self.csrf_token.is_some()),
            ("session present", self.session.is_some()),
            ("static present", self.static_data.is_some()),
            ("element id present", self.element_id.is_some()),
        ]
    }

    /// Every missing field, in extraction order
    pub fn missing(&self) -> Vec<CredentialError> {
        let mut missing = Vec::new();
        if self.csrf_token.is_none() {
            missing.push(CredentialError::CsrfMissing);
        }
        if self.session.is_none() {
            missing.push(CredentialError::SessionMissing);
        }
        if self.static_data.is_none() {
            missing.push(CredentialError::StaticMissing);
        }
        if self.element_id.is_none() {
            missing.push(CredentialError::ElementIdMissing);
        }
        missing
    }

    /// Fails with the first missing field.
    pub fn into_credentials(self) -> Result<HandshakeCredentials, CredentialError> {
        Ok(HandshakeCredentials {
            csrf_token: self.csrf_token.ok_or(CredentialError::CsrfMissing)?,
            session: self.session.ok_or(CredentialError::SessionMissing)?,
            static_data: self.static_data.ok_or(CredentialError::StaticMissing)?,
            element_id: self.element_id.ok_or(CredentialError::ElementIdMissing)?,
        })
    }
}

/// Scrapes the csrf token and the mount element's attributes from a page.
pub fn extract(html: &str) -> CredentialReport {
    let mut report = CredentialReport::default();
    let mut main_mount: Option<HashMap<String, String>> = None;
    let mut first_mount: Option<HashMap<String, String>> = None;

    for tag in START_TAG.captures_iter(html) {
        let name = tag[1].to_ascii_lowercase();
        let attributes = parse_attributes(&tag[2]);

        if name == "meta" && report.csrf_token.is_none() {
            if attributes.get("name").map(String::as_str) == Some("csrf-token") {
                report.csrf_token = non_empty(attributes.get("content"));
            }
            continue;
        }

        if main_mount.is_none() && attributes.contains_key("data-phx-main") {
            main_mount = Some(attributes);
        } else if first_mount.is_none() && attributes.contains_key("data-phx-session") {
            first_mount = Some(attributes);
        }
    }

    if let Some(mount) = main_mount.or(first_mount) {
        report.session = non_empty(mount.get("data-phx-session"));
        report.static_data = non_empty(mount.get("data-phx-static"));
        report.element_id = non_empty(mount.get("id"));
    }

    tracing::debug!(
        "Extracted credentials: csrf={} session={} static={} id={:?}",
        report.csrf_token.is_some(),
        report.session.is_some(),
        report.static_data.is_some(),
        report.element_id
    );

    report
}

/// Scrapes a page and requires every credential to be present.
pub fn extract_credentials(html: &str) -> Result<HandshakeCredentials, CredentialError> {
    extract(html).into_credentials()
}

fn parse_attributes(source: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(source)
        .map(|attr| {
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (attr[1].to_ascii_lowercase(), value)
        })
        .collect()
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8"/>
    <meta name="csrf-token" content="abc123"/>
    <title>Profile Settings</title>
  </head>
  <body>
    <div data-phx-main="true" data-phx-session="S1" data-phx-static="ST1" id="phx-42" class="contents">
      <h1>Profile Settings</h1>
    </div>
  </body>
</html>"#;

    #[test]
    fn test_extracts_all_fields_verbatim() {
        let credentials = extract_credentials(PAGE).unwrap();
        assert_eq!(
            credentials,
            HandshakeCredentials {
                csrf_token: "abc123".to_string(),
                session: "S1".to_string(),
                static_data: "ST1".to_string(),
                element_id: "phx-42".to_string(),
            }
        );
        assert_eq!(credentials.topic(), "lv:phx-42");
    }

    #[test]
    fn test_attribute_order_and_quoting_do_not_matter() {
        let html = r#"<meta content='tok' name='csrf-token'>
            <main id=phx-F1 data-phx-static="SFMyNTY.g2gD" data-phx-session="SFMyNTY.abc-_=" data-phx-main></main>"#;
        let credentials = extract_credentials(html).unwrap();
        assert_eq!(credentials.csrf_token, "tok");
        assert_eq!(credentials.session, "SFMyNTY.abc-_=");
        assert_eq!(credentials.static_data, "SFMyNTY.g2gD");
        assert_eq!(credentials.element_id, "phx-F1");
    }

    #[test]
    fn test_main_mount_wins_over_nested_views() {
        let html = r#"<meta name="csrf-token" content="abc123">
            <div data-phx-session="CHILD" data-phx-static="CS" id="phx-child"></div>
            <div data-phx-main data-phx-session="MAIN" data-phx-static="MS" id="phx-main"></div>"#;
        let credentials = extract_credentials(html).unwrap();
        assert_eq!(credentials.session, "MAIN");
        assert_eq!(credentials.element_id, "phx-main");
    }

    #[test]
    fn test_falls_back_to_first_session_element() {
        let html = r#"<meta name="csrf-token" content="abc123">
            <div data-phx-session="S1" data-phx-static="ST1" id="phx-1"></div>"#;
        assert_eq!(extract_credentials(html).unwrap().element_id, "phx-1");
    }

    #[test]
    fn test_missing_csrf_reported_alone() {
        let html = PAGE.replace(r#"<meta name="csrf-token" content="abc123"/>"#, "");
        let report = extract(&html);
        assert_eq!(report.missing(), vec![CredentialError::CsrfMissing]);
        assert_eq!(
            report.into_credentials(),
            Err(CredentialError::CsrfMissing)
        );
    }

    #[test]
    fn test_empty_csrf_counts_as_missing() {
        let html = PAGE.replace(r#"content="abc123""#, r#"content="""#);
        assert_eq!(extract(&html).missing(), vec![CredentialError::CsrfMissing]);
    }

    #[test]
    fn test_missing_session_reported_alone() {
        let html = PAGE.replace(r#"data-phx-session="S1""#, "");
        let report = extract(&html);
        assert_eq!(report.missing(), vec![CredentialError::SessionMissing]);
        assert_eq!(
            extract_credentials(&html),
            Err(CredentialError::SessionMissing)
        );
    }

    #[test]
    fn test_missing_static_reported_alone() {
        let html = PAGE.replace(r#"data-phx-static="ST1""#, "");
        let report = extract(&html);
        assert_eq!(report.missing(), vec![CredentialError::StaticMissing]);
        assert_eq!(
            extract_credentials(&html),
            Err(CredentialError::StaticMissing)
        );
    }

    #[test]
    fn test_missing_id_reported_alone() {
        let html = PAGE.replace(r#"id="phx-42""#, "");
        assert_eq!(
            extract(&html).missing(),
            vec![CredentialError::ElementIdMissing]
        );
    }

    #[test]
    fn test_plain_page_misses_everything() {
        let report = extract("<html><body><h1>Artist</h1></body></html>");
        assert_eq!(report.missing().len(), 4);
        assert!(report.checks().iter().all(|(_, passed)| !passed));
    }

    #[test]
    fn test_checks_are_individually_named() {
        let html = PAGE.replace(r#"data-phx-static="ST1""#, "");
        let checks = extract(&html).checks();
        assert_eq!(checks[0], ("csrf token present", true));
        assert_eq!(checks[1], ("session present", true));
        assert_eq!(checks[2], ("static present", false));
        assert_eq!(checks[3], ("element id present", true));
    }

    #[test]
    fn test_credential_error_outcomes() {
        assert_eq!(
            CredentialError::CsrfMissing.outcome(),
            HandshakeOutcome::CsrfMissing
        );
        assert_eq!(
            CredentialError::StaticMissing.outcome(),
            HandshakeOutcome::StaticMissing
        );
    }
}
