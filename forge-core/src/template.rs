//! Build command templates
//!
//! Two kinds of template are rendered into shell command lines:
//!
//! - Transport templates contain configuration entry names as literal
//!   placeholders. Each entry, in configuration order, replaces every
//!   occurrence of its name with the base64 encoding of its value. Later
//!   entries operate on the output of earlier ones.
//! - Format templates contain the fixed placeholders listed in
//!   [`FORMAT_PLACEHOLDERS`], replaced in a single left-to-right pass so that
//!   substituted values are never scanned again.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::agent::TransportConfigEntry;

pub const PAYLOAD_NAME: &str = "PAYLOADNAME";
pub const PAYLOAD_KEY: &str = "PAYLOADKEY";
pub const TRANSPORT: &str = "TRANSPORT";
pub const BEACON_INTERVAL: &str = "BEACONINTERVAL";
pub const JITTER: &str = "JITTER";
pub const EXPIRATION: &str = "EXPIRATION";

/// Placeholders understood by format templates
pub const FORMAT_PLACEHOLDERS: [&str; 6] = [
    PAYLOAD_NAME,
    PAYLOAD_KEY,
    TRANSPORT,
    BEACON_INTERVAL,
    JITTER,
    EXPIRATION,
];

/// Values substituted into a format template
#[derive(Debug, Clone, PartialEq)]
pub struct FormatValues {
    pub payload_name: String,
    pub payload_key: String,
    /// Base64 encoding of the built transport module
    pub transport: String,
    pub beacon_interval: u32,
    pub jitter: f64,
    pub expiration: Option<DateTime<Utc>>,
}

impl FormatValues {
    fn value_for(&self, placeholder: &str) -> String {
        match placeholder {
            PAYLOAD_NAME => self.payload_name.clone(),
            PAYLOAD_KEY => self.payload_key.clone(),
            TRANSPORT => self.transport.clone(),
            BEACON_INTERVAL => self.beacon_interval.to_string(),
            JITTER => self.jitter.to_string(),
            EXPIRATION => self
                .expiration
                .map(format_expiration)
                .unwrap_or_default(),
            _ => String::new(),
        }
    }
}

/// Formats an expiration timestamp as ISO-8601, e.g. `2025-01-01T00:00:00Z`
pub fn format_expiration(expiration: DateTime<Utc>) -> String {
    expiration.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Standard base64 of the given bytes
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Renders a transport build command
pub fn render_transport(template: &str, entries: &[TransportConfigEntry]) -> String {
    entries
        .iter()
        .filter(|entry| !entry.name.is_empty())
        .fold(template.to_string(), |command, entry| {
            command.replace(&entry.name, &encode(entry.value.as_bytes()))
        })
}

/// Renders a format (agent) build command
pub fn render_format(template: &str, values: &FormatValues) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while !rest.is_empty() {
        let next = FORMAT_PLACEHOLDERS
            .iter()
            .filter_map(|p| rest.find(p).map(|idx| (idx, *p)))
            .min_by_key(|(idx, _)| *idx);

        match next {
            Some((idx, placeholder)) => {
                rendered.push_str(&rest[..idx]);
                rendered.push_str(&values.value_for(placeholder));
                rest = &rest[idx + placeholder.len()..];
            }
            None => {
                rendered.push_str(rest);
                break;
            }
        }
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn values(expiration: Option<DateTime<Utc>>) -> FormatValues {
        FormatValues {
            payload_name: "beacon1".to_string(),
            payload_key: "K".repeat(32),
            transport: "VFJBTlM=".to_string(),
            beacon_interval: 60,
            jitter: 10.0,
            expiration,
        }
    }

    #[test]
    fn test_render_transport_scenario() {
        let entries = vec![TransportConfigEntry::new("ENCKEY", "secret")];
        assert_eq!(
            render_transport("build.sh --enc ENCKEY", &entries),
            "build.sh --enc c2VjcmV0"
        );
    }

    #[test]
    fn test_render_transport_replaces_every_occurrence() {
        let entries = vec![TransportConfigEntry::new("URL", "http://c2:80")];
        assert_eq!(
            render_transport("a URL b URL", &entries),
            "a aHR0cDovL2MyOjgw b aHR0cDovL2MyOjgw"
        );
    }

    #[test]
    fn test_render_transport_is_literal_not_regex() {
        let entries = vec![TransportConfigEntry::new("A.B", "x")];
        assert_eq!(render_transport("AxB A.B", &entries), "AxB eA==");
    }

    #[test]
    fn test_render_transport_order_is_observable() {
        // "c2VjcmV0" contains "V0", which the second entry then rewrites.
        let forward = vec![
            TransportConfigEntry::new("ENCKEY", "secret"),
            TransportConfigEntry::new("V0", "z"),
        ];
        let reverse: Vec<_> = forward.iter().cloned().rev().collect();

        assert_eq!(render_transport("ENCKEY", &forward), "c2Vjcmeg==");
        assert_eq!(render_transport("ENCKEY", &reverse), "c2VjcmV0");
    }

    #[test]
    fn test_render_transport_deterministic() {
        let entries = vec![
            TransportConfigEntry::new("HOST", "example.org"),
            TransportConfigEntry::new("PORT", "443"),
        ];
        let template = "go build -ldflags \"-X main.host=HOST -X main.port=PORT\"";

        let first = render_transport(template, &entries);
        let second = render_transport(template, &entries);
        assert_eq!(first, second);
        assert!(first.contains(&encode("example.org")));
        assert!(first.contains(&encode("443")));
        assert!(!first.contains("HOST"));
    }

    #[test]
    fn test_render_transport_skips_empty_names() {
        let entries = vec![TransportConfigEntry::new("", "x")];
        assert_eq!(render_transport("abc", &entries), "abc");
    }

    #[test]
    fn test_render_format_all_placeholders() {
        let template =
            "make NAME=PAYLOADNAME KEY=PAYLOADKEY T=TRANSPORT B=BEACONINTERVAL J=JITTER E=EXPIRATION";
        let rendered = render_format(template, &values(None));

        assert_eq!(
            rendered,
            format!(
                "make NAME=beacon1 KEY={} T=VFJBTlM= B=60 J=10 E=",
                "K".repeat(32)
            )
        );
    }

    #[test]
    fn test_render_format_removes_expiration_when_absent() {
        let rendered = render_format("build --exp \"EXPIRATION\" --j JITTER", &values(None));

        assert!(!rendered.contains(EXPIRATION));
        assert_eq!(rendered, "build --exp \"\" --j 10");
    }

    #[test]
    fn test_render_format_expiration_iso8601() {
        let expiration = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let rendered = render_format("build --exp EXPIRATION", &values(Some(expiration)));

        assert_eq!(rendered, "build --exp 2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_render_format_missing_placeholders_is_noop() {
        assert_eq!(render_format("make all", &values(None)), "make all");
        assert_eq!(render_format("", &values(None)), "");
    }

    #[test]
    fn test_render_format_does_not_rescan_values() {
        let mut v = values(None);
        v.transport = "xJITTERx".to_string();

        assert_eq!(render_format("TRANSPORT JITTER", &v), "xJITTERx 10");
    }

    #[test]
    fn test_render_format_fractional_jitter() {
        let mut v = values(None);
        v.jitter = 0.25;
        assert_eq!(render_format("JITTER", &v), "0.25");
    }
}
