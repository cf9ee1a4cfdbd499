//! Alert record handed between rule evaluation and the alerting engine.
//!
//! Rules only produce a number; building and transitioning alerts is the
//! job of the surrounding pipeline. The types live here so both sides agree
//! on the status vocabulary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of an alert.
///
/// The serialized names are the wire names used by the rest of the
/// monitoring stack (`ACTIVE`, `ACK-WIP`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AlertStatus {
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
    #[serde(rename = "ACTIVE")]
    Active,
    /// Acknowledged, work in progress.
    #[serde(rename = "ACK-WIP")]
    AckWip,
    #[serde(rename = "ACK-PAUSE")]
    AckPause,
    #[serde(rename = "ACK-IGNORE")]
    AckIgnore,
    #[serde(rename = "ACK-SILENCE")]
    AckSilence,
    #[serde(rename = "RESOLVED")]
    Resolved,
}

impl AlertStatus {
    pub const ALL: [AlertStatus; 7] = [
        AlertStatus::Unknown,
        AlertStatus::Active,
        AlertStatus::AckWip,
        AlertStatus::AckPause,
        AlertStatus::AckIgnore,
        AlertStatus::AckSilence,
        AlertStatus::Resolved,
    ];

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Unknown => "UNKNOWN",
            AlertStatus::Active => "ACTIVE",
            AlertStatus::AckWip => "ACK-WIP",
            AlertStatus::AckPause => "ACK-PAUSE",
            AlertStatus::AckIgnore => "ACK-IGNORE",
            AlertStatus::AckSilence => "ACK-SILENCE",
            AlertStatus::Resolved => "RESOLVED",
        }
    }

    /// Check whether `status` is one of the wire names (case-sensitive).
    pub fn is_known(status: &str) -> bool {
        status.parse::<AlertStatus>().is_ok()
    }

    /// True for any of the acknowledgment sub-states.
    pub fn is_acknowledged(&self) -> bool {
        matches!(
            self,
            AlertStatus::AckWip
                | AlertStatus::AckPause
                | AlertStatus::AckIgnore
                | AlertStatus::AckSilence
        )
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}

/// A single alert instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PureAlert {
    pub status: AlertStatus,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    pub description: String,
    /// Identifier of the monitored element the alert is about.
    pub element: String,
    #[serde(default)]
    pub severity: String,
    /// Recommended actions, in the order they should be tried.
    #[serde(default)]
    pub actions: Vec<String>,
}

impl PureAlert {
    pub fn new(
        status: AlertStatus,
        timestamp: i64,
        description: impl Into<String>,
        element: impl Into<String>,
    ) -> Self {
        Self {
            status,
            timestamp,
            description: description.into(),
            element: element.into(),
            severity: String::new(),
            actions: Vec::new(),
        }
    }

    pub fn with_details(
        status: AlertStatus,
        timestamp: i64,
        description: impl Into<String>,
        element: impl Into<String>,
        severity: impl Into<String>,
        actions: Vec<String>,
    ) -> Self {
        Self {
            severity: severity.into(),
            actions,
            ..Self::new(status, timestamp, description, element)
        }
    }

    /// Timestamp as a UTC datetime, `None` if it is out of range.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

impl fmt::Display for PureAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = self
            .occurred_at()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| self.timestamp.to_string());
        write!(
            f,
            "[{}] {} element={} severity={} description={:?}",
            self.status,
            when,
            self.element,
            if self.severity.is_empty() { "-" } else { self.severity.as_str() },
            self.description,
        )?;
        if !self.actions.is_empty() {
            write!(f, " actions=[{}]", self.actions.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_names() {
        for status in AlertStatus::ALL {
            assert_eq!(status.as_str().parse::<AlertStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_strings_are_rejected() {
        assert!(AlertStatus::is_known("ACK-SILENCE"));
        assert!(!AlertStatus::is_known("ack-silence"));
        assert!(!AlertStatus::is_known("FIRING"));
        assert_eq!(
            "FIRING".parse::<AlertStatus>(),
            Err(CoreError::UnknownStatus("FIRING".to_string()))
        );
    }

    #[test]
    fn acknowledged_covers_four_sub_states() {
        let acked = AlertStatus::ALL
            .iter()
            .filter(|s| s.is_acknowledged())
            .count();
        assert_eq!(acked, 4);
        assert!(!AlertStatus::Active.is_acknowledged());
    }

    #[test]
    fn status_serializes_as_wire_name() {
        let json = serde_json::to_string(&AlertStatus::AckPause).unwrap();
        assert_eq!(json, "\"ACK-PAUSE\"");
    }

    #[test]
    fn default_alert_is_unknown_at_epoch() {
        let alert = PureAlert::default();
        assert_eq!(alert.status, AlertStatus::Unknown);
        assert_eq!(alert.timestamp, 0);
        assert!(alert.actions.is_empty());
    }

    #[test]
    fn display_includes_status_element_and_actions() {
        let alert = PureAlert::with_details(
            AlertStatus::Active,
            1_700_000_000,
            "UPS on battery",
            "ups-01",
            "critical",
            vec!["check mains".to_string(), "call on-duty".to_string()],
        );
        let line = alert.to_string();
        assert!(line.starts_with("[ACTIVE] 2023-11-14T22:13:20+00:00"));
        assert!(line.contains("element=ups-01"));
        assert!(line.contains("severity=critical"));
        assert!(line.ends_with("actions=[check mains, call on-duty]"));
    }
}
