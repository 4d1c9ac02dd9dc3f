//! Alert types: Alert, Message, MessageEntry, MessageResponse
//!
//! Field names follow the Alertmanager webhook schema so payloads decode
//! without translation.
//! See <https://prometheus.io/docs/alerting/latest/configuration/#webhook_config>

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label or annotation set.
pub type LabelSet = BTreeMap<String, String>;

/// `0001-01-01T00:00:00Z`, the timestamp Alertmanager sends for an unset end time.
pub fn zero_time() -> DateTime<FixedOffset> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
        .unwrap_or_default()
}

/// Alertmanager serializes a nil map as `null`.
fn nullable_map<'de, D>(deserializer: D) -> Result<LabelSet, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LabelSet>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Alert
// ============================================================================

/// A single alert as delivered by Alertmanager and as stored in history.
///
/// Timestamps keep the offset they were received with, so a stored alert
/// serializes back byte-for-byte identical to what was posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// `firing`, `pending` or `resolved`
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "nullable_map")]
    pub labels: LabelSet,
    #[serde(default, deserialize_with = "nullable_map")]
    pub annotations: LabelSet,
    #[serde(default = "zero_time")]
    pub starts_at: DateTime<FixedOffset>,
    /// Zero value while the alert is still active
    #[serde(default = "zero_time")]
    pub ends_at: DateTime<FixedOffset>,
    #[serde(default, rename = "generatorURL")]
    pub generator_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fingerprint: String,
}

impl Default for Alert {
    fn default() -> Self {
        Self {
            status: String::new(),
            labels: LabelSet::new(),
            annotations: LabelSet::new(),
            starts_at: zero_time(),
            ends_at: zero_time(),
            generator_url: String::new(),
            fingerprint: String::new(),
        }
    }
}

impl Alert {
    pub fn is_firing(&self) -> bool {
        self.status.eq_ignore_ascii_case("firing")
    }

    /// True when `endsAt` carries a real timestamp.
    pub fn has_ended(&self) -> bool {
        self.ends_at != zero_time()
    }
}

// ============================================================================
// Notification payload
// ============================================================================

/// The POST body Alertmanager sends to a webhook receiver.
///
/// Only `alerts` outlives the request; the rest of the payload is used to
/// render the storage identifier and then dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub group_key: String,
    #[serde(default)]
    pub truncated_alerts: u64,
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub group_labels: LabelSet,
    #[serde(default, deserialize_with = "nullable_map")]
    pub common_labels: LabelSet,
    #[serde(default, deserialize_with = "nullable_map")]
    pub common_annotations: LabelSet,
    #[serde(default, rename = "externalURL")]
    pub external_url: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

// ============================================================================
// History
// ============================================================================

/// One identifier and the alerts stored under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub id: String,
    pub alerts: Vec<Alert>,
}

/// Returned to Alertmanager after a webhook has been recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: String,
}
