//! Typed decoding of the storage node's `/v1/health` response.
//!
//! The health document is decoded as a unit: a missing key or a value of the
//! wrong type rejects the whole response, so the dashboard never shows a
//! shard summary assembled from two different responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a health response does not have the expected shape.
#[derive(Debug, Error)]
pub enum HealthDecodeError {
    #[error("malformed health response: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Decoded node health, one per successful health fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub node_status: String,
    pub epoch: u64,
    pub shards: ShardSummary,
}

/// Shard counts by ownership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShardSummary {
    pub owned: u64,
    pub ready: u64,
    pub in_transfer: u64,
    pub in_recovery: u64,
    pub unknown: u64,
}

impl HealthSnapshot {
    /// Decode a health response document.
    pub fn from_document(document: serde_json::Value) -> Result<Self, HealthDecodeError> {
        let response: HealthResponse = serde_json::from_value(document)?;
        Ok(response.into())
    }

    /// Decode a health response from its JSON text.
    pub fn parse(content: &str) -> Result<Self, HealthDecodeError> {
        let response: HealthResponse = serde_json::from_str(content)?;
        Ok(response.into())
    }

    /// Whether the node reports itself as active.
    pub fn is_active(&self) -> bool {
        self.node_status == "Active"
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    success: HealthSuccess,
}

#[derive(Debug, Deserialize)]
struct HealthSuccess {
    data: HealthData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthData {
    node_status: String,
    epoch: u64,
    shard_summary: RawShardSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShardSummary {
    owned: u64,
    owned_shard_status: OwnedShardStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedShardStatus {
    ready: u64,
    in_transfer: u64,
    in_recovery: u64,
    unknown: u64,
}

impl From<HealthResponse> for HealthSnapshot {
    fn from(response: HealthResponse) -> Self {
        let data = response.success.data;
        let status = data.shard_summary.owned_shard_status;
        Self {
            node_status: data.node_status,
            epoch: data.epoch,
            shards: ShardSummary {
                owned: data.shard_summary.owned,
                ready: status.ready,
                in_transfer: status.in_transfer,
                in_recovery: status.in_recovery,
                unknown: status.unknown,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "success": {
                "code": 200,
                "data": {
                    "uptime": { "secs": 90125, "nanos": 0 },
                    "nodeStatus": "Active",
                    "epoch": 42,
                    "publicKey": "abc",
                    "shardSummary": {
                        "owned": 10,
                        "ownedShardStatus": {
                            "ready": 7,
                            "inTransfer": 1,
                            "inRecovery": 1,
                            "unknown": 1
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_decode_health() {
        let health = HealthSnapshot::from_document(sample()).unwrap();
        assert_eq!(health.node_status, "Active");
        assert!(health.is_active());
        assert_eq!(health.epoch, 42);
        assert_eq!(
            health.shards,
            ShardSummary {
                owned: 10,
                ready: 7,
                in_transfer: 1,
                in_recovery: 1,
                unknown: 1,
            }
        );
    }

    #[test]
    fn test_missing_unknown_rejects_document() {
        let mut doc = sample();
        doc["success"]["data"]["shardSummary"]["ownedShardStatus"]
            .as_object_mut()
            .unwrap()
            .remove("unknown");

        let err = HealthSnapshot::from_document(doc).unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_wrong_type_rejects_document() {
        let mut doc = sample();
        doc["success"]["data"]["epoch"] = json!("forty-two");
        assert!(HealthSnapshot::from_document(doc).is_err());
    }

    #[test]
    fn test_error_envelope_rejects_document() {
        let doc = json!({ "error": { "status": "UNAVAILABLE", "code": 503 } });
        assert!(HealthSnapshot::from_document(doc).is_err());
    }

    #[test]
    fn test_parse_from_text() {
        let text = serde_json::to_string(&sample()).unwrap();
        let health = HealthSnapshot::parse(&text).unwrap();
        assert_eq!(health.shards.owned, 10);
        assert!(HealthSnapshot::parse("not json").is_err());
    }

    #[test]
    fn test_inactive_status() {
        let mut doc = sample();
        doc["success"]["data"]["nodeStatus"] = json!("RecoveryCatchUp");
        let health = HealthSnapshot::from_document(doc).unwrap();
        assert!(!health.is_active());
    }
}
