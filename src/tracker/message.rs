//! Request/response messages between the panel and the tracker

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::network::NetworkStats;
use crate::browser::TabId;
use crate::error::Result;

/// `{"action": "getNetworkStats"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TrackerRequest {
    GetNetworkStats,
}

/// `{"stats": {"<tabId>": NetworkStats}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub stats: BTreeMap<TabId, NetworkStats>,
}

/// One-shot query channel to the tracker. There is no subscription; the
/// panel asks again to see newer numbers.
pub trait TrackerChannel {
    fn send(&self, request: TrackerRequest) -> Result<StatsResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let value = serde_json::to_value(TrackerRequest::GetNetworkStats).unwrap();
        assert_eq!(value, json!({"action": "getNetworkStats"}));
    }

    #[test]
    fn test_response_wire_shape() {
        let mut response = StatsResponse::default();
        response.stats.insert(
            4,
            NetworkStats {
                request_count: 2,
                bytes_received: 10,
                last_activity_at: None,
                first_activity_at: None,
            },
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["stats"]["4"]["requestCount"], 2);
        assert_eq!(value["stats"]["4"]["lastActivityAt"], serde_json::Value::Null);

        let back: StatsResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back, response);
    }
}
