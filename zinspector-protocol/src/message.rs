//! Request payload types.

use serde::{Deserialize, Serialize};

/// Name of the server-statistics query.
pub const STATS_QUERY: &str = "zabbix.stats";

/// Outbound request payload: `{"request": "<query>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRequest {
    pub request: String,
}

impl StatsRequest {
    /// The fixed "get server statistics" request.
    pub fn server_stats() -> Self {
        Self {
            request: STATS_QUERY.to_string(),
        }
    }
}
