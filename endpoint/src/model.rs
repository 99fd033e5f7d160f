use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored temperature reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TemperatureReading {
    pub temperature: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Body of a write request. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct WriteRequest {
    #[serde(default)]
    pub secret: Option<serde_json::Value>,
    #[serde(default)]
    pub temperature: Option<serde_json::Value>,
}
