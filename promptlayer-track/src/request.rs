use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// A finished provider call, as posted to `/track-request`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TrackRequest {
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
    pub request_response: Value,
    pub request_start_time: DateTime<Utc>,
    pub request_end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_input_variables: Option<Value>,
    pub return_pl_id: bool,
}

impl TrackRequest {
    /// Starts a record for a call issued now; the response and end time are
    /// filled in by [`TrackRequest::with_response`].
    pub fn new(function_name: impl Into<String>, kwargs: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            function_name: function_name.into(),
            provider_type: None,
            args: Vec::new(),
            kwargs,
            request_response: Value::Null,
            request_start_time: now,
            request_end_time: now,
            tags: Vec::new(),
            metadata: BTreeMap::new(),
            prompt_id: None,
            prompt_version: None,
            prompt_input_variables: None,
            return_pl_id: false,
        }
    }

    pub fn with_provider(mut self, provider_type: impl Into<String>) -> Self {
        self.provider_type = Some(provider_type.into());
        self
    }

    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.request_start_time = start;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_return_pl_id(mut self, return_pl_id: bool) -> Self {
        self.return_pl_id = return_pl_id;
        self
    }

    /// Records the provider response and stamps the end time.
    pub fn with_response(mut self, response: Value) -> Self {
        self.request_response = response;
        self.request_end_time = Utc::now();
        self
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TrackMetadata {
    pub request_id: u64,
    pub metadata: BTreeMap<String, String>,
}

/// Score in the range 0 to 100.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TrackScore {
    pub request_id: u64,
    pub score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TrackPrompt {
    pub request_id: u64,
    pub prompt_name: String,
    pub prompt_input_variables: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TrackGroup {
    pub request_id: u64,
    pub group_id: u64,
}
