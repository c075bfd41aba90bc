use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PromptBlueprint;

/// One record of a tracked stream.
///
/// Progress records carry the raw provider event and the blueprint fragment
/// it implies. The closing record carries the backend request id, or, when
/// tracking failed leniently, no blueprint and the aggregated response.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct StreamingYield {
    pub request_id: Option<u64>,
    pub raw_response: Option<Value>,
    pub prompt_blueprint: Option<PromptBlueprint>,
}

impl StreamingYield {
    pub fn progress(event: Value, prompt_blueprint: Option<PromptBlueprint>) -> Self {
        Self {
            request_id: None,
            raw_response: Some(event),
            prompt_blueprint,
        }
    }

    pub fn is_final(&self) -> bool {
        self.request_id.is_some() || self.prompt_blueprint.is_none()
    }
}

/// Successful reply from the request-tracking endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TrackResponse {
    pub request_id: u64,
    #[serde(default)]
    pub prompt_blueprint: Option<PromptBlueprint>,
}
