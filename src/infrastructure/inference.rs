// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! LLM-assisted intent inference.
//!
//! The workflow treats inference as a black box turning a user prompt plus
//! the discovered capability model into an intent-field map with a confidence
//! label. The default implementation talks to any OpenAI-compatible
//! chat-completions endpoint.

use crate::domain::config::ClusterConfig;
use crate::shared::error::{FabricError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SYSTEM_PROMPT: &str = "You are selecting a network fabric deployment profile for a \
Kubernetes cluster. Based on the cluster capabilities JSON and the user's request, reply with \
a single JSON object and nothing else. Fields: \"fabric\" (\"ethernet\" or \"infiniband\"), \
\"deploymentType\" (\"sriov\", \"hostdevice\", \"rdma-shared\", \"ipoib\" or \"macvlan\"), \
\"multirail\" (\"true\"/\"false\"), \"spectrumX\" (\"true\"/\"false\"), \"ai\" \
(\"true\"/\"false\"), \"confidence\" (\"high\", \"medium\" or \"low\") and \"reasoning\" \
(one sentence). Use \"low\" confidence whenever the request does not determine the fields.";

/// Result of one inference call. `fields` is the raw field map; the
/// confidence label is surfaced separately because the workflow refuses to
/// proceed on `low`.
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    pub fields: HashMap<String, String>,
    pub confidence: String,
    pub reasoning: String,
}

#[async_trait::async_trait]
pub trait IntentInference: Send + Sync {
    async fn infer(&self, prompt: &str, capabilities: &ClusterConfig) -> Result<InferenceOutcome>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

pub struct OpenAiInference {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiInference {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait::async_trait]
impl IntentInference for OpenAiInference {
    async fn infer(&self, prompt: &str, capabilities: &ClusterConfig) -> Result<InferenceOutcome> {
        let capabilities_json = serde_json::to_string(capabilities)?;
        let system = format!("{}\n{}", SYSTEM_PROMPT, capabilities_json);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system,
                },
                Message {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.5,
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let mut req = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req
            .send()
            .await
            .map_err(|e| FabricError::Inference(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FabricError::Inference(format!(
                "chat completion request failed with status {}: {}",
                status, body
            )));
        }

        let response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| FabricError::Inference(e.to_string()))?;

        let content = response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| FabricError::Inference("response carries no choices".to_string()))?;

        parse_outcome(content)
    }
}

/// Parse the model's reply as a flat string map.
fn parse_outcome(content: &str) -> Result<InferenceOutcome> {
    let fields: HashMap<String, String> = serde_json::from_str(content).map_err(|e| {
        FabricError::Inference(format!("response is not a flat JSON object: {}", e))
    })?;

    let confidence = fields.get("confidence").cloned().unwrap_or_default();
    let reasoning = fields.get("reasoning").cloned().unwrap_or_default();

    Ok(InferenceOutcome {
        fields,
        confidence,
        reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_field_map() {
        let outcome = parse_outcome(
            r#"{"fabric":"infiniband","deploymentType":"hostdevice","multirail":"false","confidence":"high","reasoning":"IB fabric with RDMA-capable nodes"}"#,
        )
        .unwrap();

        assert_eq!(outcome.confidence, "high");
        assert_eq!(
            outcome.fields.get("deploymentType").map(String::as_str),
            Some("hostdevice")
        );
        assert!(outcome.reasoning.contains("IB fabric"));
    }

    #[test]
    fn non_json_reply_is_an_inference_error() {
        let err = parse_outcome("I think you should use SR-IOV").unwrap_err();
        assert!(matches!(err, FabricError::Inference(_)));
    }
}
