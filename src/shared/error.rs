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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, FabricError>;

#[derive(Error, Debug)]
pub enum FabricError {
    #[error("Kubernetes API error: {0}")]
    KubeApi(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Resource not found: {resource_type} '{name}'")]
    NotFound { resource_type: String, name: String },

    #[error("Conflict: {resource_type} '{name}' already exists. {hint}")]
    Conflict {
        resource_type: String,
        name: String,
        hint: String,
    },

    #[error("Timed out {0}")]
    Timeout(String),

    #[error("{kind} '{name}' reported error state: {reason}")]
    ResourceErrorState {
        kind: String,
        name: String,
        reason: String,
    },

    #[error("no pods found for DaemonSet '{daemon_set}' in namespace '{namespace}'")]
    NoAgents {
        daemon_set: String,
        namespace: String,
    },

    #[error("pod '{pod}' from DaemonSet '{daemon_set}' is not ready")]
    AgentNotReady { pod: String, daemon_set: String },

    #[error("no applicable profile found:\n{}", .reasons.join("\n"))]
    NoApplicableProfile { reasons: Vec<String> },

    #[error("failed to apply {kind} '{name}': {message}")]
    Apply {
        kind: String,
        name: String,
        message: String,
    },

    #[error("apply of {kind} '{name}' failed after {attempts} attempts: {message}")]
    TransientApply {
        kind: String,
        name: String,
        attempts: u32,
        message: String,
    },

    #[error("found {0} foundation manifests in the deployment set; only one is allowed")]
    MultipleFoundationManifests(usize),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::Error> for FabricError {
    fn from(err: kube::Error) -> Self {
        FabricError::KubeApi(err.to_string())
    }
}

impl FabricError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn not_found(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    pub fn conflict(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            resource_type: resource_type.into(),
            name: name.into(),
            hint: hint.into(),
        }
    }

    pub fn error_state(
        kind: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ResourceErrorState {
            kind: kind.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }
}
