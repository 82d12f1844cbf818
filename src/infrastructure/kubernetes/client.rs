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

use crate::domain::deploy::manifest::Manifest;
use crate::infrastructure::constants::{
    DEVICE_KIND, DEVICE_PLURAL, FABRIC_API_GROUP, FABRIC_API_VERSION, FIELD_MANAGER,
    FOUNDATION_KIND, FOUNDATION_PLURAL,
};
use crate::shared::error::FabricError;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::core::GroupVersionKind;
use kube::discovery::{ApiResource, Scope};
use kube::{Api, Client};

/// ApiResource for the cluster-scoped foundation policy kind.
pub fn foundation_resource() -> ApiResource {
    ApiResource {
        group: FABRIC_API_GROUP.to_string(),
        version: FABRIC_API_VERSION.to_string(),
        api_version: format!("{}/{}", FABRIC_API_GROUP, FABRIC_API_VERSION),
        kind: FOUNDATION_KIND.to_string(),
        plural: FOUNDATION_PLURAL.to_string(),
    }
}

/// ApiResource for the namespaced device inventory kind.
pub fn device_resource() -> ApiResource {
    ApiResource {
        group: FABRIC_API_GROUP.to_string(),
        version: FABRIC_API_VERSION.to_string(),
        api_version: format!("{}/{}", FABRIC_API_GROUP, FABRIC_API_VERSION),
        kind: DEVICE_KIND.to_string(),
        plural: DEVICE_PLURAL.to_string(),
    }
}

#[async_trait::async_trait]
pub trait FabricKubeClient: Send + Sync {
    async fn create_policy(&self, policy: &DynamicObject) -> Result<(), FabricError>;

    async fn get_policy(&self, name: &str) -> Result<DynamicObject, FabricError>;

    async fn list_policies(&self) -> Result<Vec<DynamicObject>, FabricError>;

    /// Delete a policy by name. A NotFound response counts as success.
    async fn delete_policy(&self, name: &str) -> Result<(), FabricError>;

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, FabricError>;

    async fn list_devices(&self, namespace: &str) -> Result<Vec<DynamicObject>, FabricError>;

    /// Server-side apply with forced ownership under the fabric-kube field
    /// manager. Idempotent upsert: repeated applies of the same manifest
    /// converge instead of erroring.
    async fn apply_manifest(&self, manifest: &Manifest) -> Result<(), FabricError>;
}

pub struct FabricKubeClientImpl {
    client: Client,
    namespace: String,
}

impl FabricKubeClientImpl {
    pub async fn new(namespace: String) -> Result<Self, FabricError> {
        let client = Client::try_default().await.map_err(|e| {
            FabricError::KubeApi(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client, namespace })
    }

    pub async fn new_with_config(
        namespace: String,
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self, FabricError> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path)
                .map_err(|e| FabricError::KubeApi(format!("Failed to load kubeconfig: {}", e)))?
        } else {
            Kubeconfig::read()
                .map_err(|e| FabricError::KubeApi(format!("Failed to load kubeconfig: {}", e)))?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                FabricError::KubeApi(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            FabricError::KubeApi(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client, namespace })
    }

    fn policy_api(&self) -> Api<DynamicObject> {
        Api::all_with(self.client.clone(), &foundation_resource())
    }

    /// Resolve the ApiResource and scope for an arbitrary manifest kind. The
    /// foundation kind is known statically; everything else goes through API
    /// discovery.
    async fn resolve_api(
        &self,
        manifest: &Manifest,
    ) -> Result<Api<DynamicObject>, FabricError> {
        if manifest.kind == FOUNDATION_KIND {
            return Ok(self.policy_api());
        }

        let (group, version) = match manifest.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", manifest.api_version.as_str()),
        };
        let gvk = GroupVersionKind::gvk(group, version, &manifest.kind);

        let (ar, caps) = kube::discovery::pinned_kind(&self.client, &gvk)
            .await
            .map_err(|e| {
                FabricError::KubeApi(format!(
                    "Failed to discover API resource for {}/{}: {}",
                    manifest.api_version, manifest.kind, e
                ))
            })?;

        let api = if caps.scope == Scope::Cluster {
            Api::all_with(self.client.clone(), &ar)
        } else {
            let namespace = manifest.namespace.as_deref().unwrap_or(&self.namespace);
            Api::namespaced_with(self.client.clone(), namespace, &ar)
        };
        Ok(api)
    }
}

#[async_trait::async_trait]
impl FabricKubeClient for FabricKubeClientImpl {
    async fn create_policy(&self, policy: &DynamicObject) -> Result<(), FabricError> {
        let pp = PostParams::default();
        self.policy_api().create(&pp, policy).await?;
        Ok(())
    }

    async fn get_policy(&self, name: &str) -> Result<DynamicObject, FabricError> {
        self.policy_api().get(name).await.map_err(|e| {
            if let kube::Error::Api(ae) = e {
                if ae.code == 404 {
                    FabricError::not_found(FOUNDATION_KIND, name)
                } else {
                    FabricError::KubeApi(ae.message)
                }
            } else {
                FabricError::KubeApi(e.to_string())
            }
        })
    }

    async fn list_policies(&self) -> Result<Vec<DynamicObject>, FabricError> {
        let list = self.policy_api().list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn delete_policy(&self, name: &str) -> Result<(), FabricError> {
        let dp = DeleteParams::default();
        match self.policy_api().delete(name, &dp).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(FabricError::KubeApi(e.to_string())),
        }
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, FabricError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pods = api.list(&ListParams::default()).await?;
        Ok(pods.items)
    }

    async fn list_devices(&self, namespace: &str) -> Result<Vec<DynamicObject>, FabricError> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &device_resource());
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn apply_manifest(&self, manifest: &Manifest) -> Result<(), FabricError> {
        let api = self.resolve_api(manifest).await?;
        let patch_params = PatchParams::apply(FIELD_MANAGER).force();
        api.patch(&manifest.name, &patch_params, &Patch::Apply(&manifest.body))
            .await?;
        Ok(())
    }
}
