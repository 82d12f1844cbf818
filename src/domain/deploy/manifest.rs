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

//! Decoding of rendered manifest files into applyable documents.

use crate::infrastructure::constants::{FOUNDATION_KIND, RETRYABLE_KIND};
use crate::shared::error::{FabricError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One decoded cluster-object document.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// File the document came from
    pub source: String,
    /// Document position within the file
    pub index: usize,
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    /// Full decoded document, used as the server-side apply payload
    pub body: serde_json::Value,
}

impl Manifest {
    pub fn is_foundation(&self) -> bool {
        self.kind == FOUNDATION_KIND
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.eq_ignore_ascii_case(RETRYABLE_KIND)
    }
}

/// Split a YAML stream on lines that start with `---`. Blank documents are
/// dropped by the decoder, not here.
pub fn split_documents(content: &str) -> Vec<String> {
    let mut docs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim_start().starts_with("---") {
            if !current.is_empty() {
                docs.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        docs.push(current.join("\n"));
    }

    docs
}

/// Decode every document in a rendered file set. The input map is keyed by
/// file name; `BTreeMap` iteration gives the stable file order, and documents
/// keep their in-file order, so repeated runs produce the same sequence.
pub fn decode_manifests(files: &BTreeMap<String, String>) -> Result<Vec<Manifest>> {
    let mut manifests = Vec::new();

    for (source, content) in files {
        for (index, doc) in split_documents(content).into_iter().enumerate() {
            if doc.trim().is_empty() {
                continue;
            }

            let value: serde_yaml::Value = serde_yaml::from_str(&doc).map_err(|e| {
                FabricError::InvalidManifest(format!(
                    "failed to decode document {} of {}: {}",
                    index, source, e
                ))
            })?;
            if value.is_null() {
                // comments-only document
                continue;
            }
            let body = serde_json::to_value(&value)?;

            let api_version = string_field(&body, &["apiVersion"]).ok_or_else(|| {
                missing_field_error(source, index, "apiVersion")
            })?;
            let kind = string_field(&body, &["kind"])
                .ok_or_else(|| missing_field_error(source, index, "kind"))?;
            let name = string_field(&body, &["metadata", "name"])
                .ok_or_else(|| missing_field_error(source, index, "metadata.name"))?;
            let namespace = string_field(&body, &["metadata", "namespace"]);

            manifests.push(Manifest {
                source: source.clone(),
                index,
                api_version,
                kind,
                name,
                namespace,
                body,
            });
        }
    }

    Ok(manifests)
}

/// Read every manifest file of a rendered output directory (non-recursive,
/// `.yaml`/`.yml` only), keyed by file name.
pub fn read_manifest_dir(dir: &Path) -> Result<BTreeMap<String, String>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        FabricError::config_error(format!(
            "Failed to read manifests directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut files = BTreeMap::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".yaml") && !name.ends_with(".yml") {
            continue;
        }

        let content = fs::read_to_string(entry.path())?;
        files.insert(name, content);
    }

    Ok(files)
}

fn string_field(value: &serde_json::Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str().map(|s| s.to_string())
}

fn missing_field_error(source: &str, index: usize, field: &str) -> FabricError {
    FabricError::InvalidManifest(format!(
        "document {} of {} has no {}",
        index, source, field
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTI_DOC: &str = r#"apiVersion: v1
kind: ConfigMap
metadata:
  name: fabric-settings
  namespace: fabric-operator
data:
  mtu: "9000"
---
# device plugin pod
apiVersion: v1
kind: Pod
metadata:
  name: fabric-test-pod
spec:
  containers: []
---
"#;

    #[test]
    fn splits_on_separator_lines() {
        let docs = split_documents(MULTI_DOC);
        assert_eq!(docs.len(), 2);
        assert!(docs[0].contains("ConfigMap"));
        assert!(docs[1].contains("fabric-test-pod"));
    }

    #[test]
    fn decodes_documents_with_identity_fields() {
        let mut files = BTreeMap::new();
        files.insert("10-settings.yaml".to_string(), MULTI_DOC.to_string());

        let manifests = decode_manifests(&files).unwrap();
        assert_eq!(manifests.len(), 2);

        assert_eq!(manifests[0].kind, "ConfigMap");
        assert_eq!(manifests[0].name, "fabric-settings");
        assert_eq!(manifests[0].namespace.as_deref(), Some("fabric-operator"));
        assert_eq!(manifests[0].index, 0);

        assert_eq!(manifests[1].kind, "Pod");
        assert!(manifests[1].is_retryable());
        assert!(manifests[1].namespace.is_none());
    }

    #[test]
    fn file_order_is_sorted_by_name() {
        let mut files = BTreeMap::new();
        files.insert(
            "20-pod.yaml".to_string(),
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: b\n".to_string(),
        );
        files.insert(
            "10-cm.yaml".to_string(),
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n".to_string(),
        );

        let manifests = decode_manifests(&files).unwrap();
        assert_eq!(manifests[0].source, "10-cm.yaml");
        assert_eq!(manifests[1].source, "20-pod.yaml");
    }

    #[test]
    fn missing_name_is_rejected() {
        let mut files = BTreeMap::new();
        files.insert(
            "bad.yaml".to_string(),
            "apiVersion: v1\nkind: Pod\nmetadata: {}\n".to_string(),
        );

        let err = decode_manifests(&files).unwrap_err();
        assert!(err.to_string().contains("metadata.name"));
    }
}
