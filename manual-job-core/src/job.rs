//! Wire payloads for the platform's job endpoints.

use serde::{Deserialize, Serialize};

use crate::source_file::{DeliveryObject, SourceFile};

pub const DEFAULT_JOB_NAME: &str = "Manual Job";

/// Job-related settings from the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSettings {
    /// Existing job to deliver into; when set, no job is created.
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source_storage_profile_id: Option<String>,
    #[serde(default)]
    pub destination_storage_profile_id: Option<String>,
}

impl JobSettings {
    /// Configured job id, ignoring blank values.
    pub fn existing_job_id(&self) -> Option<&str> {
        self.job_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Body of the job-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewJob {
    pub name: String,
    pub actions: Vec<JobAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub data: TransferData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferData {
    pub source: StorageEndpoint,
    pub destination: StorageEndpoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEndpoint {
    pub storage_profile_id: String,
}

impl NewJob {
    /// One TRANSFER action between the configured storage profiles. Unset profile ids are sent
    /// as empty strings and left for the platform to reject.
    pub fn from_settings(settings: &JobSettings) -> Self {
        let name = settings
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_JOB_NAME.to_string());
        NewJob {
            name,
            actions: vec![JobAction {
                kind: ActionKind::Transfer,
                data: TransferData {
                    source: StorageEndpoint {
                        storage_profile_id: settings
                            .source_storage_profile_id
                            .clone()
                            .unwrap_or_default(),
                    },
                    destination: StorageEndpoint {
                        storage_profile_id: settings
                            .destination_storage_profile_id
                            .clone()
                            .unwrap_or_default(),
                    },
                },
            }],
        }
    }
}

/// Response of the job-creation request. Only the id is needed downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedJob {
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Body of the delivery request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryRequest {
    pub objects: Vec<DeliveryObject>,
}

impl DeliveryRequest {
    pub fn from_source_files(files: &[SourceFile]) -> Self {
        DeliveryRequest {
            objects: files.iter().map(SourceFile::to_delivery_object).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_file::normalize;
    use serde_json::json;

    #[test]
    fn new_job_payload_shape() {
        let settings = JobSettings {
            job_id: None,
            name: Some("Dailies".into()),
            source_storage_profile_id: Some("sp-src".into()),
            destination_storage_profile_id: Some("sp-dst".into()),
        };
        let payload = serde_json::to_value(NewJob::from_settings(&settings)).unwrap();
        assert_eq!(
            payload,
            json!({
                "name": "Dailies",
                "actions": [{
                    "type": "TRANSFER",
                    "data": {
                        "source": { "storageProfileId": "sp-src" },
                        "destination": { "storageProfileId": "sp-dst" }
                    }
                }]
            })
        );
    }

    #[test]
    fn new_job_defaults() {
        let job = NewJob::from_settings(&JobSettings::default());
        assert_eq!(job.name, DEFAULT_JOB_NAME);
        assert_eq!(job.actions[0].data.source.storage_profile_id, "");
    }

    #[test]
    fn blank_job_id_counts_as_unset() {
        let settings = JobSettings {
            job_id: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(settings.existing_job_id(), None);
    }

    #[test]
    fn created_job_reads_job_id() {
        let created: CreatedJob =
            serde_json::from_str(r#"{"jobId":"j-1","name":"x","status":"ACTIVE"}"#).unwrap();
        assert_eq!(created.job_id.as_deref(), Some("j-1"));
    }

    #[test]
    fn delivery_request_strips_timestamps() {
        let files = vec![normalize(
            "/a.mov",
            500,
            Some(chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().into()),
        )];
        let body = serde_json::to_value(DeliveryRequest::from_source_files(&files)).unwrap();
        assert_eq!(
            body,
            json!({ "objects": [{ "relativePath": "/a.mov", "sizeInBytes": 500 }] })
        );
    }
}
