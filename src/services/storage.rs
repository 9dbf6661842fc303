//! Attachment uploads to Supabase-compatible object storage.
//!
//! Uploads are best-effort from the caller's point of view: a failed upload is
//! logged and the attachment omitted, the payment submission itself never
//! fails because of storage.

use crate::config::AppConfig;
use crate::errors::ServiceError;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Upload limits enforced before any bytes leave the process.
pub const MAX_FILES: usize = 5;
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// Returns whether `mime` is an accepted attachment type.
pub fn is_valid_file_type(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

/// One stored attachment, as persisted in the `archivos` JSON column and
/// echoed in the notification email.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Clone)]
struct StorageBackend {
    base_url: String,
    key: String,
    bucket: String,
}

/// Object-storage client. Constructed disabled when credentials are absent so
/// the service runs (and tests run) without network access.
#[derive(Clone)]
pub struct StorageService {
    client: reqwest::Client,
    backend: Option<StorageBackend>,
}

impl StorageService {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let backend = match (cfg.supabase_url.as_ref(), cfg.supabase_key.as_ref()) {
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                Some(StorageBackend {
                    base_url: url.trim_end_matches('/').to_string(),
                    key: key.clone(),
                    bucket: cfg.supabase_bucket.clone(),
                })
            }
            _ => {
                warn!("object storage not configured; attachments will be skipped");
                None
            }
        };
        Self {
            client: reqwest::Client::new(),
            backend,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Uploads one attachment and returns its public URL and metadata.
    pub async fn upload(
        &self,
        original_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, ServiceError> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            ServiceError::ExternalServiceError("object storage not configured".to_string())
        })?;

        let size = bytes.len();
        let object = unique_object_name(original_name);
        let endpoint = format!(
            "{}/storage/v1/object/{}/{}",
            backend.base_url, backend.bucket, object
        );

        debug!(object = %object, size, "uploading attachment");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&backend.key)
            .header(http::header::CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("storage upload: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::ExternalServiceError(format!(
                "storage upload rejected ({status}): {detail}"
            )));
        }

        Ok(UploadedFile {
            url: format!(
                "{}/storage/v1/object/public/{}/{}",
                backend.base_url, backend.bucket, object
            ),
            file_name: original_name.to_string(),
            mime_type: mime_type.to_string(),
            size,
        })
    }
}

/// Builds a collision-resistant object name, keeping the original extension.
fn unique_object_name(original_name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let ext = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());
    format!("uploads/{}-{}.{}", chrono::Utc::now().timestamp_millis(), suffix, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use assert_matches::assert_matches;

    #[test]
    fn mime_allowlist() {
        assert!(is_valid_file_type("image/png"));
        assert!(is_valid_file_type("application/pdf"));
        assert!(!is_valid_file_type("image/svg+xml"));
        assert!(!is_valid_file_type("application/x-msdownload"));
        assert!(!is_valid_file_type("text/html"));
    }

    #[test]
    fn object_names_keep_extension_and_differ() {
        let a = unique_object_name("factura.PDF");
        let b = unique_object_name("factura.PDF");
        assert!(a.starts_with("uploads/"));
        assert!(a.ends_with(".pdf"));
        assert_ne!(a, b);
    }

    #[test]
    fn object_name_without_extension_falls_back() {
        assert!(unique_object_name("archivo").ends_with(".bin"));
        assert!(unique_object_name("raro.!!").ends_with(".bin"));
    }

    #[tokio::test]
    async fn disabled_storage_refuses_uploads() {
        let service = StorageService::from_config(&AppConfig::default());
        assert!(!service.is_enabled());

        let result = service.upload("x.png", "image/png", vec![1, 2, 3]).await;
        assert_matches!(result, Err(ServiceError::ExternalServiceError(_)));
    }

    #[test]
    fn archivo_serializes_with_camel_case_keys() {
        let archivo = UploadedFile {
            url: "https://x/y.png".into(),
            file_name: "y.png".into(),
            mime_type: "image/png".into(),
            size: 3,
        };
        let json = serde_json::to_value(&archivo).unwrap();
        assert!(json.get("fileName").is_some());
        assert!(json.get("mimeType").is_some());
    }
}
