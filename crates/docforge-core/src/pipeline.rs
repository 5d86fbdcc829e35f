//! One invocation end to end: template lookup, substitution, repackaging, publication.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::archive::{Compression, DocxArchive, DOCUMENT_PART, DOCX_CONTENT_TYPE};
use crate::config::ServiceConfig;
use crate::edits::EditRequest;
use crate::error::{DocforgeError, Result};
use crate::storage::{LinkPolicy, LocalBucket, OutputStore, TemplateStore};
use crate::substitute::Engine;
use crate::variant::VariantRegistry;

/// One invocation: a template key and the edits to apply to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(alias = "templateKey")]
    pub template_id: String,
    #[serde(default)]
    pub edits: EditRequest,
}

/// Successful invocation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub download_url: String,
    pub filename: String,
}

/// Object path of a generated document.
pub fn output_path(key: &str, unix_millis: i64) -> String {
    format!("outputs/{key}-{unix_millis}.docx")
}

/// Download filename offered for a generated document.
pub fn output_filename(key: &str) -> String {
    format!("{key}-edited.docx")
}

/// Template keys are restricted to `[A-Za-z0-9_-]+`.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DocforgeError::InvalidTemplateKey(key.to_string()))
    }
}

/// Per-process context: stores, variants and the engine.
///
/// Built once at startup and shared by every invocation; it holds no
/// per-invocation state.
pub struct DocumentService {
    templates: Arc<dyn TemplateStore>,
    outputs: Arc<dyn OutputStore>,
    registry: VariantRegistry,
    engine: Engine,
}

impl DocumentService {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        outputs: Arc<dyn OutputStore>,
        registry: VariantRegistry,
    ) -> Result<Self> {
        registry.validate()?;
        Ok(Self {
            templates,
            outputs,
            registry,
            engine: Engine::new()?,
        })
    }

    /// Service over a [`LocalBucket`] described by `config`. The bucket is
    /// returned as well so the caller can serve its outputs.
    pub fn from_config(config: &ServiceConfig) -> Result<(Self, Arc<LocalBucket>)> {
        let links = match config.signed_url_expiry_secs {
            Some(secs) => LinkPolicy::signed(config.signing_key.as_deref(), Duration::from_secs(secs)),
            None => LinkPolicy::Public,
        };
        let bucket = Arc::new(LocalBucket::new(
            &config.storage_root,
            &config.public_base_url,
            links,
        ));

        let mut registry = VariantRegistry::builtin();
        registry.extend(config.variants.iter().cloned());

        let service = Self::new(bucket.clone(), bucket.clone(), registry)?;
        Ok((service, bucket))
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    /// Load, unwrap, substitute, rewrap and publish one document.
    pub async fn process(&self, request: &ProcessRequest) -> Result<ProcessResponse> {
        let key = request.template_id.as_str();
        validate_key(key)?;
        let span = tracing::info_span!("process", template = key);
        self.run(key, &request.edits).instrument(span).await
    }

    async fn run(&self, key: &str, edits: &EditRequest) -> Result<ProcessResponse> {
        // Stage 1: load
        if !self.templates.exists(key).await? {
            return Err(DocforgeError::TemplateNotFound(key.to_string()));
        }
        let variant = self
            .registry
            .get(key)
            .ok_or_else(|| DocforgeError::UnknownVariant(key.to_string()))?;
        let bytes = self.templates.download(key).await?;

        // Stage 2: unwrap
        let mut archive = DocxArchive::open(&bytes)?;
        let markup = archive.read_part(DOCUMENT_PART)?;

        // Stage 3: substitute
        let rendered = self.engine.apply(variant, &markup, edits)?;
        let skipped = rendered.skipped();
        if !skipped.is_empty() {
            tracing::info!(?skipped, "some passes were skipped");
        }

        // Stage 4: rewrap
        archive.write_part(DOCUMENT_PART, &rendered.text);
        let output = archive.serialize(Compression::Deflated)?;

        // Stage 5: publish
        let path = output_path(key, chrono::Utc::now().timestamp_millis());
        let size = output.len();
        self.outputs.save(&path, output, DOCX_CONTENT_TYPE).await?;
        let download_url = self.outputs.publish(&path).await?;

        tracing::info!(path = %path, size, "document generated");
        Ok(ProcessResponse {
            success: true,
            download_url,
            filename: output_filename(key),
        })
    }
}
