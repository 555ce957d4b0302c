use crate::wire::{self, Envelope};
use reqwest::{Method, StatusCode, Url};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use vskill_core::config::{SkillConfig, BASE_URL_VAR};
use vskill_core::error::{BackendErrorKind, Result, SkillError};
use vskill_core::models::{
    IndexCreateParams, IndexDescriptor, IndexKind, RawShot, SearchParams, ShotRange,
    TranscriptSegment, UploadSource, VideoHandle,
};
use vskill_core::ports::VideoBackend;

const CLIENT_HEADER: &str = concat!("vskill/", env!("CARGO_PKG_VERSION"));

/// Delay between checks of an asynchronous job's output URL
const OUTPUT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Whether a call waits for asynchronous jobs to finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Follow {
    Wait,
    Return,
}

/// VideoDB REST backend
///
/// Exposes the blocking [`VideoBackend`] port over async reqwest calls
/// driven by a runtime owned by the backend.
pub struct VideoDbBackend {
    /// Base URL for the API (e.g., "https://api.videodb.io")
    base_url: String,

    api_key: String,

    /// Id of the connection's default collection
    collection_id: String,

    /// Upper bound on output polls for one asynchronous job
    output_poll_attempts: u64,

    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl VideoDbBackend {
    /// Connect using the resolved configuration and look up the default collection
    pub fn connect(config: &SkillConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SkillError::ClientUnavailable {
                reason: format!("Failed to create async runtime: {}", e),
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| SkillError::ClientUnavailable {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        let mut backend = Self {
            base_url: config.base_url.value.trim_end_matches('/').to_string(),
            api_key,
            collection_id: String::new(),
            output_poll_attempts: config.http_timeout().as_secs().max(1),
            client,
            runtime,
        };

        let url = backend.endpoint(&["collection", "default"], &[])?;
        let collection = backend.call(Method::GET, url, None, Follow::Wait)?;
        backend.collection_id = collection
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string();

        tracing::debug!(collection_id = %backend.collection_id, "Connected to VideoDB");
        Ok(backend)
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    /// API URL for raw path segments and query pairs, both percent-encoded
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let invalid = |reason: String| SkillError::ConfigInvalid {
            key: BASE_URL_VAR.to_string(),
            reason,
        };

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("Invalid base URL '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("Base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    fn call(&self, method: Method, url: Url, body: Option<Value>, follow: Follow) -> Result<Value> {
        self.runtime.block_on(self.send(method, url, body, follow))
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>, follow: Follow) -> Result<Value> {
        tracing::debug!(%method, %url, "VideoDB request");

        let mut request = self
            .client
            .request(method, url.clone())
            .header("x-access-token", &self.api_key)
            .header("x-videodb-client", CLIENT_HEADER);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SkillError::backend(format!("Request to {} failed: {}", url, e)))?;

        let envelope = read_envelope(response).await?;

        if follow == Follow::Wait && envelope.is_processing() {
            if let Some(output_url) = envelope.output_url() {
                return self.wait_for_output(output_url.to_string()).await;
            }
        }

        Ok(envelope.data)
    }

    /// Poll an asynchronous job until it leaves the processing state
    async fn wait_for_output(&self, output_url: String) -> Result<Value> {
        for _ in 0..self.output_poll_attempts {
            tokio::time::sleep(OUTPUT_POLL_INTERVAL).await;

            let response = self
                .client
                .get(&output_url)
                .header("x-access-token", &self.api_key)
                .header("x-videodb-client", CLIENT_HEADER)
                .send()
                .await
                .map_err(|e| SkillError::backend(format!("Request to {} failed: {}", output_url, e)))?;

            let envelope = read_envelope(response).await?;
            if !envelope.is_processing() {
                return Ok(envelope.data);
            }
        }

        Err(SkillError::backend(format!("Job still processing at {}", output_url)))
    }

    fn upload_file(&self, path: &Path, name: Option<&str>) -> Result<Value> {
        if !path.is_file() {
            return Err(SkillError::FileNotFound { path: path.to_path_buf() });
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let display_name = name.map(str::to_string).unwrap_or_else(|| file_name.clone());

        let url = self.endpoint(
            &["collection", self.collection_id.as_str(), "upload_url"],
            &[("name", file_name.as_str())],
        )?;
        let target = self.call(Method::GET, url, None, Follow::Wait)?;
        let upload_url = target
            .get("upload_url")
            .and_then(Value::as_str)
            .ok_or_else(|| SkillError::backend("Upload URL missing from response"))?
            .to_string();

        let bytes = std::fs::read(path)?;
        self.runtime.block_on(async {
            let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
            let form = reqwest::multipart::Form::new().part("file", part);
            let response = self
                .client
                .post(&upload_url)
                .multipart(form)
                .send()
                .await
                .map_err(|e| SkillError::backend(format!("File upload failed: {}", e)))?;
            if !response.status().is_success() {
                return Err(SkillError::backend(format!(
                    "File upload failed with HTTP {}",
                    response.status()
                )));
            }
            Ok(())
        })?;

        let url = self.endpoint(&["collection", self.collection_id.as_str(), "upload"], &[])?;
        self.call(
            Method::POST,
            url,
            Some(json!({ "url": upload_url, "name": display_name })),
            Follow::Wait,
        )
    }
}

async fn read_envelope(response: reqwest::Response) -> Result<Envelope> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| SkillError::backend(format!("Failed to read response: {}", e)))?;

    let envelope: Envelope = if text.trim().is_empty() {
        Envelope::default()
    } else {
        match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => Envelope {
                message: Some(text.trim().to_string()),
                ..Envelope::default()
            },
            Err(e) => return Err(SkillError::backend(format!("Invalid response: {}", e))),
        }
    };

    if status.is_success() && !envelope.is_failure() {
        return Ok(envelope);
    }

    let message = envelope
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    if status == StatusCode::NOT_FOUND && BackendErrorKind::classify(&message) != BackendErrorKind::NotFound {
        return Err(SkillError::backend(format!("Not found: {}", message)));
    }

    Err(SkillError::backend(message))
}

impl VideoBackend for VideoDbBackend {
    fn list_videos(&self) -> Result<Vec<VideoHandle>> {
        let url = self.endpoint(&["video"], &[("collection_id", self.collection_id.as_str())])?;
        let data = self.call(Method::GET, url, None, Follow::Wait)?;
        Ok(wire::videos(data)?)
    }

    fn get_video(&self, video_id: &str) -> Result<Option<VideoHandle>> {
        let url = self.endpoint(&["video", video_id], &[("collection_id", self.collection_id.as_str())])?;
        match self.call(Method::GET, url, None, Follow::Wait) {
            Ok(data) => Ok(Some(wire::video(data)?)),
            Err(e) if e.backend_kind() == Some(BackendErrorKind::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn upload(&self, source: &UploadSource, name: Option<&str>) -> Result<VideoHandle> {
        let data = match source {
            UploadSource::Url(url) => {
                let mut body = json!({ "url": url });
                if let Some(name) = name {
                    body["name"] = json!(name);
                }
                let url = self.endpoint(&["collection", self.collection_id.as_str(), "upload"], &[])?;
                self.call(Method::POST, url, Some(body), Follow::Wait)?
            }
            UploadSource::File(path) => self.upload_file(path, name)?,
        };

        Ok(wire::video(data)?)
    }

    fn search_video(&self, video_id: &str, params: &SearchParams) -> Result<Vec<RawShot>> {
        let url = self.endpoint(&["video", video_id, "search"], &[])?;
        let data = self.call(Method::POST, url, Some(serde_json::to_value(params)?), Follow::Wait)?;
        Ok(wire::shots(data))
    }

    fn search_collection(&self, params: &SearchParams) -> Result<Vec<RawShot>> {
        let url = self.endpoint(&["collection", self.collection_id.as_str(), "search"], &[])?;
        let data = self.call(Method::POST, url, Some(serde_json::to_value(params)?), Follow::Wait)?;
        Ok(wire::shots(data))
    }

    fn compile_shots(&self, shots: &[ShotRange]) -> Result<String> {
        // Only adjacent shots of one video share an entry; play order is result order
        let mut groups: Vec<(String, Vec<[f64; 2]>)> = Vec::new();
        for shot in shots {
            match groups.last_mut() {
                Some((id, ranges)) if *id == shot.video_id => ranges.push([shot.start, shot.end]),
                _ => groups.push((shot.video_id.clone(), vec![[shot.start, shot.end]])),
            }
        }

        let body: Vec<Value> = groups
            .into_iter()
            .map(|(video_id, ranges)| {
                json!({
                    "video_id": video_id,
                    "collection_id": self.collection_id,
                    "shots": ranges,
                })
            })
            .collect();

        let url = self.endpoint(&["compile"], &[])?;
        let data = self.call(Method::POST, url, Some(Value::Array(body)), Follow::Wait)?;
        wire::stream_url(&data).ok_or_else(|| SkillError::backend("Compiled stream URL missing from response"))
    }

    fn list_indexes(&self, video_id: &str, kind: IndexKind) -> Result<Vec<IndexDescriptor>> {
        let url = match kind {
            IndexKind::Scene => self.endpoint(&["video", video_id, "index", "scene"], &[])?,
            IndexKind::SpokenWord => {
                self.endpoint(&["video", video_id, "index"], &[("index_type", kind.as_str())])?
            }
        };
        let data = self.call(Method::GET, url, None, Follow::Return)?;
        Ok(wire::indexes(data))
    }

    fn create_index(&self, video_id: &str, params: &IndexCreateParams) -> Result<Option<String>> {
        let (url, body) = match params {
            IndexCreateParams::SpokenWord => (
                self.endpoint(&["video", video_id, "index"], &[])?,
                json!({ "index_type": IndexKind::SpokenWord }),
            ),
            IndexCreateParams::Scene(scene) => (
                self.endpoint(&["video", video_id, "index", "scene"], &[])?,
                json!({
                    "extraction_type": scene.extraction.extraction_type(),
                    "extraction_config": scene.extraction.config(),
                    "prompt": scene.prompt,
                }),
            ),
        };

        // Readiness is tracked by the caller, so the job is not awaited here
        let data = self.call(Method::POST, url, Some(body), Follow::Return)?;
        Ok(wire::created_index_id(&data))
    }

    fn get_transcript(&self, video_id: &str, force: bool) -> Result<Vec<TranscriptSegment>> {
        let force = if force { "true" } else { "false" };
        let url = self.endpoint(&["video", video_id, "transcription"], &[("force", force)])?;
        let data = self.call(Method::GET, url, None, Follow::Wait)?;
        Ok(wire::transcript(data)?)
    }

    fn generate_transcript(&self, video_id: &str) -> Result<()> {
        let url = self.endpoint(&["video", video_id, "transcription"], &[])?;
        self.call(Method::POST, url, Some(json!({ "force": false })), Follow::Wait)?;
        Ok(())
    }

    fn get_transcript_text(&self, video_id: &str) -> Result<String> {
        let url = self.endpoint(&["video", video_id, "transcription"], &[])?;
        let data = self.call(Method::GET, url, None, Follow::Wait)?;
        Ok(wire::transcript_text(&data))
    }
}
