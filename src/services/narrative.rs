//! Narrative annotation of a reading through a hosted text-generation model.
//!
//! The annotator is best effort: every outcome, including a missing API key,
//! a failed call, or a call that exceeds the configured bound, resolves to a
//! display string so a scan can always be committed.

use crate::config::NarrativeConfig;
use crate::db::models::record_models::VitalsReading;
use crate::error::Error;
use async_trait::async_trait;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const UNAVAILABLE_TEXT: &str =
    "AI Analysis unavailable (Missing API Key). Employee shows standard vitals.";
pub const FAILED_TEXT: &str = "AI Analysis failed due to connectivity issues.";
pub const EMPTY_TEXT: &str = "Analysis completed.";
pub const TIMED_OUT_TEXT: &str = "AI Analysis timed out.";

/// Produces a one-sentence summary of a reading
#[async_trait]
pub trait NarrativeAnnotator: Send + Sync {
    async fn annotate(&self, reading: &VitalsReading, employee_name: &str) -> Result<String, Error>;
}

/// Used when no API key is configured
pub struct UnconfiguredAnnotator;

#[async_trait]
impl NarrativeAnnotator for UnconfiguredAnnotator {
    async fn annotate(&self, _reading: &VitalsReading, _employee_name: &str) -> Result<String, Error> {
        Err(Error::AnnotationUnavailable("no API key configured".to_string()))
    }
}

/// Build the prompt sent to the model
pub fn build_prompt(reading: &VitalsReading, employee_name: &str) -> String {
    format!(
        "Act as a workplace health safety AI. Analyze the following rPPG health metrics for employee {name}.\n\
         \n\
         Metrics:\n\
         - Heart Rate: {hr} bpm\n\
         - Respiration Rate: {rr} rpm\n\
         - SpO2: {spo2}%\n\
         - Blood Pressure: {sys}/{dia} mmHg\n\
         - Stress Level: {stress}/100\n\
         \n\
         Determine if the status is 'Good' or 'Risk' based on general medical knowledge.\n\
         Provide a ONE sentence summary of their condition. Do not provide medical advice, just an operational status observation.",
        name = employee_name,
        hr = reading.heart_rate,
        rr = reading.respiration_rate,
        spo2 = reading.spo2,
        sys = reading.blood_pressure_sys,
        dia = reading.blood_pressure_dia,
        stress = reading.stress_level,
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Client for the Generative Language `generateContent` endpoint
pub struct GeminiAnnotator {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiAnnotator {
    pub fn new(base_url: &str, model: &str, api_key: String) -> Result<Self, Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("rppg-kiosk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl NarrativeAnnotator for GeminiAnnotator {
    async fn annotate(&self, reading: &VitalsReading, employee_name: &str) -> Result<String, Error> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(reading, employee_name)),
                }],
            }],
        };

        debug!("Requesting narrative from {}", self.endpoint());

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::AnnotationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AnnotationFailed(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::AnnotationFailed(format!("Malformed response: {}", e)))?;

        Ok(parsed.text())
    }
}

/// Pick the annotator for the given configuration
pub fn create_annotator(config: &NarrativeConfig) -> Result<Arc<dyn NarrativeAnnotator>, Error> {
    match config.resolved_api_key() {
        Some(key) => Ok(Arc::new(GeminiAnnotator::new(&config.base_url, &config.model, key)?)),
        None => {
            warn!("Narrative API key not found, analysis will use the fallback text");
            Ok(Arc::new(UnconfiguredAnnotator))
        }
    }
}

/// Run one annotation, bounded by `timeout`, and map every outcome to text
pub async fn resolve_narrative(
    annotator: &dyn NarrativeAnnotator,
    reading: &VitalsReading,
    employee_name: &str,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, annotator.annotate(reading, employee_name)).await {
        Ok(Ok(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                EMPTY_TEXT.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Ok(Err(Error::AnnotationUnavailable(reason))) => {
            debug!("Narrative unavailable: {}", reason);
            UNAVAILABLE_TEXT.to_string()
        }
        Ok(Err(e)) => {
            error!("Narrative request failed: {}", e);
            FAILED_TEXT.to_string()
        }
        Err(_) => {
            warn!("Narrative request exceeded {:?}", timeout);
            TIMED_OUT_TEXT.to_string()
        }
    }
}
