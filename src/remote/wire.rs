//! JSON wire types for the Generative Language REST API.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::{Generation, ModelInfo, PromptFeedback};
use crate::error::RemoteError;
use crate::invoker::SafetySettings;
use crate::processing::normalizer::encode_image;
use crate::types::{NormalizedFragment, ProcessingState, RemoteAsset, RequestPayload};

/// Request body for `models/*:generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub safety_settings: Vec<SafetySettingEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    /// Parts the pipeline never sends and ignores on receipt
    Other(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SafetySettingEntry {
    pub category: &'static str,
    pub threshold: &'static str,
}

/// Response body for `generateContent`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// File resource as returned by the files endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileResource {
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Upload responses wrap the resource in a `file` field.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub file: FileResource,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadMetadata<'a> {
    pub file: UploadMetadataFile<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadMetadataFile<'a> {
    pub display_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl From<FileResource> for RemoteAsset {
    fn from(file: FileResource) -> Self {
        let processing_state = match file.state.as_deref() {
            Some("ACTIVE") => ProcessingState::Ready,
            Some("FAILED") => ProcessingState::Failed,
            _ => ProcessingState::Pending,
        };
        RemoteAsset {
            reference_id: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
            processing_state,
        }
    }
}

/// Map payload fragments to request parts, in order.
///
/// Images and uploaded assets are each followed by their caption so the
/// model can attribute them.
pub(crate) fn build_request(
    payload: &RequestPayload,
    safety: &SafetySettings,
) -> Result<GenerateContentRequest, RemoteError> {
    let mut parts = Vec::with_capacity(payload.len() * 2);

    for fragment in payload.fragments() {
        match fragment {
            NormalizedFragment::Image {
                image,
                mime_type,
                caption,
            } => {
                let bytes = encode_image(image, mime_type)
                    .map_err(|e| RemoteError::Encode(e.to_string()))?;
                parts.push(Part::InlineData {
                    inline_data: Blob {
                        mime_type: mime_type.clone(),
                        data: STANDARD.encode(bytes),
                    },
                });
                parts.push(Part::Text {
                    text: caption.clone(),
                });
            }
            NormalizedFragment::TextBlock { text, .. } => {
                parts.push(Part::Text { text: text.clone() });
            }
            NormalizedFragment::RemoteHandle { asset, caption } => {
                parts.push(Part::FileData {
                    file_data: FileData {
                        mime_type: asset.mime_type.clone(),
                        file_uri: asset.uri.clone(),
                    },
                });
                parts.push(Part::Text {
                    text: caption.clone(),
                });
            }
        }
    }

    parts.push(Part::Text {
        text: payload.instruction().to_string(),
    });

    Ok(GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        safety_settings: safety
            .entries()
            .map(|(category, threshold)| SafetySettingEntry {
                category: category.api_name(),
                threshold: threshold.api_name(),
            })
            .collect(),
    })
}

impl From<GenerateContentResponse> for Generation {
    fn from(response: GenerateContentResponse) -> Self {
        let first = response.candidates.into_iter().next();
        let finish_reason = first.as_ref().and_then(|c| c.finish_reason.clone());

        let text = first
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| match part {
                        Part::Text { text } => Some(text),
                        _ => None,
                    })
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty());

        Generation {
            text,
            finish_reason,
            feedback: response.prompt_feedback,
        }
    }
}

/// Turn a non-success HTTP response into a typed error.
pub(crate) fn error_from_status(status: u16, body: &str) -> RemoteError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());
    let exhausted = parsed
        .as_ref()
        .map(|e| e.error.status == "RESOURCE_EXHAUSTED")
        .unwrap_or(false);

    if status == 429 || exhausted {
        RemoteError::QuotaExceeded { message }
    } else {
        RemoteError::Api { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::normalizer::text_block;
    use crate::types::NormalizedFragment;
    use image::{DynamicImage, RgbImage};
    use pretty_assertions::assert_eq;

    fn asset() -> RemoteAsset {
        RemoteAsset {
            reference_id: "files/c".to_string(),
            uri: "https://example.test/v1beta/files/c".to_string(),
            mime_type: "application/pdf".to_string(),
            processing_state: ProcessingState::Ready,
        }
    }

    #[test]
    fn test_build_request_orders_parts() {
        let payload = RequestPayload::new(
            vec![
                NormalizedFragment::Image {
                    image: DynamicImage::ImageRgb8(RgbImage::new(4, 4)),
                    mime_type: "image/png".to_string(),
                    caption: "Image filename: a.png".to_string(),
                },
                text_block("b.html", "Question 1"),
                NormalizedFragment::RemoteHandle {
                    asset: asset(),
                    caption: "PDF filename: c.pdf".to_string(),
                },
            ],
            "Analyze.".to_string(),
        );

        let request = build_request(&payload, &SafetySettings::permissive()).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        let parts = json["contents"][0]["parts"].as_array().unwrap();

        assert_eq!(parts.len(), 6);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["text"], "Image filename: a.png");
        assert_eq!(parts[2]["text"], "\n--- CONTENTS OF b.html ---\nQuestion 1\n");
        assert_eq!(parts[3]["fileData"]["fileUri"], "https://example.test/v1beta/files/c");
        assert_eq!(parts[4]["text"], "PDF filename: c.pdf");
        assert_eq!(parts[5]["text"], "Analyze.");

        let safety = json["safetySettings"].as_array().unwrap();
        assert_eq!(safety.len(), 4);
        assert!(safety.iter().all(|s| s["threshold"] == "BLOCK_NONE"));
    }

    #[test]
    fn test_file_states_map_to_processing_state() {
        let resource = |state: Option<&str>| FileResource {
            name: "files/x".to_string(),
            uri: String::new(),
            mime_type: "application/pdf".to_string(),
            state: state.map(str::to_string),
        };

        let states: Vec<ProcessingState> = [Some("PROCESSING"), Some("ACTIVE"), Some("FAILED"), None]
            .into_iter()
            .map(|s| RemoteAsset::from(resource(s)).processing_state)
            .collect();

        assert_eq!(
            states,
            vec![
                ProcessingState::Pending,
                ProcessingState::Ready,
                ProcessingState::Failed,
                ProcessingState::Pending,
            ]
        );
    }

    #[test]
    fn test_generation_concatenates_text_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r##"{"candidates":[{"content":{"role":"model","parts":[{"text":"# Report\n"},{"text":"- Graphs"}]},"finishReason":"STOP"}]}"##,
        )
        .unwrap();

        let generation = Generation::from(response);

        assert_eq!(generation.text.as_deref(), Some("# Report\n- Graphs"));
        assert_eq!(generation.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_blocked_prompt_keeps_feedback() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"promptFeedback":{"blockReason":"SAFETY","safetyRatings":[{"category":"HARM_CATEGORY_DANGEROUS_CONTENT","probability":"HIGH"}]}}"#,
        )
        .unwrap();

        let generation = Generation::from(response);

        assert!(generation.text.is_none());
        let feedback = generation.feedback.unwrap();
        assert_eq!(feedback.block_reason.as_deref(), Some("SAFETY"));
        assert_eq!(feedback.safety_ratings.len(), 1);
    }

    #[test]
    fn test_error_mapping() {
        let quota = error_from_status(
            429,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        assert!(matches!(quota, RemoteError::QuotaExceeded { ref message } if message == "Quota exceeded"));

        let other = error_from_status(400, r#"{"error":{"code":400,"message":"Bad file","status":"INVALID_ARGUMENT"}}"#);
        assert!(matches!(other, RemoteError::Api { status: 400, ref message } if message == "Bad file"));

        let plain = error_from_status(503, "upstream unavailable");
        assert!(matches!(plain, RemoteError::Api { status: 503, ref message } if message == "upstream unavailable"));
    }
}
