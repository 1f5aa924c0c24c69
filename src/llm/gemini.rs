use std::time::Duration;

use anyhow::{anyhow, bail};
use reqwest::blocking::Client;

use super::{GenerateRequest, GenerativeService};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("create http client err:{e}"))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

impl GenerativeService for GeminiClient {
    fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Option<String>> {
        if self.api_key.is_empty() {
            bail!("missing Gemini API key");
        }

        let body = GenerateContentRequest::from(request);
        log::debug!(
            "generateContent model={} contents={}",
            self.model,
            body.contents.len()
        );

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| anyhow!("Gemini request failed: {e}"))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| anyhow!("read Gemini response err:{e}"))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorWrapper>(&text)
                .ok()
                .and_then(|w| w.error.message)
                .unwrap_or(text);
            bail!("Gemini HTTP {status}: {message}");
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("parse Gemini response err:{e}"))?;
        Ok(parsed.text())
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, serde::Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

impl From<&GenerateRequest> for GenerateContentRequest {
    fn from(request: &GenerateRequest) -> Self {
        let contents = request
            .contents
            .iter()
            .map(|turn| Content {
                role: Some(turn.role.to_string()),
                parts: vec![Part {
                    text: Some(turn.text.clone()),
                }],
            })
            .collect();

        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(request.system_instruction.clone()),
                }],
            },
            contents,
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        }
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, serde::Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, serde::Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, joined.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::sys::llm::Turn;

    fn request() -> GenerateRequest {
        GenerateRequest {
            system_instruction: "persona".to_string(),
            contents: vec![Turn::model("greeting"), Turn::user("아렌티나의 수도는?")],
        }
    }

    fn client(url: &str, key: &str) -> GeminiClient {
        GeminiClient::new(key, "test-model", url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(GenerateContentRequest::from(&request())).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "systemInstruction": { "parts": [{ "text": "persona" }] },
                "contents": [
                    { "role": "model", "parts": [{ "text": "greeting" }] },
                    { "role": "user", "parts": [{ "text": "아렌티나의 수도는?" }] }
                ],
                "generationConfig": { "thinkingConfig": { "thinkingBudget": 0 } }
            })
        );
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "아렌" }, { "text": "이라네" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("아렌이라네"));
    }

    #[test]
    fn response_without_text_is_none() {
        for body in [
            serde_json::json!({}),
            serde_json::json!({ "candidates": [] }),
            serde_json::json!({ "candidates": [{ "finishReason": "SAFETY" }] }),
            serde_json::json!({ "candidates": [{ "content": { "parts": [{ "text": "" }] } }] }),
        ] {
            let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
            assert!(response.text().is_none());
        }
    }

    #[test]
    fn posts_to_generate_content() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/test-model:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "secret".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""thinkingBudget":0"#.to_string()),
                Matcher::Regex(r#""role":"user","parts":\[\{"text":"아렌티나의 수도는\?"\}\]"#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"아렌이라네."}]}}]}"#)
            .create();

        let reply = client(&server.url(), "secret").generate(&request()).unwrap();

        assert_eq!(reply.as_deref(), Some("아렌이라네."));
        mock.assert();
    }

    #[test]
    fn http_error_carries_service_message() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/test-model:generateContent")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#)
            .create();

        let err = client(&server.url(), "bad").generate(&request()).unwrap_err();

        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("API key not valid"));
        mock.assert();
    }

    #[test]
    fn missing_key_fails_before_network() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create();

        assert!(client(&server.url(), "").generate(&request()).is_err());
        mock.assert();
    }
}
