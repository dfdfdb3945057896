use super::{LLMError, LLMProvider, Message, MessageRole};
use crate::config::LLMConfig;
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Client for a `generateContent`-style endpoint authenticated with a bearer token.
pub struct GeminiProvider {
    base_url: String,
    model: String,
    token: SecretString,
    search_tool: bool,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &LLMConfig, token: SecretString) -> super::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            token,
            search_tool: config.search_tool,
            client,
        })
    }

    /// Build a provider from config, reading the token from the environment.
    ///
    /// Returns `Ok(None)` when no token is set.
    pub fn from_config(config: &LLMConfig) -> super::Result<Option<Self>> {
        match config.api_token() {
            Some(token) => Self::new(config, token).map(Some),
            None => {
                tracing::warn!(
                    env = %config.api_key_env,
                    "No completion token set; model fallback disabled"
                );
                Ok(None)
            }
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn payload(&self, messages: &[Message]) -> serde_json::Value {
        let mut contents = Vec::new();
        let mut system_instruction = None;

        for msg in messages {
            if msg.role == MessageRole::System {
                system_instruction = Some(json!({
                    "parts": [{"text": msg.content}]
                }));
                continue;
            }

            contents.push(json!({
                "role": "user",
                "parts": [{"text": msg.content}]
            }));
        }

        let mut payload = serde_json::Map::new();
        payload.insert("contents".to_string(), json!(contents));
        payload.insert(
            "generationConfig".to_string(),
            json!({ "temperature": 0 }),
        );

        if let Some(sys) = system_instruction {
            payload.insert("systemInstruction".to_string(), sys);
        }

        if self.search_tool {
            payload.insert("tools".to_string(), json!([{ "google_search": {} }]));
        }

        serde_json::Value::Object(payload)
    }
}

/// Extract the first text part of the first candidate.
fn first_text(data: &serde_json::Value) -> super::Result<String> {
    let candidate = data
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| LLMError::ParseError("No candidates in response".to_string()))?;

    let parts = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| LLMError::ParseError("No parts in candidate content".to_string()))?;

    parts
        .iter()
        .find_map(|part| part.get("text").and_then(|t| t.as_str()))
        .map(String::from)
        .ok_or_else(|| LLMError::ParseError("No text part in candidate".to_string()))
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, messages: &[Message]) -> super::Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.token.unsecure())
            .json(&self.payload(messages))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                400 | 404 => LLMError::InvalidRequest(text),
                429 => LLMError::RateLimitExceeded,
                401 | 403 => LLMError::AuthenticationFailed(text),
                _ => LLMError::ProviderUnavailable(format!(
                    "Gemini API error ({}): {}",
                    status, text
                )),
            });
        }

        let data: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LLMError::Timeout
            } else {
                LLMError::ParseError(e.to_string())
            }
        })?;

        first_text(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(search_tool: bool) -> GeminiProvider {
        let config = LLMConfig {
            base_url: "https://llm.example.com/v1beta/".to_string(),
            search_tool,
            ..LLMConfig::default()
        };
        GeminiProvider::new(&config, SecretString::new("token")).unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let p = provider(true);
        assert_eq!(
            p.endpoint(),
            "https://llm.example.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_payload_shape() {
        let p = provider(true);
        let payload = p.payload(&[Message::system("sys"), Message::user("q")]);

        assert_eq!(payload["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(payload["contents"][0]["role"], "user");
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "q");
        assert_eq!(payload["generationConfig"]["temperature"], 0);
        assert!(payload["tools"][0].get("google_search").is_some());
    }

    #[test]
    fn test_payload_without_search_tool() {
        let p = provider(false);
        let payload = p.payload(&[Message::user("q")]);
        assert!(payload.get("tools").is_none());
        assert!(payload.get("systemInstruction").is_none());
    }

    #[test]
    fn test_first_text_extraction() {
        let data = json!({
            "candidates": [
                {"content": {"parts": [{"text": "310"}, {"text": "ignored"}]}},
                {"content": {"parts": [{"text": "second"}]}}
            ]
        });
        assert_eq!(first_text(&data).unwrap(), "310");
    }

    #[test]
    fn test_first_text_missing_candidates() {
        let data = json!({ "promptFeedback": {} });
        assert!(matches!(first_text(&data), Err(LLMError::ParseError(_))));

        let data = json!({ "candidates": [{"content": {"parts": []}}] });
        assert!(matches!(first_text(&data), Err(LLMError::ParseError(_))));
    }
}
