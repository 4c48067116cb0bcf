use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::OracleConfig,
    error::{Result, TrackError},
};

use super::Oracle;

const MAX_ATTEMPTS: u32 = 3;

/// Oracle backed by a local ollama instance.
pub struct OllamaOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, reqwest::Error> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.config.endpoint))
            .json(&GenerateRequest {
                model: &self.config.model,
                prompt,
                stream: false,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;
        Ok(response.response)
    }
}

#[async_trait]
impl Oracle for OllamaOracle {
    async fn query(&self, prompt: &str) -> Result<String> {
        let mut last_error = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            match self.generate(prompt).await {
                Ok(response) => {
                    debug!("Oracle responded on attempt {attempt}");
                    return Ok(response);
                }
                Err(e) => {
                    warn!("Oracle attempt {attempt} failed: {e}");
                    last_error = e.to_string();
                }
            }
        }
        Err(TrackError::Oracle {
            attempts: MAX_ATTEMPTS,
            message: last_error,
        })
    }
}
