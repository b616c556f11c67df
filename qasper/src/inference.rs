use std::time::Duration;

use miette::{Context, IntoDiagnostic, Result};
use reqwest::header::{HeaderValue, AUTHORIZATION};

use crate::{APP_USER_AGENT, DEFAULT_MODEL};

pub(crate) mod question_answering;

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    api_token: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// A client for a hosted question-answering model.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("HF_API_TOKEN").ok();
        let base_url = std::env::var("QASPER_INFERENCE_URL")
            .unwrap_or_else(|_| DEFAULT_INFERENCE_URL.to_owned());
        let model = std::env::var("QASPER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
        let timeout = match std::env::var("QASPER_TIMEOUT_SECS") {
            Ok(secs) => secs
                .parse()
                .into_diagnostic()
                .wrap_err("QASPER_TIMEOUT_SECS must be a whole number of seconds")?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_token,
            base_url,
            model,
            timeout: Duration::from_secs(timeout),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.model)
    }

    pub fn client(&self) -> Result<Client> {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Some(token) = &self.api_token {
            let value = format!("Bearer {token}");
            let mut value = HeaderValue::from_str(&value)
                .into_diagnostic()
                .wrap_err("Could not create header value")?;
            value.set_sensitive(true);

            headers.insert(AUTHORIZATION, value);
        } else {
            tracing::debug!("HF_API_TOKEN not set, calling the inference API anonymously");
        }

        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .into_diagnostic()
            .wrap_err("Could not build reqwest client")?;

        Ok(Client {
            http,
            endpoint: self.endpoint(),
        })
    }
}
