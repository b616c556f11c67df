use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Client;
use crate::{Answer, AnswerModel, ModelError, QaRequest};

#[derive(Serialize, Debug, Clone)]
pub(crate) struct QuestionAnsweringRequest<'a> {
    inputs: &'a QaRequest,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct InferenceError {
    error: String,
    estimated_time: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub(crate) enum QuestionAnsweringResponse {
    Answer(Answer),
    Error(InferenceError),
}

impl QuestionAnsweringResponse {
    pub(crate) fn into_result(self) -> Result<Answer, ModelError> {
        match self {
            Self::Answer(answer) => Ok(answer),
            Self::Error(err) => Err(ModelError::Inference {
                message: err.error,
                estimated_time: err.estimated_time,
            }),
        }
    }
}

impl Client {
    pub async fn question_answering(&self, request: &QaRequest) -> Result<Answer, ModelError> {
        tracing::debug!(endpoint = %self.endpoint, "asking hosted model");

        // Error bodies come back with non-2xx statuses, so the body decides.
        let response = self
            .http
            .post(&self.endpoint)
            .json(&QuestionAnsweringRequest { inputs: request })
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        decode_response(status, &bytes)?.into_result()
    }
}

/// Bodies that are neither an answer nor a model error become `ModelError::Decode`.
pub(crate) fn decode_response(
    status: u16,
    body: &[u8],
) -> Result<QuestionAnsweringResponse, ModelError> {
    serde_json::from_slice(body).map_err(|source| ModelError::Decode { status, source })
}

#[async_trait]
impl AnswerModel for Client {
    async fn answer(&self, request: &QaRequest) -> Result<Answer, ModelError> {
        self.question_answering(request).await
    }
}
