use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, routing::post, Form, Json, Router};
use qasper::{answer_question, Answer, AnswerModel, QaRequest};

use crate::pages::{self, AppError};

#[derive(Clone)]
pub struct QaState {
    pub model: Arc<dyn AnswerModel>,
}

pub fn router(model: Arc<dyn AnswerModel>) -> Router {
    Router::new()
        .route("/", get(index).post(ask))
        .route("/api/v0/answer", post(answer))
        .with_state(QaState { model })
}

async fn index() -> Html<String> {
    Html(pages::qa_index())
}

async fn ask(
    State(state): State<QaState>,
    Form(request): Form<QaRequest>,
) -> Result<Html<String>, AppError> {
    let answer = answer_question(state.model.as_ref(), &request).await?;

    Ok(Html(pages::qa_result(&request, &answer)))
}

async fn answer(
    State(state): State<QaState>,
    Json(request): Json<QaRequest>,
) -> Result<Json<Answer>, AppError> {
    Ok(Json(answer_question(state.model.as_ref(), &request).await?))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use qasper::ModelError;
    use tower::ServiceExt;

    use super::*;

    /// Answers with the first word of the context.
    struct FirstWord;

    #[async_trait]
    impl AnswerModel for FirstWord {
        async fn answer(&self, request: &QaRequest) -> Result<Answer, ModelError> {
            let word = request.context.split(' ').next().unwrap_or_default();

            Ok(Answer {
                answer: word.to_owned(),
                score: 0.9,
                start: 0,
                end: word.chars().count(),
            })
        }
    }

    struct Unavailable;

    #[async_trait]
    impl AnswerModel for Unavailable {
        async fn answer(&self, _request: &QaRequest) -> Result<Answer, ModelError> {
            Err(ModelError::Inference {
                message: "Service Unavailable".to_owned(),
                estimated_time: None,
            })
        }
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_post(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn get_renders_the_form() {
        let app = router(Arc::new(FirstWord));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains(r#"name="question""#));
        assert!(body.contains(r#"name="context""#));
    }

    #[tokio::test]
    async fn post_renders_the_answer() {
        let app = router(Arc::new(FirstWord));

        let response = app
            .oneshot(form_post(
                "question=what+they+propose%3F&context=Sentinel-2+imagery+for+crop+mapping",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains(r#"<p class="answer">Sentinel-2</p>"#));
        assert!(body.contains("what they propose?"));
    }

    #[tokio::test]
    async fn missing_field_is_rejected() {
        let app = router(Arc::new(FirstWord));

        let response = app.oneshot(form_post("question=who")).await.unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn model_failure_is_a_server_error() {
        let app = router(Arc::new(Unavailable));

        let response = app.oneshot(form_post("question=q&context=c")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("Service Unavailable"));
    }

    #[tokio::test]
    async fn json_endpoint_returns_the_answer() {
        let app = router(Arc::new(FirstWord));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v0/answer")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"question":"q","context":"crops grow"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(r#""answer":"crops""#));
    }
}
