use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

pub use shared::{Answer, QaRequest};

pub use crate::inference::{Client as InferenceClient, Config};

mod inference;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

pub const DEFAULT_MODEL: &str = "z-uo/bert-qasper";

pub const DEMO_QUESTION: &str = "what they propose?";

pub const DEMO_CONTEXT: &str = "In this paper, we provide an innovative contribution in the research domain dedicated to crop \
    mapping by exploiting the of Sentinel-2 satellite images time series, with the specific aim to \
    extract information on 'where and when' crops are grown. The final goal is to set up a workflow \
    able to reliably identify (classify) the different crops that are grown in a given area by \
    exploiting an end-to-end (3+2)D convolutional neural network (CNN) for semantic segmentation. \
    The method also has the ambition to provide information, at pixel level, regarding the period in \
    which a given crop is cultivated during the season. To this end, we propose a solution called \
    Class Activation Interval (CAI) which allows us to interpret, for each pixel, the reasoning made \
    by CNN in the classification determining in which time interval, of the input time series, the \
    class is likely to be present or not. Our experiments, using a public domain dataset, show that \
    the approach is able to accurately detect crop classes with an overall accuracy of about 93% and \
    that the network can detect discriminatory time intervals in which crop is cultivated. These \
    results have twofold importance: (i) demonstrate the ability of the network to correctly \
    interpret the investigated physical process (i.e., bare soil condition, plant growth, senescence \
    and harvesting according to specific cultivated variety) and (ii) provide further information \
    to the end-user (e.g., the presence of crops and its temporal dynamics).";

#[derive(Error, Diagnostic, Debug)]
pub enum ModelError {
    #[error("could not reach the inference endpoint")]
    Transport(#[from] reqwest::Error),
    #[error("inference endpoint replied with an unreadable body (HTTP {status})")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("model returned an error: {message}")]
    #[diagnostic(help("the hosted model may still be loading, try again shortly"))]
    Inference {
        message: String,
        estimated_time: Option<f64>,
    },
}

/// Something that can pull an answer span out of a passage.
#[async_trait]
pub trait AnswerModel: Send + Sync {
    async fn answer(&self, request: &QaRequest) -> Result<Answer, ModelError>;
}

pub async fn answer_question<M>(model: &M, request: &QaRequest) -> Result<Answer, ModelError>
where
    M: AnswerModel + ?Sized,
{
    let answer = model.answer(request).await?;

    match span_of(&request.context, answer.start, answer.end) {
        Some(span) if span == answer.answer => {}
        span => tracing::warn!(
            answer = %answer.answer,
            ?span,
            start = answer.start,
            end = answer.end,
            "answer does not match its span in the context"
        ),
    }

    tracing::info!(score = answer.score, answer = %answer.answer, "answered question");

    Ok(answer)
}

/// Slice `context` by character offsets, the way the model reports them.
pub fn span_of(context: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }

    let bounds: Vec<usize> = context
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(context.len()))
        .collect();

    Some(&context[*bounds.get(start)?..*bounds.get(end)?])
}
