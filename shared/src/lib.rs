use serde::{Deserialize, Serialize};

/// A question about a passage of text, as submitted by the QA form.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QaRequest {
    pub question: String,
    pub context: String,
}

/// An extracted answer span. `start` and `end` are character offsets into the
/// context the question was asked against.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Answer {
    pub answer: String,
    pub score: f64,
    pub start: usize,
    pub end: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TrendingStock {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub volume: u64,
}

impl TrendingStock {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("N/A")
    }

    pub fn display_price(&self) -> String {
        match self.price {
            Some(price) => format!("{price:.2}"),
            None => "N/A".to_owned(),
        }
    }
}
