use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use html_escape::encode_text;
use indoc::formatdoc;
use shared::{Answer, QaRequest, TrendingStock};

fn layout(title: &str, body: &str) -> String {
    formatdoc!(
        r#"
        <!doctype html>
        <html lang="en">
        <head>
          <meta charset="utf-8">
          <title>{title}</title>
        </head>
        <body>
        {body}
        </body>
        </html>
        "#
    )
}

fn qa_form(question: &str, context: &str) -> String {
    let question = encode_text(question);
    let context = encode_text(context);

    formatdoc!(
        r#"
        <form method="post" action="/">
          <label for="question">Question</label><br>
          <input type="text" id="question" name="question" value="{question}" required><br>
          <label for="context">Context</label><br>
          <textarea id="context" name="context" rows="12" cols="80" required>{context}</textarea><br>
          <button type="submit">Ask</button>
        </form>
        "#
    )
}

pub fn qa_index() -> String {
    layout(
        "Ask a question",
        &format!("<h1>Ask a question</h1>\n{}", qa_form("", "")),
    )
}

pub fn qa_result(request: &QaRequest, answer: &Answer) -> String {
    let question = encode_text(&request.question);
    let text = encode_text(&answer.answer);
    let score = answer.score;
    let (start, end) = (answer.start, answer.end);

    let body = formatdoc!(
        r#"
        <h1>Answer</h1>
        <p><strong>Question:</strong> {question}</p>
        <p class="answer">{text}</p>
        <p><small>score {score:.4}, characters {start}..{end} of the context</small></p>
        <h2>Ask another</h2>
        {form}
        "#,
        form = qa_form(&request.question, &request.context),
    );

    layout("Answer", &body)
}

pub fn trending(stocks: &[TrendingStock]) -> String {
    let rows = stocks
        .iter()
        .map(|stock| {
            formatdoc!(
                r#"
                  <tr>
                    <td>{symbol}</td>
                    <td>{name}</td>
                    <td>{price}</td>
                    <td>{volume}</td>
                  </tr>"#,
                symbol = encode_text(&stock.symbol),
                name = encode_text(stock.display_name()),
                price = stock.display_price(),
                volume = stock.volume,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let body = formatdoc!(
        r#"
        <h1>Trending stocks</h1>
        <table>
          <thead>
            <tr><th>Symbol</th><th>Name</th><th>Price</th><th>Volume</th></tr>
          </thead>
          <tbody>
        {rows}
          </tbody>
        </table>
        "#
    );

    layout("Trending stocks", &body)
}

/// Any handler failure, rendered as a 500 page.
pub struct AppError(miette::Report);

impl<E> From<E> for AppError
where
    E: Into<miette::Report>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self.0, "request failed");

        let causes = self
            .0
            .chain()
            .map(|cause| format!("<li>{}</li>", encode_text(&cause.to_string())))
            .collect::<Vec<_>>()
            .join("\n");
        let body = format!("<h1>Internal Server Error</h1>\n<ul>\n{causes}\n</ul>");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(layout("Internal Server Error", &body)),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_text_is_escaped() {
        let request = QaRequest {
            question: "<script>alert(1)</script>".to_owned(),
            context: "a & b".to_owned(),
        };
        let answer = Answer {
            answer: "b".to_owned(),
            score: 0.5,
            start: 4,
            end: 5,
        };

        let page = qa_result(&request, &answer);

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("a &amp; b"));
    }

    #[test]
    fn trending_renders_one_row_per_stock() {
        let stocks = vec![
            TrendingStock {
                symbol: "AAPL".to_owned(),
                name: Some("Apple Inc.".to_owned()),
                price: Some(189.371),
                volume: 48_000_000,
            },
            TrendingStock {
                symbol: "XYZ".to_owned(),
                name: None,
                price: None,
                volume: 10,
            },
        ];

        let page = trending(&stocks);

        assert_eq!(page.matches("<tr>").count(), 3);
        assert!(page.contains("<td>189.37</td>"));
        assert!(page.contains("<td>N/A</td>"));
    }
}
