use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use ranksavvy_core::{AnalysisResult, KeywordRecord};
use serde::Deserialize;

use super::ApiError;

const CSV_HEADER: [&str; 5] = [
    "keyword",
    "type",
    "intent",
    "search_volume_score",
    "competition",
];

#[derive(Debug, Deserialize)]
pub(super) struct ExportRequest {
    results: Option<AnalysisResult>,
}

pub(super) async fn export_csv(Json(req): Json<ExportRequest>) -> Result<Response, ApiError> {
    let results = req
        .results
        .ok_or_else(|| ApiError::bad_request("No results to export"))?;

    let body = keywords_csv(&results.keywords.all_keywords);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=niche_analysis.csv",
            ),
        ],
        body,
    )
        .into_response())
}

/// One row per keyword, CRLF line endings.
pub(super) fn keywords_csv(keywords: &[KeywordRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER);
    for record in keywords {
        let score = record.search_volume_score.to_string();
        push_row(
            &mut out,
            [
                record.keyword.as_str(),
                record.category.as_str(),
                record.intent.as_str(),
                score.as_str(),
                record.competition.as_str(),
            ],
        );
    }
    out
}

fn push_row<const N: usize>(out: &mut String, fields: [&str; N]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field));
    }
    out.push_str("\r\n");
}

/// Quote a field when it holds a comma, quote or line break; embedded
/// quotes are doubled.
fn escape_field(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}
