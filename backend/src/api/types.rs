//! JSON payloads of the HTTP API.

use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{ConversionResult, Row};
use crate::render::Target;

/// Response to `POST /api/convert`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub job_id: String,
    /// "ready" when every row was accepted, "warning" otherwise
    pub status: String,
    pub target: Target,
    /// Name the configuration should be saved under
    pub file_name: String,
    pub config: String,
    pub num_lines_accepted: usize,
    pub num_lines_rejected: usize,
}

impl ConvertResponse {
    pub fn new(job_id: String, target: Target, result: ConversionResult) -> Self {
        Self {
            job_id,
            status: status_for(result.num_lines_rejected).to_string(),
            target,
            file_name: target.file_name().to_string(),
            config: result.config,
            num_lines_accepted: result.num_lines_accepted,
            num_lines_rejected: result.num_lines_rejected,
        }
    }
}

/// Response to `POST /api/validate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Also tags the events streamed on `/api/report`
    pub job_id: String,
    pub status: String,
    pub checked_urls: bool,
    pub accepted: usize,
    pub rejected: usize,
    pub rows: Vec<Row>,
    /// One `<tr>` fragment per row, in row order
    pub html: Vec<String>,
}

impl ValidateResponse {
    pub fn new(
        job_id: String,
        checked_urls: bool,
        (accepted, rejected): (usize, usize),
        rows: Vec<Row>,
        html: Vec<String>,
    ) -> Self {
        Self {
            job_id,
            status: status_for(rejected).to_string(),
            checked_urls,
            accepted,
            rejected,
            rows,
            html,
        }
    }
}

fn status_for(rejected: usize) -> &'static str {
    if rejected == 0 {
        "ready"
    } else {
        "warning"
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_response() {
        let result = ConversionResult {
            config: "rewrite /a$ https://x redirect ;\n".into(),
            num_lines_accepted: 1,
            num_lines_rejected: 2,
            rows: Vec::new(),
        };
        let response = ConvertResponse::new("job".into(), Target::Nginx, result);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "warning");
        assert_eq!(json["target"], "nginx");
        assert_eq!(json["fileName"], "nginx_redirect.conf");
        assert_eq!(json["numLinesRejected"], 2);
    }

    #[test]
    fn test_validate_response_status() {
        let response = ValidateResponse::new("j".into(), false, (3, 0), Vec::new(), Vec::new());
        assert_eq!(response.status, "ready");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["checkedUrls"], false);
    }

    #[test]
    fn test_error_response() {
        let json = error_response("The file is empty");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "The file is empty");
    }
}
