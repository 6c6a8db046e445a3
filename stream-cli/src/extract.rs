use anyhow::Result;
use serde::Serialize;
use songsmith_utils_stream_parser::ChatResponse;
use songsmith_utils_stream_parser::parse_chat_response;
use songsmith_utils_stream_parser::parse_clean_response;

use crate::ExtractCommand;
use crate::ResponseKind;

#[derive(Serialize)]
struct ChatExtraction<'a> {
    #[serde(flatten)]
    response: &'a ChatResponse,
    changes_summary: &'a str,
}

/// Parse a complete response according to `cmd.kind` and render it as JSON.
pub fn extract_response(raw: &str, cmd: &ExtractCommand) -> Result<String> {
    let value = match cmd.kind {
        ResponseKind::Chat => {
            let response = parse_chat_response(raw);
            serde_json::to_value(ChatExtraction {
                response: &response,
                changes_summary: response.changes_summary(),
            })?
        }
        ResponseKind::Clean => {
            serde_json::to_value(parse_clean_response(raw, &cmd.fallback_original))?
        }
    };
    if cmd.pretty {
        serde_json::to_string_pretty(&value).map_err(Into::into)
    } else {
        serde_json::to_string(&value).map_err(Into::into)
    }
}
