//! Messaging webhook
//!
//! Accepts one recorded voice message as multipart field `file` and runs
//! it through the speech relay.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::metrics::record_webhook;
use crate::state::AppState;

/// Used when the upload carries no file name
pub const DEFAULT_FILE_NAME: &str = "recording.wav";

const MISSING_FILE: &str = "No audio file received";

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// `POST /webhook`
///
/// A body that is not multipart at all is treated like a form without a
/// file.
pub async fn webhook(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Webhook body is not multipart");
            record_webhook("missing_file");
            return missing_file();
        }
    };

    let upload = match read_upload(multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            record_webhook("missing_file");
            return missing_file();
        }
        Err(e) => {
            // oversized uploads surface here as 413
            tracing::warn!(error = %e, status = %e.status(), "Unreadable multipart body");
            record_webhook("bad_request");
            return (e.status(), Json(serde_json::json!({ "error": e.body_text() })))
                .into_response();
        }
    };

    tracing::info!(
        file_name = %upload.file_name,
        bytes = upload.bytes.len(),
        "Received voice message"
    );

    let outcome = state.relay.process(&upload.bytes, &upload.file_name).await;
    record_webhook(outcome.status.as_str());

    (StatusCode::OK, Json(outcome)).into_response()
}

/// First `file` field of the form, skipping everything else
async fn read_upload(
    mut multipart: Multipart,
) -> Result<Option<Upload>, axum::extract::multipart::MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
        let bytes = field.bytes().await?;

        return Ok(Some(Upload {
            file_name,
            bytes: bytes.to_vec(),
        }));
    }

    Ok(None)
}

fn missing_file() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": MISSING_FILE })),
    )
        .into_response()
}
