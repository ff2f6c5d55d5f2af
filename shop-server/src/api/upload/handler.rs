//! Upload API Handlers

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    response::IntoResponse,
};
use http::{StatusCode, header};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

use crate::core::ServerState;
use crate::services::upload::{MAX_FILE_SIZE, UploadResponse};

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::with_message(
            ErrorCode::FileTooLarge,
            format!(
                "File too large. Maximum size is {}MB",
                MAX_FILE_SIZE / 1024 / 1024
            ),
        )
    } else {
        AppError::invalid_request(format!("Invalid multipart request: {}", e.body_text()))
    }
}

fn content_type(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}

/// POST /uploads
pub async fn upload(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<UploadResponse>>)> {
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await.map_err(multipart_error)?;
            file = Some((name, data));
            break;
        }
    }

    let (name, data) = file.ok_or_else(|| {
        AppError::with_message(
            ErrorCode::NoFileProvided,
            "No 'file' field found. Field name must be 'file'",
        )
    })?;

    let uploaded = state.uploads.upload_image(&name, data.to_vec()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(uploaded))))
}

/// GET /uploads/{filename}
pub async fn serve(
    State(state): State<ServerState>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    let (content, ext) = state.uploads.read(&filename).await?;
    Ok(([(header::CONTENT_TYPE, content_type(&ext))], content))
}
