use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::{CurrentUser, registration_from};
use super::types::{
    ApiResponse, ChangePasswordRequest, CreatedUserResponse, RegisterRequest, UserDto,
};
use super::validation::{validate_change_password, validate_register};
use super::{ApiError, AppState};
use crate::services::UploadedFile;

const MAX_DOCUMENTS: usize = 5;

/// GET /users/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .user_service()
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

    Ok(Json(ApiResponse::success(
        "User fetched successfully",
        UserDto::from(user),
    )))
}

/// GET /users/{email} — restricted to Administrator and Teacher roles.
pub async fn get_user_by_email(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .user_service()
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

    Ok(Json(ApiResponse::success(
        "User fetched successfully",
        UserDto::from(user),
    )))
}

/// POST /users — multipart user creation with optional profile picture and
/// up to five supporting documents.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut request = RegisterRequest::default();
    let mut profile_picture: Option<UploadedFile> = None;
    let mut documents: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request("INVALID_MULTIPART", format!("Invalid upload: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "profilePicture" | "documents" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::bad_request("INVALID_MULTIPART", format!("Invalid upload: {e}"))
                })?;

                let file = UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                };

                if name == "profilePicture" {
                    profile_picture = Some(file);
                } else if documents.len() < MAX_DOCUMENTS {
                    documents.push(file);
                } else {
                    return Err(ApiError::bad_request(
                        "TOO_MANY_DOCUMENTS",
                        format!("At most {MAX_DOCUMENTS} documents are allowed"),
                    ));
                }
            }
            _ => {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request("INVALID_MULTIPART", format!("Invalid field: {e}"))
                })?;
                apply_text_field(&mut request, &name, value);
            }
        }
    }

    validate_register(&request)?;

    let mut profile_picture_url = None;
    if let Some(file) = profile_picture {
        let uploaded = state.storage().upload(file, Some("profile-pictures")).await;
        if uploaded.has_error {
            return Err(ApiError::bad_request(
                "FILE_UPLOAD_ERROR",
                "Failed to upload profile picture",
            ));
        }
        tracing::info!(url = %uploaded.url, "Profile picture stored");
        profile_picture_url = Some(uploaded.url);
    }

    let mut document_urls = Vec::new();
    for file in documents {
        let uploaded = state.storage().upload(file, Some("documents")).await;
        if uploaded.has_error {
            return Err(ApiError::bad_request(
                "FILE_UPLOAD_ERROR",
                "Failed to upload document",
            ));
        }
        document_urls.push(uploaded.url);
    }

    let role = request.role.clone();
    let user = state
        .user_service()
        .create(registration_from(request), &role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "User created successfully",
            CreatedUserResponse {
                user: UserDto::from(user),
                profile_picture_url,
                document_urls,
            },
        )),
    ))
}

/// PUT /users/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_change_password(&payload)?;

    state
        .user_service()
        .change_password(
            &current.id,
            &payload.new_password,
            Some(&payload.current_password),
        )
        .await?;

    Ok(Json(ApiResponse::message_only(
        "Password updated successfully",
    )))
}

fn apply_text_field(request: &mut RegisterRequest, name: &str, value: String) {
    match name {
        "firstName" => request.first_name = value,
        "lastName" => request.last_name = Some(value),
        "phoneNumber" => request.phone_number = Some(value),
        "gender" => request.gender = Some(value),
        "email" => request.email = value,
        "password" => request.password = value,
        "role" => request.role = value,
        "isEmailVerified" => request.is_email_verified = value.parse().ok(),
        "isPhoneVerified" => request.is_phone_verified = value.parse().ok(),
        "isActive" => request.is_active = value.parse().ok(),
        _ => {}
    }
}
