use serde::{Deserialize, Serialize};

use crate::db::{Country, Role, User};

/// Uniform response envelope. `success` mirrors the HTTP status class;
/// `errorCode` is the stable machine-readable code.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error_code: None,
            errors: Vec::new(),
            data: Some(data),
        }
    }

    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error_code: None,
            errors: Vec::new(),
            data: None,
        }
    }

    pub fn failure(
        message: impl Into<String>,
        error_code: impl Into<String>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            error_code: Some(error_code.into()),
            errors,
            data: None,
        }
    }
}

// ============================================================================
// Response DTOs — whitelisted projections, never raw records
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub provider: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image_url: Option<String>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub dob: Option<String>,
    pub tagline: Option<String>,
    pub website: Option<String>,
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub country_code_iso3: Option<String>,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub is_active: bool,
    pub roles: Vec<RoleDto>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            provider: user.provider,
            first_name: user.first_name,
            last_name: user.last_name,
            display_name: user.display_name,
            phone_number: user.phone_number,
            profile_image_url: user.profile_image_url,
            gender: user.gender,
            bio: user.bio,
            dob: user.dob,
            tagline: user.tagline,
            website: user.website,
            timezone: user.timezone,
            locale: user.locale,
            country_code_iso3: user.country_code_iso3,
            is_email_verified: user.is_email_verified,
            is_phone_verified: user.is_phone_verified,
            is_active: user.is_active,
            roles: user.roles.into_iter().map(RoleDto::from).collect(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserDto,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryDto {
    pub name: String,
    pub code: String,
    pub code_iso3: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Country> for CountryDto {
    fn from(country: Country) -> Self {
        Self {
            name: country.name,
            code: country.code,
            code_iso3: country.code_iso3,
            created_at: country.created_at,
            updated_at: country.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUserResponse {
    pub user: UserDto,
    pub profile_picture_url: Option<String>,
    pub document_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: String,
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember_me: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_email_verified: Option<bool>,
    #[serde(default)]
    pub is_phone_verified: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_new_password: String,
}
