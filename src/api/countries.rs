use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::types::{ApiResponse, CountryDto};
use super::{ApiError, AppState};

/// GET /countries
pub async fn list_countries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CountryDto>>>, ApiError> {
    let countries = state.store().list_countries().await?;

    Ok(Json(ApiResponse::success(
        "Countries fetched successfully",
        countries.into_iter().map(CountryDto::from).collect(),
    )))
}

/// GET /countries/code/{code}
pub async fn get_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<CountryDto>>, ApiError> {
    let country = state
        .store()
        .find_country_by_code(&code.to_uppercase())
        .await?
        .ok_or_else(|| ApiError::not_found("COUNTRY_NOT_FOUND", "Country not found"))?;

    Ok(Json(ApiResponse::success(
        "Country fetched successfully",
        CountryDto::from(country),
    )))
}

/// GET /countries/code-iso3/{codeIso3}
pub async fn get_by_code_iso3(
    State(state): State<Arc<AppState>>,
    Path(code_iso3): Path<String>,
) -> Result<Json<ApiResponse<CountryDto>>, ApiError> {
    let country = state
        .store()
        .find_country_by_code_iso3(&code_iso3.to_uppercase())
        .await?
        .ok_or_else(|| ApiError::not_found("COUNTRY_NOT_FOUND", "Country not found"))?;

    Ok(Json(ApiResponse::success(
        "Country fetched successfully",
        CountryDto::from(country),
    )))
}
