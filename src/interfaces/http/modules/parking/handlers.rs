//! Status query handlers

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use super::dto::{
    GarageResponse, PlateStatusRequest, PlateStatusResponse, RevenueRequest, RevenueResponse,
    SpotStatusRequest, SpotStatusResponse,
};
use crate::application::QueryService;
use crate::interfaces::http::common::{
    api_error, bad_request, domain_error, ApiError, ApiResponse, ValidatedJson,
};

#[derive(Clone)]
pub struct ParkingState {
    pub queries: Arc<QueryService>,
}

#[utoipa::path(
    post,
    path = "/api/plate-status",
    tag = "Parking",
    request_body = PlateStatusRequest,
    responses(
        (status = 200, description = "Latest visit of the plate", body = ApiResponse<PlateStatusResponse>),
        (status = 404, description = "Plate never seen"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn plate_status(
    State(state): State<ParkingState>,
    ValidatedJson(req): ValidatedJson<PlateStatusRequest>,
) -> Result<Json<ApiResponse<PlateStatusResponse>>, ApiError> {
    let status = state
        .queries
        .plate_status(&req.license_plate)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(status.into())))
}

#[utoipa::path(
    post,
    path = "/api/spot-status",
    tag = "Parking",
    request_body = SpotStatusRequest,
    responses(
        (status = 200, description = "Spot occupancy", body = ApiResponse<SpotStatusResponse>),
        (status = 404, description = "No spot at these coordinates"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn spot_status(
    State(state): State<ParkingState>,
    ValidatedJson(req): ValidatedJson<SpotStatusRequest>,
) -> Result<Json<ApiResponse<SpotStatusResponse>>, ApiError> {
    let status = state
        .queries
        .spot_status(req.lat, req.lng)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(status.into())))
}

#[utoipa::path(
    get,
    path = "/api/revenue",
    tag = "Parking",
    params(RevenueRequest),
    responses(
        (status = 200, description = "Revenue of a sector on a day", body = ApiResponse<RevenueResponse>),
        (status = 400, description = "Bad query string")
    )
)]
pub async fn get_revenue(
    State(state): State<ParkingState>,
    query: Result<Query<RevenueRequest>, QueryRejection>,
) -> Result<Json<ApiResponse<RevenueResponse>>, ApiError> {
    let Query(req) = query.map_err(|r| bad_request(r.body_text()))?;
    req.validate()
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    revenue(&state, req).await
}

#[utoipa::path(
    post,
    path = "/api/revenue",
    tag = "Parking",
    request_body = RevenueRequest,
    responses(
        (status = 200, description = "Revenue of a sector on a day", body = ApiResponse<RevenueResponse>),
        (status = 422, description = "Validation error")
    )
)]
pub async fn post_revenue(
    State(state): State<ParkingState>,
    ValidatedJson(req): ValidatedJson<RevenueRequest>,
) -> Result<Json<ApiResponse<RevenueResponse>>, ApiError> {
    revenue(&state, req).await
}

async fn revenue(
    state: &ParkingState,
    req: RevenueRequest,
) -> Result<Json<ApiResponse<RevenueResponse>>, ApiError> {
    let summary = state
        .queries
        .revenue(req.date, &req.sector)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(summary.into())))
}

#[utoipa::path(
    get,
    path = "/api/garage",
    tag = "Parking",
    responses(
        (status = 200, description = "Sectors and spots with live occupancy", body = ApiResponse<GarageResponse>)
    )
)]
pub async fn get_garage(
    State(state): State<ParkingState>,
) -> Result<Json<ApiResponse<GarageResponse>>, ApiError> {
    let garage = state.queries.garage().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(garage.into())))
}
