use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use uuid::Uuid;

use crate::{
    auth::{LoginService, Principal},
    error::{ApiError, LOGIN_FIELDS_REQUIRED},
    models::{DirectoryFilter, ErrorBody, LoginRequest, LoginResponse, Profile, Role},
    repository::{RepositoryError, RepositoryState},
};

fn store_fault(e: RepositoryError) -> ApiError {
    tracing::error!("directory lookup failed: {e}");
    ApiError::Internal
}

// --- Public Handlers ---

/// login
///
/// [Public Route] Exchanges an institutional e-mail and secret for a session token.
///
/// An unknown identifier and a wrong secret produce the same 401 body. A body that is not
/// valid JSON is treated like a missing field.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing identifier or secret", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub async fn login(
    State(service): State<LoginService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("login body rejected: {rejection}");
        ApiError::BadRequest(LOGIN_FIELDS_REQUIRED)
    })?;
    service.login(request).await.map(Json)
}

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> &'static str {
    "ok"
}

// --- Authenticated Handlers ---

/// get_me
///
/// [Authenticated Route] Returns the caller's token claims.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Current principal", body = Principal))
)]
pub async fn get_me(principal: Principal) -> Json<Principal> {
    Json(principal)
}

/// list_students
///
/// [Teacher or Administrator] Lists every student profile. Mounted twice: under
/// `/directory/students` for staff and `/teacher/students` for teachers only.
#[utoipa::path(
    get,
    path = "/directory/students",
    responses((status = 200, description = "Students", body = [Profile]))
)]
pub async fn list_students(State(repo): State<RepositoryState>) -> Result<Json<Vec<Profile>>, ApiError> {
    let students = repo
        .list_profiles(Some(Role::Student))
        .await
        .map_err(store_fault)?;
    Ok(Json(students))
}

/// get_student_profile
///
/// [Student Route] The caller's own profile, read fresh from the store.
#[utoipa::path(
    get,
    path = "/student/profile",
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "Account no longer exists", body = ErrorBody)
    )
)]
pub async fn get_student_profile(
    principal: Principal,
    State(repo): State<RepositoryState>,
) -> Result<Json<Profile>, ApiError> {
    match repo.find_profile(principal.id).await.map_err(store_fault)? {
        Some(profile) => Ok(Json(profile)),
        None => Err(ApiError::NotFound),
    }
}

// --- Admin Handlers ---

/// list_users
///
/// [Admin Route] Lists all users, optionally restricted to one role.
#[utoipa::path(
    get,
    path = "/admin/users",
    params(DirectoryFilter),
    responses((status = 200, description = "Users", body = [Profile]))
)]
pub async fn list_users(
    State(repo): State<RepositoryState>,
    Query(filter): Query<DirectoryFilter>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let users = repo.list_profiles(filter.role).await.map_err(store_fault)?;
    Ok(Json(users))
}

/// get_user
///
/// [Admin Route] A single user's profile by id.
#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = Profile),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_user(
    State(repo): State<RepositoryState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
    match repo.find_profile(id).await.map_err(store_fault)? {
        Some(profile) => Ok(Json(profile)),
        None => Err(ApiError::NotFound),
    }
}
