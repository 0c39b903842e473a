use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::common::{normalize_text, parse_number, parse_sex, require_text, validate_age};
use crate::models::{CreateUserInput, Pagination, Sex, UpdateUserInput, User, UserFilter};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub nationality: Option<String>,
    /// MALE or FEMALE
    pub sex: Option<String>,
    #[schema(minimum = 0)]
    pub age: Option<i32>,
}

/// Query string for user search. Values arrive as text so that empty or
/// unparsable numbers can be treated as absent.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchUsersParams {
    #[param(value_type = Option<i64>, default = 10, minimum = 1, maximum = 100)]
    pub limit: Option<String>,
    #[param(value_type = Option<i64>, default = 0, minimum = 0)]
    pub offset: Option<String>,
    /// Case-insensitive substring
    pub name: Option<String>,
    /// Case-insensitive substring
    pub surname: Option<String>,
    /// Case-insensitive substring
    pub patronymic: Option<String>,
    pub nationality: Option<String>,
    /// MALE or FEMALE
    pub sex: Option<String>,
    #[param(value_type = Option<i32>, minimum = 0)]
    pub age: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub nationality: Option<String>,
    pub sex: Option<Sex>,
    pub age: Option<i32>,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: time::OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            surname: u.surname,
            patronymic: u.patronymic,
            nationality: u.nationality,
            sex: u.sex,
            age: u.age,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

impl SearchUsersParams {
    fn into_query(self) -> AppResult<(Pagination, UserFilter)> {
        let pagination = Pagination::clamped(parse_number(self.limit), parse_number(self.offset));

        let filter = UserFilter {
            name: normalize_text(self.name),
            surname: normalize_text(self.surname),
            patronymic: normalize_text(self.patronymic),
            nationality: normalize_text(self.nationality),
            sex: parse_sex(self.sex)?,
            age: validate_age(parse_number(self.age))?,
        };

        Ok((pagination, filter))
    }
}

impl UpdateUserRequest {
    fn into_input(self) -> AppResult<UpdateUserInput> {
        Ok(UpdateUserInput {
            name: normalize_text(self.name),
            surname: normalize_text(self.surname),
            patronymic: normalize_text(self.patronymic),
            nationality: normalize_text(self.nationality),
            age: validate_age(self.age)?,
            sex: parse_sex(self.sex)?,
        })
    }
}

// ============ Handlers ============

/// Search users with optional filters and pagination
#[utoipa::path(
    get,
    path = "/api/users",
    params(SearchUsersParams),
    responses(
        (status = 200, description = "Matching users and total count", body = UserListResponse),
        (status = 400, description = "Invalid query parameter"),
        (status = 500, description = "Unknown error")
    ),
    tag = "Users"
)]
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchUsersParams>,
) -> AppResult<Json<UserListResponse>> {
    let (pagination, filter) = params.into_query()?;
    let page = state.users.search_users(pagination, filter).await?;

    Ok(Json(UserListResponse {
        data: page.items.into_iter().map(|u| u.into()).collect(),
        total: page.total,
        limit: pagination.limit.unwrap_or_default(),
        offset: pagination.offset.unwrap_or_default(),
    }))
}

/// Create a user; age, nationality and sex are looked up from the name
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Unknown error")
    ),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let input = CreateUserInput::new(
        require_text("name", payload.name)?,
        require_text("surname", payload.surname)?,
        normalize_text(payload.patronymic),
    );

    let user = state.users.create_user(input).await?;
    Ok(Json(user.into()))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state.users.get_user_by_id(id).await?;
    Ok(Json(user.into()))
}

/// Update the given fields of a user
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let input = payload.into_input()?;
    let user = state.users.update_user_by_id(id, input).await?;
    Ok(Json(user.into()))
}

/// Delete a user and return the removed record
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state.users.delete_user_by_id(id).await?;
    Ok(Json(user.into()))
}
