pub mod common;
pub mod health;
pub mod user;

pub use health::{ping, PingResponse};
pub use user::{
    create_user, delete_user, get_user, search_users, update_user, CreateUserRequest,
    SearchUsersParams, UpdateUserRequest, UserListResponse, UserResponse,
};
