//! Authentication service models

pub mod user;

// Re-export for convenience
pub use user::{
    AuthPayload, LoginRequest, NewUser, RefreshTokenRequest, RegisterRequest, UpdateProfileRequest,
    UpdateUser, User, UserListResponse,
};
