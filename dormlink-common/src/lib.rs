//! DormLink Common Types
//!
//! Shared types used by the session core and any application layer built
//! on top of it.

pub mod auth;
pub mod notification;
pub mod user;

pub use auth::{
    LoginRequest, MarkReadRequest, RefreshRequest, RefreshResponse, RegisterRequest, TokenPair,
};
pub use notification::Notification;
pub use user::UserProfile;
