//! HTTP handlers

mod auth;
mod health;

pub use auth::{callback, logout, me, CallbackRequest, CallbackResponse, UserView};
pub use health::{health, ready};
