//! Encrypted, HttpOnly session cookies for server-rendered apps.
//!
//! A user record is sealed with AES-256-GCM into a cookie value, exposed over a
//! small HTTP API (`/api/user`), and consumed by a typed client.

pub mod client;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub mod crypto {
    pub mod aes;
    pub mod codec;
    pub mod key;
    pub mod token;
}

pub mod models {
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod session;
}

pub mod handlers {
    pub mod user;
}

pub use client::SessionClient;
pub use config::{Config, CookieSettings};
pub use crypto::codec::SessionCodec;
pub use error::{AppError, Result};
pub use models::{session::SessionState, user::UserRecord};
pub use services::session::{CookieOptions, SessionJar, SessionStore};
pub use state::AppState;
