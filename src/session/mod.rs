//! # Session Module
//!
//! Process-wide authentication state: `Unknown` until the stored tokens have
//! been checked, then `Unauthenticated` or `Authenticated` with the loaded
//! profile. Transitions are published on a watch channel.

pub mod auth_session;
pub mod state;

pub use auth_session::AuthSession;
pub use state::SessionState;
