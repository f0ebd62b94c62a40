//! Session and credential management.

pub mod claims;
pub mod credentials;
pub mod session;

pub use claims::{AccessClaims, ClaimsDecoder, UnverifiedDecoder};
pub use credentials::CredentialStore;
pub use session::{SessionManager, SessionSnapshot};
