//! Per-principal API keys.
//!
//! A key lets a client download its owner's files without a session. It
//! never grants access to other principals' files and never authorizes
//! mutation. Each principal holds at most one active key: issuing a new one
//! revokes the previous key.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/api-keys` | Issue a key (plaintext returned once) |
//! | GET | `/api/api-keys` | Metadata of the active key |
//! | DELETE | `/api/api-keys` | Revoke the active key |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use routes::routes;
pub use services::ApiKeyService;
pub use store::PgApiKeyStore;
