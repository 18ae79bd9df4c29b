//! File upload, listing, retrieval and access-level management.
//!
//! | Method | Endpoint | Credential |
//! |--------|----------|------------|
//! | POST | `/api/files/upload` | session |
//! | GET | `/api/files?scope=own\|all` | session |
//! | GET | `/api/files/{id}` | optional (session or API key) |
//! | PATCH | `/api/files/{id}/access` | session, owner only |
//! | DELETE | `/api/files/{id}` | session, owner only |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use routes::{protected_routes, retrieval_routes};
pub use services::FileService;
pub use store::PgFileStore;
