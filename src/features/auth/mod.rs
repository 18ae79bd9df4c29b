mod jwks;
mod validator;

pub mod dto;
pub mod handler;
pub mod model;
pub mod resolver;
pub mod routes;

pub use jwks::JwksClient;
pub use resolver::{ApiKeyResolver, CredentialResolver};
pub use validator::JwtValidator;
