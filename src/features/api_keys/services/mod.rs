mod api_key_service;

pub use api_key_service::ApiKeyService;
