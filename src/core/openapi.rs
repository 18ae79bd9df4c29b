use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::access::AccessLevel;
use crate::features::api_keys::{dtos as api_keys_dtos, handlers as api_keys_handlers};
use crate::features::auth;
use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handler::get_me,
        // Files
        files_handlers::upload_file,
        files_handlers::list_files,
        files_handlers::download_file,
        files_handlers::update_access_level,
        files_handlers::delete_file,
        // API keys
        api_keys_handlers::issue_api_key,
        api_keys_handlers::get_api_key,
        api_keys_handlers::revoke_api_key,
    ),
    components(
        schemas(
            Meta,
            AccessLevel,
            // Auth
            auth::dto::MeResponseDto,
            ApiResponse<auth::dto::MeResponseDto>,
            // Files
            files_dtos::UploadFileDto,
            files_dtos::FileResponseDto,
            files_dtos::FileListResponseDto,
            files_dtos::ListScope,
            files_dtos::UpdateAccessLevelDto,
            files_dtos::DeleteFileResponseDto,
            ApiResponse<files_dtos::FileResponseDto>,
            ApiResponse<files_dtos::FileListResponseDto>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
            // API keys
            api_keys_dtos::IssuedApiKeyDto,
            api_keys_dtos::ApiKeyInfoDto,
            api_keys_dtos::RevokeApiKeyResponseDto,
            ApiResponse<api_keys_dtos::IssuedApiKeyDto>,
            ApiResponse<api_keys_dtos::ApiKeyInfoDto>,
            ApiResponse<api_keys_dtos::RevokeApiKeyResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Current session"),
        (name = "files", description = "File upload, retrieval and access levels"),
        (name = "api-keys", description = "Per-user API keys for session-less downloads"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Filevault API",
        version = "0.1.0",
        description = "API documentation for Filevault",
    )
)]
pub struct ApiDoc;

/// Adds the bearer JWT and API key security schemes to the OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Api-Key"))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/auth/me",
            "/api/files/upload",
            "/api/files",
            "/api/files/{id}",
            "/api/files/{id}/access",
            "/api/api-keys",
        ] {
            assert!(paths.contains(&expected), "missing {}", expected);
        }
    }
}
