//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the media-dl HTTP API using utoipa
//! for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-dl HTTP API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (when enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-dl HTTP API",
        version = "0.1.0",
        description = "Prepare media downloads, poll their progress and fetch the finished files",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::prepare_download,
        crate::api::routes::get_progress,
        crate::api::routes::cancel_download,
        crate::api::routes::download_file,

        // Info
        crate::api::routes::media_info,

        // System
        crate::api::routes::index,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskStatus,
        crate::types::FormatKind,
        crate::types::QualityOption,
        crate::downloader::MediaSummary,

        // API request/response types from routes
        crate::api::routes::InfoRequest,
        crate::api::routes::PrepareRequest,
        crate::api::routes::PrepareResponse,
        crate::api::routes::ProgressResponse,
        crate::api::routes::CancelResponse,
        crate::api::routes::HealthResponse,

        // Error types from error.rs
        crate::error::ApiError,
    )),
    tags(
        (name = "tasks", description = "Download tasks - Prepare, poll, cancel and fetch files"),
        (name = "info", description = "Media metadata lookup without downloading"),
        (name = "system", description = "System endpoints - Front end, health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_has_paths() {
        let spec = ApiDoc::openapi();

        for path in [
            "/api/prepare",
            "/api/progress/{task_id}",
            "/api/cancel/{task_id}",
            "/api/download/{task_id}",
            "/api/info",
            "/health",
        ] {
            assert!(
                spec.paths.paths.contains_key(path),
                "OpenAPI spec should document {}",
                path
            );
        }
    }

    #[test]
    fn test_openapi_spec_has_components() {
        let spec = ApiDoc::openapi();
        let components = spec.components.unwrap();

        for schema in ["ProgressResponse", "MediaSummary", "ApiError", "TaskStatus"] {
            assert!(
                components.schemas.contains_key(schema),
                "missing schema {}",
                schema
            );
        }
    }

    #[test]
    fn test_openapi_spec_has_tags() {
        let spec = ApiDoc::openapi();
        let tags = spec.tags.unwrap();
        let tag_names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();

        assert!(tag_names.contains(&"tasks"), "Should have 'tasks' tag");
        assert!(tag_names.contains(&"system"), "Should have 'system' tag");
    }

    #[test]
    fn test_openapi_spec_info() {
        let spec = ApiDoc::openapi();

        assert_eq!(spec.info.title, "media-dl HTTP API");
        assert!(spec.info.description.is_some());
    }

    #[test]
    fn test_openapi_spec_serializes_to_json() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_value(&spec).unwrap();

        assert!(json["openapi"].as_str().unwrap().starts_with("3."));
        assert!(json["paths"]["/api/prepare"]["post"].is_object());
    }
}
