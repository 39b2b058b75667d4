pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::curriculum::handlers as curriculum;
use crate::extraction::handlers as extraction;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Extraction API
        .route("/extract-course", post(extraction::handle_extract_course))
        .route(
            "/extract-capacidades",
            post(extraction::handle_extract_capabilities),
        )
        .route(
            "/extract-conhecimentos",
            post(extraction::handle_extract_knowledge),
        )
        .route("/generate", post(extraction::handle_generate))
        // Curriculum catalog (read-only)
        .route("/courses", get(curriculum::handle_list_courses))
        .route("/courses/:course_id", get(curriculum::handle_get_course))
        .route(
            "/courses/:course_id/units/:unit_id",
            get(curriculum::handle_get_unit),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use httpmock::prelude::*;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::curriculum::Catalog;
    use crate::gemini::GeminiClient;

    const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";
    const PDF: &str = "JVBERi0xLjQ=";
    /// Nothing listens here; used when a request must fail before reaching Gemini.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn app(gemini_base: &str) -> Router {
        let config = Config {
            gemini_api_key: Some("test-key".to_string()),
            gemini_api_base: gemini_base.to_string(),
            port: 0,
            rust_log: "info".to_string(),
            body_limit_bytes: 1024 * 1024,
            curriculum_path: None,
        };
        let state = AppState {
            gemini: GeminiClient::new(config.gemini_api_key.clone(), &config.gemini_api_base)
                .unwrap(),
            catalog: Arc::new(Catalog::embedded().unwrap()),
            config,
        };
        build_router(state)
    }

    async fn send_raw(app: Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        send_raw(app, "POST", uri, Some(body.to_string())).await
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        send_raw(app, "GET", uri, None).await
    }

    fn gemini_reply(text: &str, finish_reason: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": finish_reason
            }]
        })
    }

    fn assert_failure(status: StatusCode, body: &Value, expected: StatusCode) {
        assert_eq!(status, expected, "unexpected status, body: {body}");
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app(UNREACHABLE), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_extract_course_without_pdf_is_bad_request() {
        let (status, body) =
            post_json(app(UNREACHABLE), "/extract-course", json!({ "ucsFromExcel": [] })).await;
        assert_failure(status, &body, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "pdfBase64 is required");
    }

    #[tokio::test]
    async fn test_extract_capabilities_with_empty_units_is_bad_request() {
        let (status, body) = post_json(
            app(UNREACHABLE),
            "/extract-capacidades",
            json!({ "pdfBase64": PDF, "ucs": [] }),
        )
        .await;
        assert_failure(status, &body, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_extract_knowledge_without_units_is_bad_request() {
        let (status, body) = post_json(
            app(UNREACHABLE),
            "/extract-conhecimentos",
            json!({ "pdfBase64": PDF }),
        )
        .await;
        assert_failure(status, &body, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrapped_unpadded_pdf_reaches_gemini_joined() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(GENERATE_PATH)
                    .body_contains("\"data\":\"JVBERi0xLjQKJVBERi0xLjQ\"");
                then.status(200).json_body(gemini_reply(
                    "{\"unidades\": [{\"nome\": \"Redes\", \"capacidades\": []}]}",
                    "STOP",
                ));
            })
            .await;

        let (status, body) = post_json(
            app(&server.base_url()),
            "/extract-capacidades",
            json!({
                "pdfBase64": "JVBERi0xLjQK\r\nJVBERi0xLjQ\n",
                "ucs": [{ "name": "Redes", "nome": "Redes" }]
            }),
        )
        .await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["unidades"][0]["nome"], "Redes");
    }

    #[tokio::test]
    async fn test_generate_without_user_prompt_is_bad_request() {
        let (status, body) = post_json(
            app(UNREACHABLE),
            "/generate",
            json!({ "systemPrompt": "Você é um professor" }),
        )
        .await;
        assert_failure(status, &body, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "userPrompt is required");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, body) = send_raw(
            app(UNREACHABLE),
            "POST",
            "/extract-course",
            Some("{\"pdfBase64\": ".to_string()),
        )
        .await;
        assert_failure(status, &body, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let big = "A".repeat(2 * 1024 * 1024);
        let (status, body) = post_json(
            app(UNREACHABLE),
            "/extract-course",
            json!({ "pdfBase64": big }),
        )
        .await;
        assert_failure(status, &body, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_extract_capabilities_returns_parsed_data() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(GENERATE_PATH)
                    .body_contains("- Banco de Dados (120h)")
                    .body_contains(PDF);
                then.status(200).json_body(gemini_reply(
                    "```json\n{\"unidades\": [{\"nome\": \"Banco de Dados\", \"capacidades\": [{\"codigo\": \"CT1\", \"tipo\": \"tecnica\", \"descricao\": \"Modelar bancos\"}]}]}\n```",
                    "STOP",
                ));
            })
            .await;

        let (status, body) = post_json(
            app(&server.base_url()),
            "/extract-capacidades",
            json!({
                "pdfBase64": PDF,
                "ucs": [{ "nome": "Banco de Dados", "cargaHoraria": 120 }]
            }),
        )
        .await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["unidades"][0]["capacidades"][0]["codigo"], "CT1");
    }

    #[tokio::test]
    async fn test_extract_course_excludes_known_units_in_prompt() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(GENERATE_PATH)
                    .body_contains("ALREADY KNOWN")
                    .body_contains("- Servicos de Rede");
                then.status(200).json_body(gemini_reply(
                    "{\"nome\": \"Técnico em Redes de Computadores\", \"cargaHorariaTotal\": 1200, \"unidadesCurriculares\": []}",
                    "STOP",
                ));
            })
            .await;

        let (status, body) = post_json(
            app(&server.base_url()),
            "/extract-course",
            json!({ "pdfBase64": PDF, "ucsFromExcel": ["Servicos de Rede"] }),
        )
        .await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["cargaHorariaTotal"], 1200);
    }

    #[tokio::test]
    async fn test_extraction_recovers_truncated_output() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(GENERATE_PATH);
                then.status(200).json_body(gemini_reply(
                    "{\"unidades\": [{\"nome\": \"Redes\", \"conhecimentos\": []}, \"Servi",
                    "MAX_TOKENS",
                ));
            })
            .await;

        let (status, body) = post_json(
            app(&server.base_url()),
            "/extract-conhecimentos",
            json!({ "pdfBase64": PDF, "ucs": ["Redes", "Serviços"] }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["unidades"][1], "Servi");
    }

    #[tokio::test]
    async fn test_unrecoverable_output_is_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(GENERATE_PATH);
                then.status(200)
                    .json_body(gemini_reply("{\"unidades\": [{\"nome\": \"Redes\"", "MAX_TOKENS"));
            })
            .await;

        let (status, body) = post_json(
            app(&server.base_url()),
            "/extract-conhecimentos",
            json!({ "pdfBase64": PDF, "ucs": ["Redes"] }),
        )
        .await;

        assert_failure(status, &body, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_generate_returns_raw_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(GENERATE_PATH)
                    .body_contains("\"maxOutputTokens\":32768");
                then.status(200)
                    .json_body(gemini_reply("{\"titulo\": \"Plano de aula\"}", "STOP"));
            })
            .await;

        let (status, body) = post_json(
            app(&server.base_url()),
            "/generate",
            json!({ "systemPrompt": "Você é um professor", "userPrompt": "Crie um plano de aula" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["content"], "{\"titulo\": \"Plano de aula\"}");
    }

    #[tokio::test]
    async fn test_generate_fails_on_max_tokens() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(GENERATE_PATH);
                then.status(200).json_body(gemini_reply("{\"titulo\": \"Pla", "MAX_TOKENS"));
            })
            .await;

        let (status, body) = post_json(
            app(&server.base_url()),
            "/generate",
            json!({ "systemPrompt": "s", "userPrompt": "u", "maxTokens": 16 }),
        )
        .await;

        assert_failure(status, &body, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("truncated"));
    }

    #[tokio::test]
    async fn test_safety_block_is_server_error_on_every_gemini_endpoint() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(GENERATE_PATH);
                then.status(200)
                    .json_body(json!({ "candidates": [{ "finishReason": "SAFETY" }] }));
            })
            .await;

        let requests = [
            ("/extract-course", json!({ "pdfBase64": PDF })),
            ("/extract-capacidades", json!({ "pdfBase64": PDF, "ucs": ["Redes"] })),
            ("/extract-conhecimentos", json!({ "pdfBase64": PDF, "ucs": ["Redes"] })),
            ("/generate", json!({ "systemPrompt": "s", "userPrompt": "u" })),
        ];

        let app = app(&server.base_url());
        for (uri, request) in requests {
            let (status, body) = post_json(app.clone(), uri, request).await;
            assert_failure(status, &body, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(
                body["error"].as_str().unwrap().contains("safety"),
                "{uri}: {body}"
            );
        }
    }

    #[tokio::test]
    async fn test_upstream_error_message_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(GENERATE_PATH);
                then.status(403).json_body(json!({
                    "error": { "code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED" }
                }));
            })
            .await;

        let (status, body) = post_json(
            app(&server.base_url()),
            "/extract-course",
            json!({ "pdfBase64": PDF }),
        )
        .await;

        assert_failure(status, &body, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("Permission denied"));
    }

    #[tokio::test]
    async fn test_list_courses() {
        let (status, body) = get_json(app(UNREACHABLE), "/courses").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let courses = body["data"].as_array().unwrap();
        assert!(!courses.is_empty());
        assert!(courses[0]["unitCount"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_get_course_and_unit() {
        let (status, body) =
            get_json(app(UNREACHABLE), "/courses/tec-desenvolvimento-sistemas").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalHours"], 1200);

        let (status, body) = get_json(
            app(UNREACHABLE),
            "/courses/tec-desenvolvimento-sistemas/units/uc-banco-dados",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Banco de Dados");
        assert_eq!(body["data"]["capabilities"][0]["code"], "CT1");
    }

    #[tokio::test]
    async fn test_unknown_course_is_not_found() {
        let (status, body) = get_json(app(UNREACHABLE), "/courses/nope").await;
        assert_failure(status, &body, StatusCode::NOT_FOUND);

        let (status, body) = get_json(
            app(UNREACHABLE),
            "/courses/tec-desenvolvimento-sistemas/units/nope",
        )
        .await;
        assert_failure(status, &body, StatusCode::NOT_FOUND);
    }
}
