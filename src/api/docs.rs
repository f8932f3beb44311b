//! API documentation
//!
//! An OpenAPI document generated from the payload types, and a small HTML
//! page linking to it.

use schemars::gen::SchemaSettings;
use serde_json::{json, Map, Value};

use crate::models::{
    AnalysisRequest, AnalysisResult, HealthResponse, OptimizationRequest, OptimizationResult,
};
use crate::service::VERSION;

const TITLE: &str = "PromptAssist API";
const DESCRIPTION: &str = "AI-powered prompt analysis and optimization service";

/// (method, path, summary)
const ROUTES: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Health check"),
    ("GET", "/metrics", "Prometheus metrics"),
    ("POST", "/api/prompt/analyze", "Analyze a prompt and return issues and quality score"),
    ("POST", "/api/prompt/optimize", "Optimize a prompt using AI"),
    ("DELETE", "/api/cache/clear", "Clear cache entries matching a pattern"),
    ("GET", "/ws/prompt-assist", "WebSocket for real-time prompt analysis"),
];

/// Build the OpenAPI 3 document
pub fn openapi_document() -> Value {
    let mut generator = SchemaSettings::openapi3().into_generator();

    let analysis_request = generator.subschema_for::<AnalysisRequest>();
    let analysis_result = generator.subschema_for::<AnalysisResult>();
    let optimization_request = generator.subschema_for::<OptimizationRequest>();
    let optimization_result = generator.subschema_for::<OptimizationResult>();
    let health = generator.subschema_for::<HealthResponse>();
    let schemas = generator.take_definitions();

    let error = json!({
        "description": "Error",
        "content": {"application/json": {"schema": {
            "type": "object",
            "properties": {"detail": {"type": "string"}, "message": {"type": "string"}}
        }}}
    });

    let mut paths = Map::new();
    paths.insert(
        "/health".to_string(),
        json!({"get": {
            "summary": "Health check",
            "responses": {"200": {"description": "Service health", "content": {"application/json": {"schema": health}}}}
        }}),
    );
    paths.insert(
        "/metrics".to_string(),
        json!({"get": {
            "summary": "Prometheus metrics",
            "responses": {"200": {"description": "Text exposition format", "content": {"text/plain": {}}}}
        }}),
    );
    paths.insert(
        "/api/prompt/analyze".to_string(),
        json!({"post": {
            "summary": "Analyze a prompt and return issues and quality score",
            "requestBody": {"required": true, "content": {"application/json": {"schema": analysis_request}}},
            "responses": {
                "200": {"description": "Analysis result", "content": {"application/json": {"schema": analysis_result}}},
                "400": error,
                "422": error,
                "500": error
            }
        }}),
    );
    paths.insert(
        "/api/prompt/optimize".to_string(),
        json!({"post": {
            "summary": "Optimize a prompt using AI",
            "requestBody": {"required": true, "content": {"application/json": {"schema": optimization_request}}},
            "responses": {
                "200": {"description": "Optimization result", "content": {"application/json": {"schema": optimization_result}}},
                "400": error,
                "422": error,
                "503": error,
                "500": error
            }
        }}),
    );
    paths.insert(
        "/api/cache/clear".to_string(),
        json!({"delete": {
            "summary": "Clear cache entries matching a pattern",
            "parameters": [{"name": "pattern", "in": "query", "required": false, "schema": {"type": "string", "default": "*"}}],
            "responses": {"200": {"description": "Entries cleared"}}
        }}),
    );

    json!({
        "openapi": "3.0.3",
        "info": {"title": TITLE, "description": DESCRIPTION, "version": VERSION},
        "paths": paths,
        "components": {"schemas": schemas},
    })
}

/// Render the HTML documentation page
pub fn docs_page() -> String {
    let rows: String = ROUTES
        .iter()
        .map(|(method, path, summary)| {
            format!(
                "<tr><td><code>{}</code></td><td><code>{}</code></td><td>{}</td></tr>",
                method, path, summary
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html><html><head><title>{title}</title></head><body>\
         <h1>{title} <small>{version}</small></h1><p>{description}</p>\
         <table><thead><tr><th>Method</th><th>Path</th><th>Summary</th></tr></thead>\
         <tbody>{rows}</tbody></table>\
         <p>Machine-readable schema: <a href=\"/openapi.json\">/openapi.json</a></p>\
         </body></html>",
        title = TITLE,
        version = VERSION,
        description = DESCRIPTION,
        rows = rows
    )
}
