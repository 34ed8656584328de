use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::config::RendererKind;
use crate::error::ApiError;

/// Turns a named view plus its data into a response.
///
/// Page handlers only decide which view and what data; the markup is the
/// renderer's business.
pub trait Renderer: Send + Sync {
    fn render(&self, view: &str, context: Value) -> Result<Response, ApiError>;
}

pub fn renderer_for(kind: RendererKind) -> Arc<dyn Renderer> {
    match kind {
        RendererKind::Html => Arc::new(HtmlRenderer),
        RendererKind::Json => Arc::new(JsonRenderer),
    }
}

/// `302 Found` to `location`
pub fn redirect(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// HTML document shell with the view data embedded as a JSON island
/// (`<script type="application/json" id="view-data">`) for the page script.
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(&self, view: &str, context: Value) -> Result<Response, ApiError> {
        let data = serde_json::to_string(&context)
            .map_err(|e| ApiError::render(format!("failed to serialize view '{}': {}", view, e)))?;
        let view = escape_html(view);

        let page = format!(
            "<!DOCTYPE html>\n\
             <html lang=\"en\">\n\
             <head><meta charset=\"utf-8\"><title>{view}</title></head>\n\
             <body data-view=\"{view}\">\n\
             <main id=\"app\"></main>\n\
             <script type=\"application/json\" id=\"view-data\">{data}</script>\n\
             </body>\n\
             </html>\n",
            view = view,
            data = escape_script_json(&data),
        );
        Ok(Html(page).into_response())
    }
}

/// `{"view": ..., "data": ...}`, for API clients and tests
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, view: &str, context: Value) -> Result<Response, ApiError> {
        Ok(Json(json!({ "view": view, "data": context })).into_response())
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// JSON stays valid with these escapes and cannot close the script element
fn escape_script_json(s: &str) -> String {
    s.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}
