use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::protocol::{Response, StatusCode};

pub const NOT_FOUND_TEMPLATE: &str = "404.html";

/// Static GET routes mapped to template files.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: BTreeMap<String, String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes served out of the box
    pub fn with_defaults() -> Self {
        let mut router = Self::new();
        router.add_route("/", "index.html");
        router
    }

    /// Register a route; an existing route keeps its template.
    pub fn add_route(&mut self, path: &str, template: &str) -> bool {
        if self.routes.contains_key(path) {
            warn!("A route for {:?} already exists", path);
            return false;
        }
        self.routes.insert(path.to_string(), template.to_string());
        true
    }

    pub fn search_route(&self, path: &str) -> Option<&str> {
        self.routes.get(path).map(String::as_str)
    }

    pub fn list_routes(&self) {
        for (path, template) in &self.routes {
            info!("{} -> {}", path, template);
        }
    }

    /// Serve the template for `path`, or `404.html` (plain 404 if absent).
    pub async fn render(&self, templates: &Path, path: &str) -> Response {
        if let Some(template) = self.search_route(path) {
            match tokio::fs::read(templates.join(template)).await {
                Ok(body) => return Response::html(body),
                Err(e) => warn!("Error opening template {}: {}", template, e),
            }
        }

        debug!("No template for {}", path);
        match tokio::fs::read(templates.join(NOT_FOUND_TEMPLATE)).await {
            Ok(body) => Response::html(body).with_status(StatusCode::NotFound),
            Err(_) => Response::not_found(),
        }
    }
}
