//! Template engine for notification emails using Jinja2 syntax.
//!
//! Templates live in `templates/email/` and are embedded at compile time, so
//! rendering does not depend on the working directory.

use minijinja::{Environment, Value};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Global template environment
static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    (
        "email/new_report.jinja",
        include_str!("../../../templates/email/new_report.jinja"),
    ),
    (
        "email/new_report_subject.jinja",
        include_str!("../../../templates/email/new_report_subject.jinja"),
    ),
    (
        "email/report_approved.jinja",
        include_str!("../../../templates/email/report_approved.jinja"),
    ),
    (
        "email/report_approved_subject.jinja",
        include_str!("../../../templates/email/report_approved_subject.jinja"),
    ),
];

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    for (name, source) in EMBEDDED_TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        }
    }

    env
}

/// Get the global template environment
fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render a template with the given context.
///
/// `template_name` is relative to `templates/` (e.g. "email/new_report.jinja").
pub fn render_template(
    template_name: &str,
    ctx: &HashMap<&str, Value>,
) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    let render_ctx = Value::from_iter(ctx.iter().map(|(k, v)| (*k, v.clone())));

    template
        .render(render_ctx)
        .map(|rendered| rendered.trim().to_string())
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}
