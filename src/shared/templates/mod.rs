//! Email templates for the notification side-channel.

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::Value;
use std::collections::HashMap;

/// Subject and plain-text body of an email
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

fn render_pair(
    subject_template: &str,
    body_template: &str,
    ctx: &HashMap<&str, Value>,
) -> Result<RenderedEmail, TemplateError> {
    Ok(RenderedEmail {
        subject: render_template(subject_template, ctx)?,
        body: render_template(body_template, ctx)?,
    })
}

/// Email sent to the moderators when a report is submitted
pub fn render_new_report_email(
    titulo: &str,
    categoria: &str,
    local: &str,
    descricao: &str,
    autor: Option<&str>,
    admin_url: &str,
) -> Result<RenderedEmail, TemplateError> {
    let mut ctx: HashMap<&str, Value> = HashMap::new();
    ctx.insert("titulo", Value::from(titulo));
    ctx.insert("categoria", Value::from(categoria));
    ctx.insert("local", Value::from(local));
    ctx.insert("descricao", Value::from(descricao));
    ctx.insert("autor", Value::from(autor));
    ctx.insert("admin_url", Value::from(admin_url));

    render_pair(
        "email/new_report_subject.jinja",
        "email/new_report.jinja",
        &ctx,
    )
}

/// Email sent to the owner of a report once it is approved
pub fn render_report_approved_email(
    nome: &str,
    titulo: &str,
    relato_url: &str,
) -> Result<RenderedEmail, TemplateError> {
    let mut ctx: HashMap<&str, Value> = HashMap::new();
    ctx.insert("nome", Value::from(nome));
    ctx.insert("titulo", Value::from(titulo));
    ctx.insert("relato_url", Value::from(relato_url));

    render_pair(
        "email/report_approved_subject.jinja",
        "email/report_approved.jinja",
        &ctx,
    )
}
