use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use core_lib::domain::staffing_request::RequestSummary;
use rust_embed::RustEmbed;

use super::{ApplicationError, forms::FieldErrors};

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
#[include = "assets/*"]
struct Templates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// One-line user-facing message shown above a form or listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn messages_html(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| {
            let class = match message.level {
                Level::Success => "message success",
                Level::Error => "message error",
            };
            format!(
                r#"<p class="{class}">{}</p>"#,
                escape_html(&message.text)
            )
        })
        .collect()
}

fn errors_html(errors: &FieldErrors) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|(field, text)| {
            format!(
                "<li><strong>{}</strong>: {}</li>",
                escape_html(field),
                escape_html(text)
            )
        })
        .collect();
    format!(r#"<ul class="errors">{items}</ul>"#)
}

fn rows_html(rows: &[RequestSummary]) -> String {
    if rows.is_empty() {
        return r#"<tr><td colspan="6">Nenhuma solicitação encontrada.</td></tr>"#.to_string();
    }
    rows.iter()
        .map(|row| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                row.request.created_at.format("%d/%m/%Y %H:%M"),
                escape_html(&row.client_name),
                escape_html(&row.provider_name),
                escape_html(&row.request.professional_type),
                escape_html(&row.request.shift),
                escape_html(&row.request.notes),
            )
        })
        .collect()
}

/// Replaces each `{{key}}` in `template` with its pre-escaped value in a
/// single pass. Inserted values are never scanned again; unknown slots are
/// kept as written.
fn fill(template: &str, vars: &[(&str, String)]) -> String {
    let mut html = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        html.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            html.push_str(&rest[start..]);
            return html;
        };
        let key = &after_open[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => html.push_str(value),
            None => html.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }
    html.push_str(rest);
    html
}

/// Loads `name` and fills its `{{key}}` slots.
fn render(name: &str, vars: &[(&str, String)]) -> Result<String, ApplicationError> {
    let file = Templates::get(name)
        .ok_or_else(|| ApplicationError::Template(format!("{name} is not embedded")))?;
    let template = std::str::from_utf8(&file.data)
        .map_err(|e| ApplicationError::Template(format!("{name}: {e}")))?;
    Ok(fill(template, vars))
}

fn page(
    status: StatusCode,
    name: &str,
    vars: &[(&str, String)],
) -> Result<Response, ApplicationError> {
    Ok((status, Html(render(name, vars)?)).into_response())
}

pub fn login_page(status: StatusCode, messages: &[Message]) -> Result<Response, ApplicationError> {
    page(status, "login.html", &[("messages", messages_html(messages))])
}

pub fn registration_page(
    status: StatusCode,
    messages: &[Message],
    errors: &FieldErrors,
) -> Result<Response, ApplicationError> {
    page(
        status,
        "cadastro.html",
        &[
            ("messages", messages_html(messages)),
            ("errors", errors_html(errors)),
        ],
    )
}

pub fn add_token_page(
    status: StatusCode,
    messages: &[Message],
    errors: &FieldErrors,
) -> Result<Response, ApplicationError> {
    page(
        status,
        "add_token.html",
        &[
            ("messages", messages_html(messages)),
            ("errors", errors_html(errors)),
        ],
    )
}

pub fn new_request_page(
    status: StatusCode,
    messages: &[Message],
    errors: &FieldErrors,
) -> Result<Response, ApplicationError> {
    page(
        status,
        "nova_solicitacao.html",
        &[
            ("messages", messages_html(messages)),
            ("errors", errors_html(errors)),
        ],
    )
}

pub fn request_list_page(
    full_name: &str,
    messages: &[Message],
    rows: &[RequestSummary],
) -> Result<Response, ApplicationError> {
    page(
        StatusCode::OK,
        "listar_solicitacoes.html",
        &[
            ("full_name", escape_html(full_name)),
            ("messages", messages_html(messages)),
            ("rows", rows_html(rows)),
        ],
    )
}

/// Serves files embedded under `templates/assets/`.
pub fn embedded_asset(path: &str) -> Response {
    if !path.starts_with("assets/") {
        return (StatusCode::NOT_FOUND, "404 Not Found").into_response();
    }
    match Templates::get(path) {
        Some(content) => {
            let mime_type = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime_type.to_string())],
                content.data,
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}
