use std::collections::HashMap;

use crate::error::{AppError, Context, Result};

pub struct RequestContext<'a> {
    pub base_url: &'a str,
    pub api_key: &'a str,
    pub extras: &'a [(&'a str, String)],
}

/// Fill a URL template with the base URL, the API key and any endpoint-specific values.
pub fn prepare_url(template: &str, context: RequestContext<'_>) -> Result<String> {
    let mut replacements: HashMap<String, String> = HashMap::new();
    replacements.insert(
        "base_url".to_string(),
        context.base_url.trim_end_matches('/').to_string(),
    );
    replacements.insert("api_key".to_string(), context.api_key.to_string());

    for (key, value) in context.extras {
        replacements.insert((*key).to_string(), value.clone());
    }

    render_template(template, &replacements)
}

/// Comma-joined symbol list as the provider expects it in paths and queries.
pub fn join_symbols(symbols: &[String]) -> String {
    symbols.join(",")
}

/// Replace `${NAME}` with the value of the environment variable `NAME`.
pub fn expand_env_vars(value: &str) -> Result<String> {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            while let Some(&next) = chars.peek() {
                chars.next();
                if next == '}' {
                    closed = true;
                    break;
                }
                name.push(next);
            }

            if name.is_empty() {
                return Err(AppError::message(
                    "Encountered empty environment placeholder in API key",
                ));
            }

            if !closed {
                return Err(AppError::message(
                    "Unterminated environment placeholder in API key",
                ));
            }

            let value = std::env::var(&name).with_context(|| {
                format!("Environment variable {} required for the API key is not set", name)
            })?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

pub fn render_template(template: &str, replacements: &HashMap<String, String>) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '{' {
            let mut key = String::new();
            let mut closed = false;
            while let Some(&next) = chars.peek() {
                chars.next();
                if next == '}' {
                    closed = true;
                    break;
                }
                key.push(next);
            }

            if !closed {
                return Err(AppError::message(format!(
                    "Unterminated placeholder in template: {{{key}"
                )));
            }

            if key.is_empty() {
                return Err(AppError::message(
                    "Encountered empty placeholder `{}` in template",
                ));
            }

            let value = replacements.get(&key).ok_or_else(|| {
                AppError::message(format!(
                    "No replacement provided for placeholder `{}` in template",
                    key
                ))
            })?;
            result.push_str(value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Placeholders a template refers to, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        found.push(&after[..end]);
        rest = &after[end + 1..];
    }
    found
}
