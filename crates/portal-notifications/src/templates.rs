use std::collections::HashMap;

use crate::adapters::RenderedContent;
use crate::error::NotificationError;

/// Values substituted into a template, keyed by placeholder name.
pub type TemplateData = HashMap<String, serde_json::Value>;

const SECTION_OPEN: &str = "{{#if ";
const SECTION_CLOSE: &str = "{{/if}}";

/// Template renderer using `{{variable}}` placeholders.
///
/// A `{{#if key}}...{{/if}}` section is kept only when `key` holds a
/// non-empty value. Sections do not nest. Substituted values are
/// HTML-escaped in the HTML body and inserted verbatim elsewhere.
pub struct TemplateRenderer {
    templates: HashMap<String, Template>,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub id: String,
    pub subject: Option<String>,
    pub body: String,
    pub html_body: Option<String>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// A renderer with every [`PortalTemplate`](crate::PortalTemplate) registered.
    pub fn with_portal_templates() -> Self {
        let mut renderer = Self::new();
        for template in crate::catalog::portal_templates() {
            renderer.register(template);
        }
        renderer
    }

    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, template_id: &str) -> Option<&Template> {
        self.templates.get(template_id)
    }

    pub fn render(
        &self,
        template_id: &str,
        data: &TemplateData,
    ) -> Result<RenderedContent, NotificationError> {
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| NotificationError::TemplateNotFound(template_id.to_string()))?;

        let subject = template
            .subject
            .as_ref()
            .map(|s| self.render_string(s, data, false));
        let body = self.render_string(&template.body, data, false);
        let html_body = template
            .html_body
            .as_ref()
            .map(|s| self.render_string(s, data, true));

        Ok(RenderedContent {
            subject,
            body,
            html_body,
        })
    }

    /// Fills placeholders in one pass over the template, so substituted
    /// values are never scanned for placeholders themselves. Unknown
    /// placeholders are left as written.
    fn render_string(&self, template: &str, data: &TemplateData, escape: bool) -> String {
        let template = render_sections(template, data);
        let mut out = String::with_capacity(template.len());
        let mut rest = template.as_str();

        while let Some(start) = rest.find("{{") {
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                break;
            };

            out.push_str(&rest[..start]);
            match data.get(&after_open[..end]) {
                Some(value) if escape => out.push_str(&escape_html(&value_text(value))),
                Some(value) => out.push_str(&value_text(value)),
                None => out.push_str(&rest[start..start + end + 4]),
            }
            rest = &after_open[end + 2..];
        }

        out.push_str(rest);
        out
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn render_sections(template: &str, data: &TemplateData) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(SECTION_OPEN) {
        let after_open = &rest[start + SECTION_OPEN.len()..];
        let Some(key_end) = after_open.find("}}") else {
            break;
        };
        let inner = &after_open[key_end + 2..];
        let Some(close) = inner.find(SECTION_CLOSE) else {
            break;
        };

        out.push_str(&rest[..start]);
        let key = after_open[..key_end].trim();
        if is_present(data.get(key)) {
            out.push_str(&inner[..close]);
        }
        rest = &inner[close + SECTION_CLOSE.len()..];
    }

    out.push_str(rest);
    out
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_present(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => false,
        Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
