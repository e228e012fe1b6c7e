//! HTML page rendering.
//!
//! Pages are plain HTML files with a single `{{ predictions }}` marker. The
//! marker is replaced by a result fragment when a prediction exists and
//! removed otherwise.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::core::{PredictResult, PredictionResult, PredictorError};

/// Name of the form page template.
pub const INDEX_TEMPLATE: &str = "index.html";

const PREDICTION_MARKER: &str = "{{ predictions }}";

const BUILTIN_INDEX: &str = include_str!("../../templates/index.html");

/// Template rendering service
#[derive(Debug, Clone)]
pub struct PageRenderer {
    templates_dir: PathBuf,
}

impl PageRenderer {
    /// Create a renderer reading templates from `templates_dir`
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    /// Render `name`, binding `predictions` when present.
    pub async fn render(
        &self,
        name: &str,
        predictions: Option<PredictionResult>,
    ) -> PredictResult<String> {
        let template = self.load(name).await?;
        Ok(fill_template(&template, predictions))
    }

    async fn load(&self, name: &str) -> PredictResult<Cow<'static, str>> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(PredictorError::Template(format!(
                "invalid template name {:?}",
                name
            )));
        }

        let path = self.templates_dir.join(name);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Cow::Owned(content)),
            Err(e) if e.kind() == ErrorKind::NotFound && name == INDEX_TEMPLATE => {
                debug!(path = %path.display(), "Template not found, using built-in page");
                Ok(Cow::Borrowed(BUILTIN_INDEX))
            }
            Err(e) => Err(PredictorError::Template(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

fn fill_template(template: &str, predictions: Option<PredictionResult>) -> String {
    let fragment = predictions
        .map(|value| {
            format!(
                r#"<p class="prediction">Predicted birth weight: <strong>{}</strong></p>"#,
                value
            )
        })
        .unwrap_or_default();

    template.replace(PREDICTION_MARKER, &fragment)
}

/// Standalone error page; `message` is escaped.
pub fn render_error_page(code: u16, reason: &str, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{code} {reason}</title></head>\n\
         <body>\n<h1>{code} {reason}</h1>\n<p class=\"error\">{message}</p>\n<p><a href=\"/\">Back to the form</a></p>\n</body>\n</html>\n",
        code = code,
        reason = escape_html(reason),
        message = escape_html(message),
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_form_page_without_prediction() {
        let renderer = PageRenderer::new("does-not-exist");
        let page = renderer.render(INDEX_TEMPLATE, None).await.unwrap();

        assert!(page.contains("<form"));
        assert!(!page.contains(PREDICTION_MARKER));
        assert!(!page.contains("class=\"prediction\""));
    }

    #[tokio::test]
    async fn test_prediction_is_bound() {
        let renderer = PageRenderer::new("does-not-exist");
        let result = PredictionResult::from_raw(3456.789).unwrap();
        let page = renderer.render(INDEX_TEMPLATE, Some(result)).await.unwrap();

        assert!(page.contains("<strong>3456.79</strong>"));
    }

    #[tokio::test]
    async fn test_template_directory_overrides_builtin() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(INDEX_TEMPLATE), "custom {{ predictions }}").unwrap();

        let renderer = PageRenderer::new(dir.path());
        let result = PredictionResult::from_raw(7.0).unwrap();
        let page = renderer.render(INDEX_TEMPLATE, Some(result)).await.unwrap();

        assert!(page.starts_with("custom <p class=\"prediction\">"));
        assert!(page.contains("7.00"));
    }

    #[tokio::test]
    async fn test_unknown_or_unsafe_template_names() {
        let renderer = PageRenderer::new("templates");
        assert!(renderer.render("missing.html", None).await.is_err());
        assert!(matches!(
            renderer.render("../Cargo.toml", None).await,
            Err(PredictorError::Template(_))
        ));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let page = render_error_page(422, "Unprocessable Entity", "value \"<b>\" & more");
        assert!(page.contains("422 Unprocessable Entity"));
        assert!(page.contains("value &quot;&lt;b&gt;&quot; &amp; more"));
        assert!(!page.contains("<b>"));
    }
}
