//! HTML rendering for the timeline page.

use minijinja::Environment;
use rust_embed::RustEmbed;

use crate::enrich::types::EnrichedBatch;
use crate::error_handling::types::WebError;
use crate::web_interface::types::TimelineContext;

/// Static assets (template, CSS, JS) compiled into the binary.
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Assets;

const TIMELINE_TEMPLATE: &str = "timeline.html";

/// Render the enriched batch through the embedded timeline template.
pub fn render_timeline(batch: &EnrichedBatch) -> Result<String, WebError> {
    let asset = Assets::get(TIMELINE_TEMPLATE)
        .ok_or_else(|| WebError::MissingAsset(TIMELINE_TEMPLATE.to_string()))?;
    let template_src = std::str::from_utf8(asset.data.as_ref())
        .map_err(|e| WebError::TemplateError(e.to_string()))?
        .to_string();

    // Registered under its .html name so the environment's auto-escape
    // callback kicks in: field values come straight out of the log and must
    // not reach the page as markup.
    let mut env = Environment::new();
    env.add_template(TIMELINE_TEMPLATE, &template_src)
        .map_err(|e| WebError::TemplateError(e.to_string()))?;
    let template = env
        .get_template(TIMELINE_TEMPLATE)
        .map_err(|e| WebError::TemplateError(e.to_string()))?;

    let context = TimelineContext::from_batch(batch);
    template
        .render(minijinja::Value::from_serialize(&context))
        .map_err(|e| WebError::TemplateError(e.to_string()))
}

/// A minimal message page for empty batches and exhausted sources.
/// Both strings may embed raw log content (error text carries the offending
/// line), so they are escaped here.
pub fn render_message(title: &str, message: &str) -> String {
    format!(
        r#"<html><head><title>Conn Flow Timeline</title></head>
            <body><h1>{}</h1><p>{}</p></body></html>"#,
        escape_html(title),
        escape_html(message)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::color::RandomColors;
    use crate::enrich::layout::enrich;
    use crate::enrich::types::ColorMode;
    use crate::reader::{read_conn_log, MalformedPolicy};

    fn sample_batch() -> EnrichedBatch {
        let input = "\
            100 C1 10.0.0.1 50000 10.0.0.2 80 tcp http 5 - - SF - - 0 - 1 1 1 1 -\n\
            103 C2 10.0.0.1 50001 10.0.0.2 443 tcp ssl 2 - - SF - - 0 - 1 1 1 1 -\n";
        let records = read_conn_log(input, MalformedPolicy::Abort).unwrap().records;
        let mut colors = RandomColors::seeded(3);
        enrich(&records, 0.0, ColorMode::PerPair, &mut colors).unwrap()
    }

    #[test]
    fn timeline_page_contains_bars_and_labels() {
        let html = render_timeline(&sample_batch()).unwrap();
        assert!(html.contains("10.0.0.1:50000"));
        assert!(html.contains("10.0.0.2:443"));
        assert!(html.contains("background-color: #"));
        // Longest flow spans the full width scale.
        assert!(html.contains("width: 100"));
        assert!(html.contains("/assets/style.css"));
        assert!(html.contains("/assets/timeline.js"));
    }

    #[test]
    fn embedded_assets_are_present() {
        assert!(Assets::get("timeline.html").is_some());
        assert!(Assets::get("style.css").is_some());
        assert!(Assets::get("timeline.js").is_some());
    }

    #[test]
    fn message_page_carries_title_and_body() {
        let html = render_message("Nothing to show", "The log was empty.");
        assert!(html.contains("<h1>Nothing to show</h1>"));
        assert!(html.contains("The log was empty."));
    }

    #[test]
    fn log_content_is_escaped_in_the_timeline_page() {
        // A hostile log controls most record fields; none of them may reach
        // the page as markup.
        let input = concat!(
            r#"{"ts": 100.0, "uid": "C1", "id.orig_h": "<script>alert(1)</script>", "#,
            r#""id.orig_p": 1, "id.resp_h": "10.0.0.2", "id.resp_p": 80, "#,
            r#""proto": "tcp", "service": "\"><img src=x>", "duration": 1.0}"#,
        );
        let records = read_conn_log(input, MalformedPolicy::Abort).unwrap().records;
        let mut colors = RandomColors::seeded(3);
        let batch = enrich(&records, 0.0, ColorMode::PerPair, &mut colors).unwrap();

        let html = render_timeline(&batch).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(!html.contains("<img src=x>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn message_page_escapes_error_text() {
        let html = render_message("Render failed", "bad line: <script>alert(1)</script>");
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }
}
