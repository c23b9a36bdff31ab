// Assistant reply markup - normalization and sanitizing

use regex::Regex;

/// Whether a reply looks like markup rather than plain text
pub fn contains_markup(reply: &str) -> bool {
    reply.contains('<') && reply.contains('>')
}

/// Normalize a raw reply for display.
///
/// Literal `\n` sequences become newlines, submit inputs are dropped, and a
/// complete HTML document is reduced to its body content.
pub fn normalize_reply(raw: &str) -> String {
    let normalized = raw.replace("\\n", "\n");
    if !contains_markup(&normalized) {
        return normalized;
    }

    let mut cleaned = match Regex::new(r#"(?i)<input[^>]*type=["']submit["'][^>]*>"#) {
        Ok(re) => re.replace_all(&normalized, "").into_owned(),
        Err(_) => normalized,
    };

    if cleaned.contains("<!DOCTYPE") || cleaned.contains("<html") {
        if let Some(body) = extract_body(&cleaned) {
            cleaned = body;
        }
    }

    cleaned
}

/// Inner content of the `<body>` element, if present
pub fn extract_body(document: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<body[^>]*>(.*?)</body>").ok()?;
    re.captures(document)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Sanitize untrusted reply markup for the browser.
///
/// Scripts, styles and event handler attributes are removed. Forms, radio
/// inputs and labels survive so embedded questions still render.
pub fn sanitize(html: &str) -> String {
    let mut builder = ammonia::Builder::default();
    builder
        .add_tags(&["form", "input", "label", "fieldset", "legend"])
        .add_tag_attributes("input", &["type", "name", "value", "id", "checked"])
        .add_tag_attributes("label", &["for"])
        .add_generic_attributes(&["class"]);
    builder.clean(html).to_string()
}
