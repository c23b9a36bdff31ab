// Embedded-question detector - finds single-choice questions in reply markup
//
// Read-only scan of a parsed fragment. Nothing in the markup is executed.

use crate::models::EmbeddedQuestion;
use scraper::{Html, Selector};
use serde::Serialize;

use super::html::{contains_markup, normalize_reply, sanitize};

const DEFAULT_PROMPT: &str = "Please select an option:";
const DEFAULT_OPTION: &str = "Option";

/// A reply split into display text, sanitized markup and any embedded question
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReply {
    pub clean_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<EmbeddedQuestion>,
}

/// Cheap textual check for markup that may carry a question
pub fn may_contain_question(reply: &str) -> bool {
    reply.contains("<form>") || reply.contains("<input type=\"radio\"")
}

/// Detect a single-choice question in an HTML fragment
pub fn detect_question(html: &str) -> Option<EmbeddedQuestion> {
    let fragment = Html::parse_fragment(html);
    let radio_selector = Selector::parse(r#"input[type="radio"]"#).ok()?;

    let radios: Vec<_> = fragment.select(&radio_selector).collect();
    if radios.is_empty() {
        return None;
    }

    let question = question_label(&fragment);

    let label_selector = Selector::parse("label[for]").ok()?;
    let labels: Vec<(String, String)> = fragment
        .select(&label_selector)
        .filter_map(|label| {
            let target = label.value().attr("for")?;
            Some((target.to_string(), label.text().collect::<String>().trim().to_string()))
        })
        .collect();

    let options: Vec<String> = radios
        .iter()
        .map(|input| {
            let id = input.value().attr("id").unwrap_or_default();
            if !id.is_empty() {
                if let Some((_, text)) = labels.iter().find(|(target, _)| target == id) {
                    return text.clone();
                }
            }
            input
                .value()
                .attr("value")
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_OPTION)
                .to_string()
        })
        .collect();

    Some(EmbeddedQuestion { question, options })
}

fn question_label(fragment: &Html) -> String {
    if let Ok(title_selector) = Selector::parse(".question-title, h3, .question") {
        if let Some(title) = fragment.select(&title_selector).next() {
            return title.text().collect::<String>().trim().to_string();
        }
    }

    let text: String = fragment.root_element().text().collect();
    let lines: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .find(|line| line.contains('?'))
        .or_else(|| lines.first())
        .map(|line| line.to_string())
        .unwrap_or_else(|| DEFAULT_PROMPT.to_string())
}

/// Parse a raw assistant reply.
///
/// When a question is found its label becomes the display text. Otherwise the
/// display text is the normalized reply. `fallback` is a backend-supplied
/// question used when the markup yields none.
pub fn parse_reply(raw: &str, fallback: Option<EmbeddedQuestion>) -> ParsedReply {
    let normalized = normalize_reply(raw);

    let detected = if may_contain_question(&normalized) {
        detect_question(&normalized)
    } else {
        None
    };
    let question = detected.or(fallback);

    let html = if contains_markup(&normalized) {
        Some(sanitize(&normalized))
    } else {
        None
    };

    let clean_message = match &question {
        Some(q) if html.is_some() => q.question.clone(),
        _ => normalized,
    };

    ParsedReply {
        clean_message,
        html,
        question,
    }
}
