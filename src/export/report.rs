// HTML assessment report rendered with Tera

use super::ExportError;
use crate::config::ReportSettings;
use crate::consultation::ConsultationView;
use crate::models::ConversationTurn;
use chrono::{DateTime, Local};
use tera::{Context, Tera};

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{ tool_title }} Assessment Report</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 20px; line-height: 1.6; }
    .header { border-bottom: 2px solid {{ accent }}; padding-bottom: 10px; margin-bottom: 20px; }
    .stakeholder-info { background: #f0f9ff; padding: 15px; border-radius: 8px; margin-bottom: 20px; color: black; }
    .assessment-content { margin-bottom: 20px; color: black; }
    h1 { color: {{ accent }}; }
    h2 { color: #374151; border-bottom: 1px solid #e5e7eb; padding-bottom: 5px; }
    .timestamp { color: #6b7280; font-size: 0.9em; }
  </style>
</head>
<body>
  <div class="header">
    <h1>{{ organisation }} {{ tool_title }} Assessment Report</h1>
    <p class="timestamp">Generated on: {{ generated_on | safe }}</p>
  </div>

  <div class="stakeholder-info">
    <h2>Stakeholder Information</h2>
    <p><strong>Name:</strong> {{ stakeholder.name }}</p>
    <p><strong>Role:</strong> {{ stakeholder.role }}</p>
    <p><strong>Department:</strong> {{ stakeholder.department }}</p>
    {% if stakeholder.email %}<p><strong>Email:</strong> {{ stakeholder.email }}</p>{% endif %}
  </div>

  <div class="assessment-content">
    <h2>{{ persona }}'s Assessment</h2>
    <div>{{ assessment | safe }}</div>
  </div>
</body>
</html>
"#;

/// Assessment body: sanitized markup when present, otherwise escaped text,
/// with newlines turned into line breaks
fn assessment_body(turn: &ConversationTurn) -> String {
    let body = match &turn.html {
        Some(html) => html.clone(),
        None => tera::escape_html(&turn.text),
    };
    body.replace('\n', "<br>")
}

pub fn render_report(
    view: &ConsultationView,
    turn: &ConversationTurn,
    settings: &ReportSettings,
    generated_at: DateTime<Local>,
) -> Result<String, ExportError> {
    let mut context = Context::new();
    context.insert("organisation", &settings.organisation);
    context.insert("accent", &settings.accent_color);
    context.insert("tool_title", view.tool.title());
    context.insert("persona", view.persona);
    context.insert("stakeholder", &view.stakeholder);
    context.insert(
        "generated_on",
        &generated_at.format("%d/%m/%Y, %H:%M:%S").to_string(),
    );
    context.insert("assessment", &assessment_body(turn));

    Tera::one_off(REPORT_TEMPLATE, &context, true)
        .map_err(|e| ExportError::Render(e.to_string()))
}
