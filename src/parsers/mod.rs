// Parsers for assistant reply markup

pub mod html;
pub mod question;

pub use html::{contains_markup, normalize_reply, sanitize};
pub use question::{detect_question, parse_reply, ParsedReply};
