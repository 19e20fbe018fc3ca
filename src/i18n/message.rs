//! Runtime message syntax.
//!
//! Placeholders are delimited by U+FFFD:
//! - `�N�` expression `N` of the block (fed by `i18nExp`)
//! - `�#N�` / `�/#N�` open / close the element declared at slot `N`
//! - `�#N/�` void element at slot `N`
//! - `�*N:S�` / `�/*N:S�` sub-template `S` anchored at slot `N`
//!
//! Element placeholders inside a sub-template carry the template's suffix
//! (`�#N:S�`), which does not change their meaning.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{I18nError, RenderResult};

pub const MARKER: char = '\u{FFFD}';

lazy_static! {
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"^(/?)([#*]?)(\d+)(?::(\d+))?(/?)$").expect("placeholder pattern");
    static ref SUBTEMPLATE_RE: Regex =
        Regex::new("\u{FFFD}/?\\*(\\d+:\\d+)\u{FFFD}").expect("sub-template pattern");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    Text(String),
    Expression(usize),
    ElementStart(usize),
    ElementEnd(usize),
    VoidElement(usize),
    TemplateStart(usize),
    TemplateEnd(usize),
}

impl MessagePart {
    pub fn is_structural(&self) -> bool {
        !matches!(self, MessagePart::Text(_) | MessagePart::Expression(_))
    }
}

/// Tokenize a runtime message.
pub fn parse_message(message: &str) -> RenderResult<Vec<MessagePart>> {
    let mut parts = Vec::new();
    let mut rest = message;

    while let Some(start) = rest.find(MARKER) {
        if start > 0 {
            parts.push(MessagePart::Text(rest[..start].to_string()));
        }
        let after = &rest[start + MARKER.len_utf8()..];
        let end = after
            .find(MARKER)
            .ok_or_else(|| I18nError::UnterminatedPlaceholder {
                message: message.to_string(),
            })?;
        parts.push(parse_placeholder(&after[..end])?);
        rest = &after[end + MARKER.len_utf8()..];
    }

    if !rest.is_empty() {
        parts.push(MessagePart::Text(rest.to_string()));
    }
    Ok(parts)
}

fn parse_placeholder(body: &str) -> RenderResult<MessagePart> {
    let unknown = || I18nError::UnknownPlaceholder {
        placeholder: body.to_string(),
    };
    let captures = PLACEHOLDER_RE.captures(body).ok_or_else(unknown)?;
    let closing = !captures[1].is_empty();
    let kind = &captures[2];
    let void = !captures[5].is_empty();
    let slot: usize = captures[3].parse().map_err(|_| unknown())?;

    let part = match (kind, closing, void) {
        ("", false, false) => MessagePart::Expression(slot),
        ("#", false, false) => MessagePart::ElementStart(slot),
        ("#", true, false) => MessagePart::ElementEnd(slot),
        ("#", false, true) => MessagePart::VoidElement(slot),
        ("*", false, false) => MessagePart::TemplateStart(slot),
        ("*", true, false) => MessagePart::TemplateEnd(slot),
        _ => return Err(unknown().into()),
    };
    Ok(part)
}

/// Part of `message` that belongs to the template being rendered.
///
/// Without a sub-template index that is the top-level message with nested
/// template contents removed; otherwise the contents of sub-template
/// `sub_template`, again minus anything nested deeper.
pub fn translation_for_template(message: &str, sub_template: Option<usize>) -> RenderResult<String> {
    let Some(sub) = sub_template else {
        return Ok(remove_inner_template_translation(message));
    };

    let open_suffix = format!(":{sub}{MARKER}");
    let start = message
        .find(&open_suffix)
        .map(|i| i + open_suffix.len())
        .ok_or(I18nError::MissingSubTemplate { index: sub })?;

    let close = Regex::new(&format!("{MARKER}/\\*\\d+:{sub}{MARKER}"))
        .map_err(|_| I18nError::MissingSubTemplate { index: sub })?;
    let end = close
        .find_at(message, start)
        .map(|m| m.start())
        .ok_or(I18nError::MissingSubTemplate { index: sub })?;

    Ok(remove_inner_template_translation(&message[start..end]))
}

/// Drop the contents of nested sub-templates, keeping their placeholders.
pub fn remove_inner_template_translation(message: &str) -> String {
    let mut result = String::new();
    let mut index = 0;
    let mut open: Option<String> = None;

    for captures in SUBTEMPLATE_RE.captures_iter(message) {
        let Some(whole) = captures.get(0) else { continue };
        match &open {
            None => {
                result.push_str(&message[index..whole.end()]);
                open = Some(captures[1].to_string());
            }
            Some(tag) => {
                if whole.as_str() == format!("{MARKER}/*{tag}{MARKER}") {
                    index = whole.start();
                    open = None;
                }
            }
        }
    }

    result.push_str(&message[index..]);
    result
}
