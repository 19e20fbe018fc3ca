//! `$localize` metadata and placeholder blocks.
//!
//! A tagged message arrives as parallel `cooked` / `raw` part lists. A part may
//! open with a block delimited by `:`:
//! - the first part: `:meaning|description@@custom-id␟legacy-id:text`
//! - later parts: `:placeholder-name@@associated-id:text`
//!
//! Block ends are searched in the cooked string while skipping over escape
//! sequences in the raw one, so a `\:` in the source never closes a block.

use crate::error::{I18nError, RenderResult};

pub const BLOCK_MARKER: char = ':';
pub const MEANING_SEPARATOR: &str = "|";
pub const ID_SEPARATOR: &str = "@@";
pub const LEGACY_ID_INDICATOR: &str = "\u{241F}";

/// Metadata parsed from the first message part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageMetadata {
    pub text: String,
    pub meaning: Option<String>,
    pub description: Option<String>,
    pub custom_id: Option<String>,
    pub legacy_ids: Vec<String>,
}

/// Placeholder block parsed from a later message part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderBlock {
    pub text: String,
    pub name: Option<String>,
    pub associated_id: Option<String>,
}

/// A `$localize` call: cooked and raw template strings plus substitutions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedMessage {
    pub cooked: Vec<String>,
    pub raw: Vec<String>,
    pub substitutions: Vec<String>,
}

impl LocalizedMessage {
    pub fn new(cooked: &[&str], raw: &[&str], substitutions: &[&str]) -> Self {
        let owned = |parts: &[&str]| parts.iter().map(|s| s.to_string()).collect();
        Self {
            cooked: owned(cooked),
            raw: owned(raw),
            substitutions: owned(substitutions),
        }
    }

    /// Leading metadata of the message.
    pub fn metadata(&self) -> RenderResult<MessageMetadata> {
        self.check_shape()?;
        parse_metadata(&self.cooked[0], &self.raw[0])
    }

    /// Message text with blocks stripped and substitutions spliced in.
    pub fn to_runtime_message(&self) -> RenderResult<String> {
        let metadata = self.metadata()?;
        let mut message = metadata.text;
        for (i, substitution) in self.substitutions.iter().enumerate() {
            message.push_str(substitution);
            let part = parse_placeholder(&self.cooked[i + 1], &self.raw[i + 1])?;
            message.push_str(&part.text);
        }
        Ok(message)
    }

    fn check_shape(&self) -> RenderResult<()> {
        if self.cooked.len() != self.raw.len() || self.cooked.is_empty() {
            return Err(I18nError::PartsMismatch {
                cooked: self.cooked.len(),
                raw: self.raw.len(),
            }
            .into());
        }
        if self.substitutions.len() + 1 != self.cooked.len() {
            return Err(I18nError::SubstitutionsMismatch {
                expected: self.cooked.len() - 1,
                found: self.substitutions.len(),
            }
            .into());
        }
        Ok(())
    }
}

/// Split a leading `:block:` off a message part.
///
/// Returns `(text, block)`; `block` is `None` when the raw part does not
/// start with the marker.
pub fn split_block(cooked: &str, raw: &str) -> RenderResult<(String, Option<String>)> {
    if !raw.starts_with(BLOCK_MARKER) {
        return Ok((cooked.to_string(), None));
    }
    let chars: Vec<char> = cooked.chars().collect();
    let end = find_end_of_block(cooked, raw)?;
    let block: String = chars[1..end].iter().collect();
    let text: String = chars[end + 1..].iter().collect();
    Ok((text, Some(block)))
}

/// Char index of the `:` closing the block that opens `cooked`.
pub fn find_end_of_block(cooked: &str, raw: &str) -> RenderResult<usize> {
    let cooked_chars: Vec<char> = cooked.chars().collect();
    let raw_chars: Vec<char> = raw.chars().collect();

    let mut raw_index = 1;
    for (cooked_index, c) in cooked_chars.iter().enumerate().skip(1) {
        if raw_chars.get(raw_index) == Some(&'\\') {
            raw_index += 1;
        } else if *c == BLOCK_MARKER {
            return Ok(cooked_index);
        }
        raw_index += 1;
    }

    Err(I18nError::UnterminatedBlock {
        raw: raw.to_string(),
    }
    .into())
}

pub fn parse_metadata(cooked: &str, raw: &str) -> RenderResult<MessageMetadata> {
    let (text, block) = split_block(cooked, raw)?;
    let Some(block) = block else {
        return Ok(MessageMetadata {
            text,
            ..Default::default()
        });
    };

    let mut legacy = block.split(LEGACY_ID_INDICATOR);
    let meaning_and_desc_and_id = legacy.next().unwrap_or_default();
    let legacy_ids = legacy.map(str::to_string).collect();

    let mut id_split = meaning_and_desc_and_id.split(ID_SEPARATOR);
    let meaning_and_desc = id_split.next().unwrap_or_default();
    let custom_id = id_split.next().map(str::to_string);

    let mut meaning_split = meaning_and_desc.split(MEANING_SEPARATOR);
    let first = meaning_split.next().unwrap_or_default();
    let (meaning, description) = match meaning_split.next() {
        Some(description) => (Some(first.to_string()), description.to_string()),
        None => (None, first.to_string()),
    };

    Ok(MessageMetadata {
        text,
        meaning,
        description: (!description.is_empty()).then_some(description),
        custom_id,
        legacy_ids,
    })
}

pub fn parse_placeholder(cooked: &str, raw: &str) -> RenderResult<PlaceholderBlock> {
    let (text, block) = split_block(cooked, raw)?;
    let Some(block) = block else {
        return Ok(PlaceholderBlock {
            text,
            ..Default::default()
        });
    };
    let mut parts = block.split(ID_SEPARATOR);
    Ok(PlaceholderBlock {
        text,
        name: parts.next().map(str::to_string),
        associated_id: parts.next().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_block() {
        assert_eq!(split_block("abc", "abc").unwrap(), ("abc".to_string(), None));
    }

    #[test]
    fn test_split_block() {
        assert_eq!(
            split_block(":meaning:abc", ":meaning:abc").unwrap(),
            ("abc".to_string(), Some("meaning".to_string()))
        );
    }

    #[test]
    fn test_escaped_marker_does_not_close() {
        // Source text `:a\:b:rest` -> cooked drops the backslash.
        let (text, block) = split_block(":a:b:rest", ":a\\:b:rest").unwrap();
        assert_eq!(block.as_deref(), Some("a:b"));
        assert_eq!(text, "rest");
    }

    #[test]
    fn test_unterminated_block() {
        let cases = [
            (":abc def", ":abc def"),
            (":abc:def", ":abc\\:def"),
            (":a\u{0007}b", ":a\\u0007b"),
            (":\n", ":\\n"),
        ];
        for (cooked, raw) in cases {
            let err = split_block(cooked, raw).unwrap_err();
            assert!(matches!(err, RenderError::I18n(I18nError::UnterminatedBlock { .. })));
            assert_eq!(
                err.to_string(),
                format!("Unterminated $localize metadata block in \"{raw}\".")
            );
        }
    }

    #[test]
    fn test_parse_metadata() {
        let meta = parse_metadata(
            ":page|greeting@@home.hello\u{241F}legacy1\u{241F}legacy2:Hello",
            ":page|greeting@@home.hello\u{241F}legacy1\u{241F}legacy2:Hello",
        )
        .unwrap();
        assert_eq!(
            meta,
            MessageMetadata {
                text: "Hello".into(),
                meaning: Some("page".into()),
                description: Some("greeting".into()),
                custom_id: Some("home.hello".into()),
                legacy_ids: vec!["legacy1".into(), "legacy2".into()],
            }
        );
    }

    #[test]
    fn test_description_only_and_empty() {
        let meta = parse_metadata(":greeting:Hi", ":greeting:Hi").unwrap();
        assert_eq!(meta.meaning, None);
        assert_eq!(meta.description.as_deref(), Some("greeting"));

        let meta = parse_metadata(":@@id:Hi", ":@@id:Hi").unwrap();
        assert_eq!(meta.description, None);
        assert_eq!(meta.custom_id.as_deref(), Some("id"));
    }

    #[test]
    fn test_parse_placeholder() {
        let block = parse_placeholder(":PH@@ref:!", ":PH@@ref:!").unwrap();
        assert_eq!(block.name.as_deref(), Some("PH"));
        assert_eq!(block.associated_id.as_deref(), Some("ref"));
        assert_eq!(block.text, "!");
    }

    #[test]
    fn test_runtime_message() {
        let message = LocalizedMessage::new(
            &[":@@greet:Hello ", ":NAME:!"],
            &[":@@greet:Hello ", ":NAME:!"],
            &["\u{FFFD}0\u{FFFD}"],
        );
        assert_eq!(message.to_runtime_message().unwrap(), "Hello \u{FFFD}0\u{FFFD}!");
    }

    #[test]
    fn test_shape_errors() {
        let message = LocalizedMessage::new(&["a", "b"], &["a"], &[]);
        assert!(matches!(
            message.to_runtime_message(),
            Err(RenderError::I18n(I18nError::PartsMismatch { cooked: 2, raw: 1 }))
        ));
        let message = LocalizedMessage::new(&["a", "b"], &["a", "b"], &[]);
        assert!(matches!(
            message.to_runtime_message(),
            Err(RenderError::I18n(I18nError::SubstitutionsMismatch { expected: 1, found: 0 }))
        ));
    }
}
