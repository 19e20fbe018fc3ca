//! i18n - translated blocks, attribute messages and their update codes.
//!
//! A block (`i18nStart` .. `i18nEnd`) is described by a message whose text
//! runs become text nodes allocated after the binding region, and whose
//! element placeholders point at element slots declared by the template.
//! The first creation pass turns the message into a [`TI18n`]; later passes
//! replay it.

mod message;
mod metadata;

pub use message::{
    parse_message, remove_inner_template_translation, translation_for_template, MessagePart, MARKER,
};
pub use metadata::{
    find_end_of_block, parse_metadata, parse_placeholder, split_block, LocalizedMessage,
    MessageMetadata, PlaceholderBlock,
};

use crate::error::{I18nError, RenderResult};
use crate::types::SlotIndex;

// =============================================================================
// Static block data
// =============================================================================

/// A node of a translated block, in message order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nNode {
    Text {
        index: SlotIndex,
        parent: Option<SlotIndex>,
    },
    Element {
        index: SlotIndex,
        parent: Option<SlotIndex>,
    },
    Template {
        index: SlotIndex,
        parent: Option<SlotIndex>,
    },
}

impl I18nNode {
    pub fn index(&self) -> SlotIndex {
        match self {
            I18nNode::Text { index, .. }
            | I18nNode::Element { index, .. }
            | I18nNode::Template { index, .. } => *index,
        }
    }

    pub fn parent(&self) -> Option<SlotIndex> {
        match self {
            I18nNode::Text { parent, .. }
            | I18nNode::Element { parent, .. }
            | I18nNode::Template { parent, .. } => *parent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nPart {
    Literal(String),
    /// Value of the n-th `i18nExp` of the block.
    Binding(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nTarget {
    Text(SlotIndex),
    Attribute { element: SlotIndex, name: String },
}

/// Recompute one target when any binding in `mask` changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I18nUpdateOp {
    pub target: I18nTarget,
    pub parts: Vec<I18nPart>,
    pub mask: u32,
}

impl I18nUpdateOp {
    pub fn render(&self, bindings: &[String]) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                I18nPart::Literal(text) => text.as_str(),
                I18nPart::Binding(n) => bindings.get(*n).map_or("", String::as_str),
            })
            .collect()
    }
}

/// Compiled translated block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TI18n {
    pub nodes: Vec<I18nNode>,
    pub update: Vec<I18nUpdateOp>,
}

/// Compiled `i18nAttributes` instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TI18nAttributes {
    pub element: SlotIndex,
    /// Attributes without expressions, set once on creation.
    pub statics: Vec<(String, String)>,
    pub update: Vec<I18nUpdateOp>,
}

// =============================================================================
// Planning
// =============================================================================

/// Node of a parsed block before text nodes get their slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedNode {
    Text {
        parent: Option<SlotIndex>,
        parts: Vec<I18nPart>,
    },
    Element {
        index: SlotIndex,
        parent: Option<SlotIndex>,
    },
    Template {
        index: SlotIndex,
        parent: Option<SlotIndex>,
    },
}

/// Turn message parts into block nodes, tracking element nesting.
pub fn plan_block(parts: &[MessagePart], root: Option<SlotIndex>) -> RenderResult<Vec<PlannedNode>> {
    let mut planned = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut text: Vec<I18nPart> = Vec::new();

    let parent_of = |stack: &[usize]| stack.last().map(|slot| SlotIndex(*slot)).or(root);
    let flush = |text: &mut Vec<I18nPart>, planned: &mut Vec<PlannedNode>, parent| {
        if !text.is_empty() {
            planned.push(PlannedNode::Text {
                parent,
                parts: std::mem::take(text),
            });
        }
    };

    for part in parts {
        match part {
            MessagePart::Text(value) => text.push(I18nPart::Literal(value.clone())),
            MessagePart::Expression(n) => text.push(I18nPart::Binding(*n)),
            MessagePart::ElementStart(slot) => {
                flush(&mut text, &mut planned, parent_of(&stack));
                planned.push(PlannedNode::Element {
                    index: SlotIndex(*slot),
                    parent: parent_of(&stack),
                });
                stack.push(*slot);
            }
            MessagePart::ElementEnd(slot) => {
                flush(&mut text, &mut planned, parent_of(&stack));
                if stack.pop() != Some(*slot) {
                    return Err(I18nError::UnbalancedElement { slot: *slot }.into());
                }
            }
            MessagePart::VoidElement(slot) => {
                flush(&mut text, &mut planned, parent_of(&stack));
                planned.push(PlannedNode::Element {
                    index: SlotIndex(*slot),
                    parent: parent_of(&stack),
                });
            }
            MessagePart::TemplateStart(slot) => {
                flush(&mut text, &mut planned, parent_of(&stack));
                planned.push(PlannedNode::Template {
                    index: SlotIndex(*slot),
                    parent: parent_of(&stack),
                });
            }
            MessagePart::TemplateEnd(_) => flush(&mut text, &mut planned, parent_of(&stack)),
        }
    }
    flush(&mut text, &mut planned, parent_of(&stack));

    if let Some(slot) = stack.pop() {
        return Err(I18nError::UnclosedElement { slot }.into());
    }
    Ok(planned)
}

/// Parts of an attribute message; element placeholders are not allowed.
pub fn plan_attribute(message: &str) -> RenderResult<Vec<I18nPart>> {
    parse_message(message)?
        .into_iter()
        .map(|part| match part {
            MessagePart::Text(value) => Ok(I18nPart::Literal(value)),
            MessagePart::Expression(n) => Ok(I18nPart::Binding(n)),
            _ => Err(I18nError::StructureInAttribute.into()),
        })
        .collect()
}

/// Mask bit of the n-th expression of a block. Expressions past the 31st
/// share the top bit, so they always mark their ops dirty together.
pub fn expression_bit(n: usize) -> u32 {
    1u32 << n.min(31)
}

/// Change mask covering every binding a part list reads.
pub fn binding_mask(parts: &[I18nPart]) -> u32 {
    parts.iter().fold(0, |mask, part| match part {
        I18nPart::Binding(n) => mask | expression_bit(*n),
        I18nPart::Literal(_) => mask,
    })
}

/// Concatenated literal text, if the parts have no bindings.
pub fn static_text(parts: &[I18nPart]) -> Option<String> {
    parts
        .iter()
        .map(|part| match part {
            I18nPart::Literal(text) => Some(text.as_str()),
            I18nPart::Binding(_) => None,
        })
        .collect()
}
