//! Node-kind predicates and the dev-mode assertions built on them.

use crate::dom::{Dom, NodeId, NodeKind};
use crate::error::{dev_assert, HydrationError, RenderResult, StructuralError};
use crate::types::{SlotIndex, TNodeType};

use super::tview::TNode;

/// Node renders to exactly one DOM element.
#[inline]
pub fn is_element(tnode: &TNode) -> bool {
    tnode.node_type == TNodeType::Element
}

/// Node is rendered as an anchor comment with content placed before it.
#[inline]
pub fn is_comment_anchored(tnode: &TNode) -> bool {
    matches!(
        tnode.node_type,
        TNodeType::ElementContainer | TNodeType::Container
    )
}

/// Node may have children in the same view.
#[inline]
pub fn can_have_children(tnode: &TNode) -> bool {
    matches!(
        tnode.node_type,
        TNodeType::Element | TNodeType::ElementContainer
    )
}

/// Dev-mode check that a TNode has the expected kind.
pub fn assert_tnode_type(tnode: &TNode, expected: TNodeType) -> RenderResult<()> {
    dev_assert!(
        tnode.node_type == expected,
        StructuralError::NodeKindMismatch {
            index: tnode.index,
            expected,
            found: tnode.node_type,
        }
    );
    Ok(())
}

/// Dev-mode check that a TNode is one of the kinds that can be opened.
pub fn assert_has_parent_role(tnode: &TNode) -> RenderResult<()> {
    dev_assert!(
        can_have_children(tnode),
        StructuralError::NodeKindMismatch {
            index: tnode.index,
            expected: TNodeType::Element,
            found: tnode.node_type,
        }
    );
    Ok(())
}

/// Check that a located DOM node has the kind (and tag) the template expects.
pub fn assert_rnode_matches(
    dom: &Dom,
    node: NodeId,
    index: SlotIndex,
    expected: NodeKind,
    tag: Option<&str>,
) -> RenderResult<()> {
    let found = dom.kind(node);
    dev_assert!(
        found == Some(expected),
        HydrationError::NodeTypeMismatch {
            index,
            expected,
            found: found.map_or_else(|| "nothing".to_string(), |kind| kind.to_string()),
        }
    );
    if let Some(tag) = tag {
        let found = dom.tag_name(node).unwrap_or_default();
        dev_assert!(
            found.eq_ignore_ascii_case(tag),
            HydrationError::TagMismatch {
                index,
                expected: tag.to_string(),
                found,
            }
        );
    }
    Ok(())
}
