//! Create-only strategy.

use crate::error::RenderResult;

use super::{
    MaterializeCx, Materialized, NodeMaterializer, CONTAINER_COMMENT, ELEMENT_CONTAINER_COMMENT,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct CreatingMaterializer;

impl NodeMaterializer for CreatingMaterializer {
    fn name(&self) -> &'static str {
        "creating"
    }

    fn is_hydrating(&self) -> bool {
        false
    }

    fn element(&self, cx: &mut MaterializeCx<'_>, tag: &str) -> RenderResult<Materialized> {
        Ok(Materialized::created(cx.dom.create_element(tag)))
    }

    fn text(&self, cx: &mut MaterializeCx<'_>, value: &str) -> RenderResult<Materialized> {
        Ok(Materialized::created(cx.dom.create_text(value)))
    }

    fn element_container(&self, cx: &mut MaterializeCx<'_>) -> RenderResult<Materialized> {
        Ok(Materialized::created(
            cx.dom.create_comment(ELEMENT_CONTAINER_COMMENT),
        ))
    }

    fn container_anchor(&self, cx: &mut MaterializeCx<'_>) -> RenderResult<Materialized> {
        Ok(Materialized::created(cx.dom.create_comment(CONTAINER_COMMENT)))
    }
}
