//! The `ngh` record: what the server says each view looks like.
//!
//! Serialized form (JSON, one record per view):
//!
//! ```json
//! {
//!   "nodes": { "3": "host.firstChild.nextSibling" },
//!   "containers": { "5": { "numRootNodes": 0, "views": [ { "template": "t0", "numRootNodes": 2 } ] } },
//!   "disconnected": [7]
//! }
//! ```
//!
//! `nodes` only lists slots whose position cannot be inferred from the
//! previously processed node. Embedded views nest inside their container.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::error::{HydrationError, RenderResult};
use crate::types::SlotIndex;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SerializedView {
    /// Slot index -> explicit path.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub nodes: BTreeMap<usize, String>,
    /// Slot index -> container record.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub containers: BTreeMap<usize, SerializedContainer>,
    /// Slots whose nodes were not attached to the DOM on the server.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disconnected: Vec<usize>,
    /// Template id of an embedded view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// DOM nodes the view contributes at its root (embedded views).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_root_nodes: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SerializedContainer {
    /// DOM nodes of an `<ng-container>`'s own content, before its views.
    pub num_root_nodes: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<SerializedView>,
}

impl SerializedView {
    pub fn from_json(json: &str) -> RenderResult<Self> {
        serde_json::from_str(json).map_err(|err| HydrationError::Malformed(err).into())
    }

    pub fn to_json(&self) -> RenderResult<String> {
        serde_json::to_string(self).map_err(|err| HydrationError::Malformed(err).into())
    }
}

/// Runtime hydration state of one view.
#[derive(Debug, Clone, Default)]
pub struct HydrationInfo {
    pub data: SerializedView,
    /// First DOM node of the view.
    pub first_child: Option<NodeId>,
    /// First content node of each `<ng-container>` located so far.
    pub(crate) container_starts: HashMap<SlotIndex, Option<NodeId>>,
}

impl HydrationInfo {
    pub fn new(data: SerializedView, first_child: Option<NodeId>) -> Self {
        Self {
            data,
            first_child,
            container_starts: HashMap::new(),
        }
    }

    pub fn path(&self, index: SlotIndex) -> Option<&str> {
        self.data.nodes.get(&index.get()).map(String::as_str)
    }

    pub fn container(&self, index: SlotIndex) -> Option<&SerializedContainer> {
        self.data.containers.get(&index.get())
    }

    pub fn is_disconnected(&self, index: SlotIndex) -> bool {
        self.data.disconnected.contains(&index.get())
    }

    pub fn container_start(&self, index: SlotIndex) -> Option<NodeId> {
        self.container_starts.get(&index).copied().flatten()
    }
}

/// Server-rendered embedded view not yet matched to a runtime view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DehydratedView {
    pub first_child: Option<NodeId>,
    pub data: SerializedView,
}

impl DehydratedView {
    pub fn template(&self) -> Option<&str> {
        self.data.template.as_deref()
    }

    pub fn num_root_nodes(&self) -> usize {
        self.data.num_root_nodes.unwrap_or(0)
    }

    pub fn into_info(self) -> HydrationInfo {
        HydrationInfo::new(self.data, self.first_child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_record() {
        let json = r#"{
            "nodes": { "3": "host.firstChild.nextSibling" },
            "containers": { "5": { "numRootNodes": 1, "views": [ { "template": "t0", "numRootNodes": 2 } ] } },
            "disconnected": [7]
        }"#;
        let view = SerializedView::from_json(json).unwrap();

        assert_eq!(view.nodes.get(&3).map(String::as_str), Some("host.firstChild.nextSibling"));
        let container = &view.containers[&5];
        assert_eq!(container.num_root_nodes, 1);
        assert_eq!(container.views[0].template.as_deref(), Some("t0"));
        assert_eq!(container.views[0].num_root_nodes, Some(2));
        assert_eq!(view.disconnected, vec![7]);
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let mut view = SerializedView::default();
        view.nodes.insert(1, "host.firstChild".into());
        assert_eq!(view.to_json().unwrap(), r#"{"nodes":{"1":"host.firstChild"}}"#);
        assert_eq!(SerializedView::from_json(&view.to_json().unwrap()).unwrap(), view);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            SerializedView::from_json("{\"nodes\": 3}"),
            Err(crate::error::RenderError::Hydration(HydrationError::Malformed(_)))
        ));
    }

    #[test]
    fn test_info_lookups() {
        let mut data = SerializedView::default();
        data.disconnected.push(2);
        data.containers.insert(
            4,
            SerializedContainer {
                num_root_nodes: 3,
                views: Vec::new(),
            },
        );
        let info = HydrationInfo::new(data, None);

        assert!(info.is_disconnected(SlotIndex(2)));
        assert_eq!(info.container(SlotIndex(4)).map(|c| c.num_root_nodes), Some(3));
        assert!(info.container(SlotIndex(9)).is_none());
        assert_eq!(info.path(SlotIndex(0)), None);
    }
}
