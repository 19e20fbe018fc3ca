//! Render configuration.
//!
//! Chosen once when a [`RenderContext`](crate::RenderContext) is built. The
//! `hydration` switch picks the node materialization strategy for the whole
//! lifetime of the context; it is never consulted per instruction.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Default host attribute carrying the serialized root hydration record.
pub const DEFAULT_NGH_ATTRIBUTE: &str = "ngh";

/// Default attribute that opts an element subtree out of hydration.
pub const DEFAULT_SKIP_HYDRATION_ATTRIBUTE: &str = "ngSkipHydration";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Reconcile against existing DOM instead of always creating nodes.
    pub hydration: bool,
    pub ngh_attribute: String,
    pub skip_hydration_attribute: String,
    /// Remove never-claimed server views once the app reports stable.
    pub cleanup_on_stable: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            hydration: false,
            ngh_attribute: DEFAULT_NGH_ATTRIBUTE.to_string(),
            skip_hydration_attribute: DEFAULT_SKIP_HYDRATION_ATTRIBUTE.to_string(),
            cleanup_on_stable: true,
        }
    }
}

impl RenderConfig {
    /// Default config with hydration enabled.
    pub fn hydrating() -> Self {
        Self {
            hydration: true,
            ..Self::default()
        }
    }

    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> RenderResult<Self> {
        serde_json::from_str(json).map_err(RenderError::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert!(!config.hydration);
        assert_eq!(config.ngh_attribute, "ngh");
        assert_eq!(config.skip_hydration_attribute, "ngSkipHydration");
        assert!(config.cleanup_on_stable);
    }

    #[test]
    fn test_from_json_partial() {
        let config = RenderConfig::from_json(r#"{ "hydration": true, "nghAttribute": "data-ngh" }"#)
            .unwrap();
        assert!(config.hydration);
        assert_eq!(config.ngh_attribute, "data-ngh");
        assert!(config.cleanup_on_stable);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            RenderConfig::from_json("{ hydration"),
            Err(RenderError::Config(_))
        ));
    }
}
