use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A label as persisted in the `labels` collection.
///
/// Tasks reference labels by id only, and nothing cascades on label
/// deletion: a dangling id inside a task is tolerated and dropped when
/// labels are resolved.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Hex color, e.g. `#ff8800`.
    pub color: String,
    /// Owner.
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// True makes the label visible to every member of `group_id`
    /// instead of just the owner.
    #[serde(default)]
    pub is_shared: bool,
}

impl Label {
    /// Accepts `#rgb` and `#rrggbb`.
    pub fn color_is_valid(color: &str) -> bool {
        static HEX_COLOR: OnceLock<Regex> = OnceLock::new();
        HEX_COLOR
            .get_or_init(|| {
                Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex")
            })
            .is_match(color)
    }
}
