//! Local preference model

use serde::{Deserialize, Serialize};

/// Locally persisted user preferences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Dark-mode flag; false (light) when unset
    #[serde(default)]
    pub dark_mode: bool,
}
