//! Action names understood by the extension contexts.
//!
//! | Action | Handled by |
//! |--------|------------|
//! | `getPageContent` | content script, background (injected variant) |
//! | `captureScreen` | background (content script relays) |
//! | `getDivText` | content script |
//! | `extractLinks` | content script |
//! | `getPageInfo` | content script |
//! | `getTabInfo` | background |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ============================================================================
// ActionKind
// ============================================================================

/// A recognised request action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    /// Extract the main readable text of the page.
    GetPageContent,
    /// Capture the visible area of the active tab.
    CaptureScreen,
    /// Read the legacy `#aditya` div.
    GetDivText,
    /// Enumerate and group the page's links.
    ExtractLinks,
    /// Collect page counts and metadata.
    GetPageInfo,
    /// Describe the active tab.
    GetTabInfo,
}

impl ActionKind {
    /// Every recognised action.
    pub const ALL: [ActionKind; 6] = [
        Self::GetPageContent,
        Self::CaptureScreen,
        Self::GetDivText,
        Self::ExtractLinks,
        Self::GetPageInfo,
        Self::GetTabInfo,
    ];

    /// Returns the wire name of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GetPageContent => "getPageContent",
            Self::CaptureScreen => "captureScreen",
            Self::GetDivText => "getDivText",
            Self::ExtractLinks => "extractLinks",
            Self::GetPageInfo => "getPageInfo",
            Self::GetTabInfo => "getTabInfo",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::unknown_action(s))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for kind in ActionKind::ALL {
            let json = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "extractLinks".parse::<ActionKind>().ok(),
            Some(ActionKind::ExtractLinks)
        );
        let err = "deleteEverything".parse::<ActionKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownAction { .. }));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("GetPageInfo".parse::<ActionKind>().is_err());
    }
}
