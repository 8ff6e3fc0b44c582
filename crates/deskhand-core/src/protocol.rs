//! Event names and payloads exchanged with the coordinator.

use crate::types::Action;
use serde::{Deserialize, Serialize};

pub const EVENT_REQUEST_SCREENSHOT: &str = "request_screenshot";
pub const EVENT_EXECUTE_ACTIONS: &str = "execute_actions";
pub const EVENT_SCREENSHOT_UNVALIDATED: &str = "screenshot_unvalidated";
pub const EVENT_IDENTIFY: &str = "identify";

/// `request_screenshot`. Both fields are echoed back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotRequest {
    pub user_id: String,
    #[serde(default)]
    pub prompt: String,
}

/// `execute_actions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteActions {
    #[serde(default)]
    pub user_id: String,
    pub actions: Vec<Action>,
}

/// `screenshot_unvalidated`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotProduced {
    pub user_id: String,
    /// `data:image/png;base64,...`
    pub screenshot: String,
    pub prompt: String,
}

/// `identify`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    pub user_id: String,
}

/// Prefix of the data URI carried in [`ScreenshotProduced::screenshot`].
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";
