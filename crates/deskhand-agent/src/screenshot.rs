use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use deskhand_core::protocol::{ScreenshotProduced, ScreenshotRequest, PNG_DATA_URI_PREFIX};
use deskhand_input::{ScreenCapture, Screenshot};
use tracing::debug;

pub fn data_uri(shot: &Screenshot) -> String {
    format!("{PNG_DATA_URI_PREFIX}{}", BASE64.encode(&shot.png))
}

/// Capture the display and build the `screenshot_unvalidated` reply,
/// echoing the request's user id and prompt.
pub async fn produce(
    capture: &dyn ScreenCapture,
    request: ScreenshotRequest,
) -> deskhand_core::Result<ScreenshotProduced> {
    let shot = capture.capture().await?;
    debug!(
        width = shot.width,
        height = shot.height,
        bytes = shot.png.len(),
        "captured screenshot"
    );
    Ok(ScreenshotProduced {
        user_id: request.user_id,
        screenshot: data_uri(&shot),
        prompt: request.prompt,
    })
}
