//! ARKit blend shape names, as emitted by ARKit and MediaPipe face trackers.

pub const EYE_BLINK_LEFT: &str = "eyeBlinkLeft";
pub const EYE_BLINK_RIGHT: &str = "eyeBlinkRight";
pub const BROW_INNER_UP: &str = "browInnerUp";
pub const BROW_DOWN_LEFT: &str = "browDownLeft";
pub const BROW_DOWN_RIGHT: &str = "browDownRight";
pub const JAW_OPEN: &str = "jawOpen";
