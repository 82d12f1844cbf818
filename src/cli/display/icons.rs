//! Status icons for CLI output

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    /// Success icon (capability present)
    pub const SUCCESS: &'static str = "✓";

    /// Warning icon
    pub const WARNING: &'static str = "⚠";

    /// Error icon (capability absent)
    pub const ERROR: &'static str = "✗";

    /// Get icon for a capability bit
    pub fn get_capability_icon(enabled: bool) -> &'static str {
        if enabled {
            Self::SUCCESS
        } else {
            Self::ERROR
        }
    }
}
