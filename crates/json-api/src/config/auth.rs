//! Auth Config

use clap::{ArgAction, Args};

/// Token authentication settings.
#[derive(Debug, Args)]
pub struct AuthConfig {
    /// Record `last_used_at` on every authenticated request
    #[arg(
        long,
        env = "TOUCH_LAST_USED",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub touch_last_used: bool,
}
