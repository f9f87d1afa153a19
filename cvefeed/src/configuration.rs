use config::{Config, ConfigError, Environment};
use domain_feed::sources::nist::FeedSettings;

pub trait FromEnv: Sized {
    fn try_from_env() -> Result<Self, ConfigError>;
}

impl FromEnv for FeedSettings {
    /// Defaults overridden by `CVEFEED_*` variables, e.g. `CVEFEED_MAX_ITEMS=10`.
    fn try_from_env() -> Result<Self, ConfigError> {
        let defaults = FeedSettings::default();

        Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default("output", defaults.output.to_string_lossy().into_owned())?
            .set_default("max_items", defaults.max_items as i64)?
            .set_default("window_days", defaults.window_days as i64)?
            .set_default("timeout_secs", defaults.timeout_secs as i64)?
            .set_default("user_agent", crate::user_agent())?
            .add_source(
                Environment::with_prefix("CVEFEED")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()
    }
}
