use lazy_static::lazy_static;

pub mod configuration;

pub const HOMEPAGE: &str = "https://github.com/exein-io/cvefeed";

lazy_static! {
    static ref VERSION: String = if cfg!(debug_assertions) {
        format!("{}+dev", env!("CARGO_PKG_VERSION"))
    } else {
        env!("CARGO_PKG_VERSION").to_string()
    };
    static ref USER_AGENT: String = format!("cvefeed/{} (+{})", *VERSION, HOMEPAGE);
}

/// Package version, `+dev` suffixed in debug builds.
pub fn version() -> &'static str {
    &VERSION
}

/// Default `User-Agent` of the requests sent to NVD.
pub fn user_agent() -> &'static str {
    &USER_AGENT
}
