use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::errors::Result;

/// Initializes the default tracing subscriber used by the binaries.
///
/// Logs go to stderr, keeping stdout for command output; ANSI colors follow
/// whether stderr is a terminal. Installing twice is an error.
pub fn init_tracing(level: Option<&str>) -> Result<()> {
    let default_level = level.unwrap_or("info");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init()
        .map_err(|err| crate::errors::RulesetError::GeneralError(err.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RulesetError;

    #[test]
    fn installs_subscriber_once() {
        init_tracing(Some("debug")).expect("first install");
        let err = init_tracing(None).unwrap_err();
        assert!(matches!(err, RulesetError::GeneralError(_)));
    }
}
