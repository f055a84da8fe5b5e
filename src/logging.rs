//! Installs the `log` backend for the binary.

use std::io::Write;

use log::LevelFilter;

use crate::error::ShellError;

/// Environment variable holding an env_logger filter that overrides the flags.
pub const LOG_ENV: &str = "MYSHELL_LOG";

pub fn level_for(debug: bool, quiet: bool) -> LevelFilter {
    match (debug, quiet) {
        (true, _) => LevelFilter::Debug,
        (false, true) => LevelFilter::Error,
        (false, false) => LevelFilter::Warn,
    }
}

pub fn init(debug: bool, quiet: bool) -> Result<(), ShellError> {
    env_logger::Builder::new()
        .filter_level(level_for(debug, quiet))
        .parse_env(LOG_ENV)
        .format(|buf, record| {
            writeln!(buf, "myshell: {}: {}", record.level().as_str().to_lowercase(), record.args())
        })
        .try_init()
        .map_err(|e| ShellError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(level_for(false, false), LevelFilter::Warn);
        assert_eq!(level_for(false, true), LevelFilter::Error);
        assert_eq!(level_for(true, true), LevelFilter::Debug);
    }
}
