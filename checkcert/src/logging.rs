//! Logging configuration for the checkcert utility

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

/// Configures log4rs using the YAML file at `logging_config`, if provided, or a console appender
/// that writes warnings and errors to stderr otherwise. Failures are reported on stderr and the
/// run continues without logging.
pub(crate) fn configure_logging(logging_config: &Option<String>) {
    if let Some(logging_config) = logging_config {
        match log4rs::init_file(logging_config, Default::default()) {
            Ok(_) => return,
            Err(e) => {
                eprintln!(
                    "ERROR: failed to configure logging using {} with {:?}. Continuing with default logging.",
                    logging_config, e
                );
            }
        }
    }

    // stdout is reserved for status lines
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .build();
    match Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))
    {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!(
                    "ERROR: failed to configure logging for stderr with {:?}. Continuing without logging.",
                    e
                );
            }
        }
        Err(e) => {
            eprintln!(
                "ERROR: failed to prepare default logging configuration with {:?}. Continuing without logging",
                e
            );
        }
    }
}
