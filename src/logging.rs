use flexi_logger::{
    colored_default_format, opt_format, Cleanup, Criterion, Duplicate, FileSpec,
    FlexiLoggerError, Logger, LoggerHandle, Naming,
};
use std::path::Path;

/// Starts the global logger.
///
/// `RUST_LOG` overrides `level`. With a `directory`, records also go to a
/// rotating file there while info and above stay on stderr.
pub fn setup_logging(
    level: &str,
    directory: Option<&Path>,
) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str(level)?;

    match directory {
        Some(directory) => logger
            .log_to_file(FileSpec::default().directory(directory).basename("tree_search"))
            .duplicate_to_stderr(Duplicate::Info)
            .format(opt_format)
            .rotate(
                Criterion::Size(10 * 1024 * 1024),
                Naming::Numbers,
                Cleanup::KeepLogFiles(3),
            )
            .start(),
        None => logger.format(colored_default_format).start(),
    }
}
