use log::LevelFilter;
use simple_logger::SimpleLogger;
use time::macros::format_description;

pub fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.to_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::Trace),
        "DEBUG" => Some(LevelFilter::Debug),
        "INFO" => Some(LevelFilter::Info),
        "WARN" | "WARNING" => Some(LevelFilter::Warn),
        "ERROR" => Some(LevelFilter::Error),
        _ => None,
    }
}

/// Installs the process logger. Unknown levels fall back to INFO.
pub fn init_logging(level: &str) -> Result<(), log::SetLoggerError> {
    let log_level = parse_log_level(level).unwrap_or_else(|| {
        eprintln!("Invalid log level '{}', defaulting to INFO.", level);
        LevelFilter::Info
    });

    SimpleLogger::new()
        .with_level(log_level)
        .with_timestamp_format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .init()
}
