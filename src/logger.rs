use anyhow::{bail, Result};
use log::{log, LevelFilter};

static LOG_LEVELS: [LevelFilter; 6] = [
    LevelFilter::Off,
    LevelFilter::Error,
    LevelFilter::Warn,
    LevelFilter::Info,
    LevelFilter::Debug,
    LevelFilter::Trace,
];

/// Map a `-v` count to a level filter.
pub fn level_for(verbosity: usize) -> Result<LevelFilter> {
    match LOG_LEVELS.get(verbosity) {
        Some(level) => Ok(*level),
        None => bail!(
            "Verbosity must be between 0 and {}, not {}!",
            LOG_LEVELS.len() - 1,
            verbosity
        ),
    }
}

/// Setup logger. Logs go to stderr so `analyze` output stays clean.
pub fn setup_logger(verbosity: usize) -> Result<()> {
    let level = level_for(verbosity)?;
    if level == LevelFilter::Off {
        return Ok(());
    }

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:.1}][{}:{}] {}",
                record.level(),
                record.target().rsplit("::").next().unwrap_or_default(),
                record.line().unwrap_or(0),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    if let Some(level) = log::max_level().to_level() {
        log!(level, "Log started");
    }

    Ok(())
}
