use std::fs::File;

use anyhow::Context;
use time::{
    format_description::{self, parse},
    OffsetDateTime,
};
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, FmtSubscriber};

/// Installs a global subscriber writing every event to a new timestamped file.
///
/// Fails if a global subscriber is already set.
pub fn init_logger() -> anyhow::Result<()> {
    let file_name = get_log_file_name()?;
    let file = File::create(&file_name).with_context(|| format!("creating {file_name}"))?;
    let writer = BoxMakeWriter::new(file);
    let local_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(
        local_offset,
        format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")?,
    );

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(writer)
        .finish();

    set_global_default(subscriber).context(
        "could not set global default tracing subscriber, consider disabling logs if you are already setting one",
    )
}

fn get_log_file_name() -> anyhow::Result<String> {
    let format = parse("[year]-[month]-[day]_[hour]:[minute]:[second]_taboo_eval.log")?;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    Ok(now.format(&format)?)
}
