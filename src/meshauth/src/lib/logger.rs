use crate::config::meshauth_version_str;
use slog::{Drain, Level, Logger};
use std::fs::File;
use std::path::PathBuf;

/// Where log records go.
pub enum LoggingMode {
    /// Undecorated output to STDERR.
    Stderr,

    /// STDERR plus a full record of everything at the chosen level in a file.
    Tee(PathBuf),

    /// Only to a file, with timestamps and key-value pairs.
    File(PathBuf),
}

/// Writes the level (for warnings and worse), the message and any key-value
/// pairs of a record on one line.
pub struct MeshAuthFormat<D>
where
    D: slog_term::Decorator,
{
    decorator: D,
}

impl<D: slog_term::Decorator> MeshAuthFormat<D> {
    pub fn new(decorator: D) -> MeshAuthFormat<D> {
        MeshAuthFormat { decorator }
    }
}

impl<D: slog_term::Decorator> slog::Drain for MeshAuthFormat<D> {
    type Ok = ();
    type Err = std::io::Error;

    fn log(
        &self,
        record: &slog::Record<'_>,
        values: &slog::OwnedKVList,
    ) -> Result<Self::Ok, Self::Err> {
        self.decorator.with_record(record, values, |decorator| {
            if record.level() <= Level::Warning {
                decorator.start_level()?;
                write!(decorator, "{}: ", record.level().as_str())?;
                decorator.start_whitespace()?;
            }

            decorator.start_msg()?;
            write!(decorator, "{}", record.msg())?;

            let mut pairs = KeyValues::default();
            slog::KV::serialize(&record.kv(), record, &mut pairs)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            if !pairs.0.is_empty() {
                decorator.start_key()?;
                write!(decorator, "{}", pairs.0)?;
            }

            decorator.start_whitespace()?;
            writeln!(decorator)?;

            decorator.flush()?;
            Ok(())
        })
    }
}

/// Collects a record's key-value pairs as ` key=value`.
#[derive(Default)]
struct KeyValues(String);

impl slog::Serializer for KeyValues {
    fn emit_arguments(&mut self, key: slog::Key, val: &std::fmt::Arguments<'_>) -> slog::Result {
        use std::fmt::Write;
        write!(self.0, " {}={}", key, val).map_err(|_| slog::Error::Other)
    }
}

fn create_drain(mode: LoggingMode) -> std::io::Result<Logger> {
    Ok(match mode {
        LoggingMode::Stderr => {
            let decorator = slog_term::TermDecorator::new().stderr().build();
            let drain = MeshAuthFormat::new(decorator).fuse();
            Logger::root(slog_async::Async::new(drain).build().fuse(), slog::o!())
        }
        LoggingMode::File(out) => {
            let file = File::create(out)?;
            let decorator = slog_term::PlainDecorator::new(file);
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            Logger::root(slog_async::Async::new(drain).build().fuse(), slog::o!())
        }
        LoggingMode::Tee(out) => Logger::root(
            slog::Duplicate::new(
                create_drain(LoggingMode::Stderr)?,
                create_drain(LoggingMode::File(out))?,
            )
            .fuse(),
            slog::o!(),
        ),
    })
}

/// Maps the verbosity (number of -v minus number of -q) onto a level.
/// `None` means logging is switched off entirely.
pub fn level_for_verbosity(verbose_level: i64) -> Option<Level> {
    match verbose_level {
        -3 => Some(Level::Critical),
        -2 => Some(Level::Error),
        -1 => Some(Level::Warning),
        0 => Some(Level::Info),
        1 => Some(Level::Debug),
        x if x > 1 => Some(Level::Trace),
        _ => None,
    }
}

pub fn create_root_logger(verbose_level: i64, mode: LoggingMode) -> std::io::Result<Logger> {
    let Some(log_level) = level_for_verbosity(verbose_level) else {
        return Ok(Logger::root(slog::Discard, slog::o!()));
    };

    let drain = slog::LevelFilter::new(create_drain(mode)?, log_level).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Ok(Logger::root(
        drain,
        slog::o!("version" => meshauth_version_str()),
    ))
}
