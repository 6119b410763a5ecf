use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing::debug;

use super::SinkError;
use crate::record::LogRecord;

/// The active log file. Rotated files get a numeric suffix, `device.log.1` being the newest.
pub const FILE_NAME: &str = "device.log";

/// How many rotated files are kept next to the active one.
pub const RETAINED_FILES: usize = 14;

/// Check that `dir` is a directory in which the log file can be opened for appending.
pub fn check_writable(dir: &Path) -> Result<(), SinkError> {
    let metadata =
        fs::metadata(dir).map_err(|e| SinkError::NotWritable(format!("{dir:?}: {e}")))?;

    if !metadata.is_dir() {
        return Err(SinkError::NotWritable(format!("{dir:?} is not a directory")));
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(FILE_NAME))
        .map_err(|e| SinkError::NotWritable(format!("{dir:?}: {e}")))?;

    Ok(())
}

/// Appends `{timestamp} she {annotation} {message}` lines to a log file.
///
/// The file is rotated when a record's timestamp falls on a new local day,
/// and the oldest files are removed so that at most [`RETAINED_FILES`] old files remain.
pub struct FileSink {
    appender: BasicRollingFileAppender,
    dir: PathBuf,
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink").field("dir", &self.dir).finish()
    }
}

impl FileSink {
    /// Set up the sink in an existing, writable directory.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, SinkError> {
        let dir = dir.as_ref();
        check_writable(dir)?;

        let appender = BasicRollingFileAppender::new(
            dir.join(FILE_NAME),
            RollingConditionBasic::new().daily(),
            RETAINED_FILES,
        )?;

        debug!(?dir, "File sink ready");

        Ok(Self {
            appender,
            dir: dir.to_path_buf(),
        })
    }

    /// The directory log files end up in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append a record.
    ///
    /// The record's own timestamp decides whether the file rotates first,
    /// and a line never straddles two files.
    pub fn write(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        let mut line = record.device_line();
        line.push('\n');

        let mut remaining = line.as_bytes();
        while !remaining.is_empty() {
            let written = self
                .appender
                .write_with_datetime(remaining, &record.timestamp)?;

            if written == 0 {
                return Err(io::Error::from(io::ErrorKind::WriteZero).into());
            }
            remaining = &remaining[written..];
        }

        Ok(())
    }

    /// Make sure everything written so far is on disk.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.appender.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Days, Local, NaiveTime};

    use super::*;
    use crate::serial::{Completeness, Frame};

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("serial-monitor-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn read_all(dir: &Path) -> String {
        let mut contents = String::new();
        for entry in fs::read_dir(dir).unwrap() {
            contents += &fs::read_to_string(entry.unwrap().path()).unwrap();
        }
        contents
    }

    fn she_at(text: &str, timestamp: DateTime<Local>) -> LogRecord {
        LogRecord::pair(&Frame::new_lossy(text, Completeness::Complete), timestamp).1
    }

    /// Local time on the day `days` after today.
    fn local_day(days: u64, time: NaiveTime) -> DateTime<Local> {
        (Local::now().date_naive() + Days::new(days))
            .and_time(time)
            .and_local_timezone(Local)
            .earliest()
            .unwrap()
    }

    #[test]
    fn appends_device_lines() {
        let dir = scratch_dir();
        let mut sink = FileSink::new(&dir).unwrap();

        for (text, completeness) in [
            ("hello", Completeness::Complete),
            ("partial", Completeness::Partial),
        ] {
            let (_, she) = LogRecord::pair(&Frame::new_lossy(text, completeness), Local::now());
            sink.write(&she).unwrap();
        }
        sink.flush().unwrap();

        let contents = fs::read_to_string(dir.join(FILE_NAME)).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" she said hello"), "{lines:?}");
        assert!(lines[1].ends_with(" she zzzz partial"), "{lines:?}");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn active_file_is_created_up_front() {
        let dir = scratch_dir();
        let _sink = FileSink::new(&dir).unwrap();

        let names = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();

        assert_eq!(names, vec![FILE_NAME.to_string()]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn rotates_at_local_midnight() {
        let dir = scratch_dir();
        let mut sink = FileSink::new(&dir).unwrap();

        let now = Local::now();
        let last_second_today = local_day(0, NaiveTime::from_hms_opt(23, 59, 59).unwrap()).max(now);
        let just_after_midnight = local_day(1, NaiveTime::from_hms_opt(0, 0, 1).unwrap());

        sink.write(&she_at("morning", now)).unwrap();
        sink.write(&she_at("late", last_second_today)).unwrap();
        sink.write(&she_at("tomorrow", just_after_midnight)).unwrap();
        sink.flush().unwrap();

        let active = fs::read_to_string(dir.join(FILE_NAME)).unwrap();
        assert_eq!(active.lines().count(), 1, "{active:?}");
        assert!(active.ends_with(" she said tomorrow\n"), "{active:?}");

        // Everything from the previous local day went to a single rotated file.
        let rotated = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.file_name().unwrap() != FILE_NAME)
            .collect::<Vec<_>>();
        assert_eq!(rotated.len(), 1, "{rotated:?}");

        let old = fs::read_to_string(&rotated[0]).unwrap();
        let old = old.lines().collect::<Vec<_>>();
        assert_eq!(old.len(), 2, "{old:?}");
        assert!(old[0].ends_with(" she said morning"));
        assert!(old[1].ends_with(" she said late"));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn old_files_are_pruned() {
        let dir = scratch_dir();
        let mut sink = FileSink::new(&dir).unwrap();

        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        for day in 1..=(RETAINED_FILES as u64 + 6) {
            sink.write(&she_at(&format!("day {day}"), local_day(day, noon)))
                .unwrap();
        }
        sink.flush().unwrap();

        let files = fs::read_dir(&dir).unwrap().count();
        assert!(files > 1);
        assert!(files <= RETAINED_FILES + 1, "{files} files kept");

        // The newest day is in the active file, the first one is gone.
        let contents = read_all(&dir);
        assert!(contents.contains(&format!(" day {}\n", RETAINED_FILES + 6)));
        assert!(!contents.contains(" day 1\n"));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = std::env::temp_dir().join(format!("serial-monitor-{}", uuid::Uuid::new_v4()));

        assert!(matches!(FileSink::new(&dir), Err(SinkError::NotWritable(_))));
        assert!(!dir.exists());
    }

    #[test]
    fn regular_file_is_rejected() {
        let dir = scratch_dir();
        let file = dir.join("not-a-dir");
        fs::write(&file, "").unwrap();

        assert!(matches!(FileSink::new(&file), Err(SinkError::NotWritable(_))));

        fs::remove_dir_all(dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn directory_without_write_access_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let dir = scratch_dir();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users write regardless of the mode bits.
        let privileged = fs::File::create(dir.join("scratch")).is_ok();

        if !privileged {
            assert!(matches!(
                check_writable(&dir),
                Err(SinkError::NotWritable(_))
            ));
            assert!(matches!(FileSink::new(&dir), Err(SinkError::NotWritable(_))));
        }

        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
        fs::remove_dir_all(dir).unwrap();
    }
}
