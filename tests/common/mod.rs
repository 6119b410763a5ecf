#![allow(dead_code)]

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use serial_monitor::{
    config::{LogAddr, Settings, SinkConfig},
    dispatcher::Sinks,
    sink::ConsoleSink,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
    task::JoinHandle,
};

/// A console which tests can read back from.
#[derive(Debug, Clone, Default)]
pub struct SharedConsole(Arc<Mutex<Vec<u8>>>);

impl SharedConsole {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for SharedConsole {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("serial-monitor-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Everything written to the log files in `dir`.
pub fn read_logs(dir: &Path) -> String {
    let mut contents = String::new();
    for entry in fs::read_dir(dir).unwrap() {
        contents += &fs::read_to_string(entry.unwrap().path()).unwrap();
    }
    contents
}

pub fn settings(log_dir: Option<PathBuf>, log_addr: Option<LogAddr>) -> Settings {
    Settings {
        port: "test".into(),
        baud: 9600,
        read_timeout: Duration::from_millis(20),
        sinks: SinkConfig {
            log_dir,
            log_addr,
            quiet: false,
        },
    }
}

pub fn sinks(settings: &Settings) -> (Sinks<SharedConsole>, SharedConsole) {
    let console = SharedConsole::default();
    let sinks =
        Sinks::with_console(ConsoleSink::new(console.clone(), false), &settings.sinks).unwrap();

    (sinks, console)
}

/// A log collector accepting a single connection.
/// Resolves to every line received once the connection closes.
pub async fn collector() -> (LogAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(socket).lines();

        let mut received = vec![];
        while let Some(line) = lines.next_line().await.unwrap() {
            received.push(line);
        }
        received
    });

    (
        LogAddr {
            host: "127.0.0.1".into(),
            port,
        },
        handle,
    )
}
