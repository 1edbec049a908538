//! Test harness for driving the pathwake binary end to end
//!
//! Spawns the built binary, feeds stdin, and collects delimited stdout
//! records on a background thread so tests can assert with timeouts.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Time allowed for the spawned process to install its watches
const STARTUP_DELAY: Duration = Duration::from_millis(500);
/// Time allowed for an expected report to arrive
const REPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// A running pathwake process under test
pub struct WatchProcess {
    child: Child,
    records: Receiver<Vec<u8>>,
    stderr: Arc<Mutex<Vec<u8>>>,
}

impl WatchProcess {
    /// Spawn `pathwake` with the given flags and positional paths, then give
    /// it time to install its watches.
    pub fn spawn(flags: &[&str], paths: &[&Path]) -> Self {
        Self::spawn_with_stdin(flags, paths, b"")
    }

    /// Same, also feeding `stdin_data` before closing stdin.
    pub fn spawn_with_stdin(flags: &[&str], paths: &[&Path], stdin_data: &[u8]) -> Self {
        let delimiter = if flags.contains(&"-0") { 0 } else { b'\n' };

        let mut child = Command::new(env!("CARGO_BIN_EXE_pathwake"))
            .args(flags)
            .args(paths)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn pathwake");

        {
            // Dropping the handle closes the pipe and ends path ingestion.
            let mut stdin = child.stdin.take().expect("stdin handle");
            stdin.write_all(stdin_data).expect("writing stdin");
        }

        let stdout = child.stdout.take().expect("stdout handle");
        let (tx, records) = mpsc::channel();
        thread::spawn(move || split_records(stdout, delimiter, tx));

        let stderr = Arc::new(Mutex::new(Vec::new()));
        let mut stderr_pipe = child.stderr.take().expect("stderr handle");
        let sink = Arc::clone(&stderr);
        thread::spawn(move || {
            let mut buf = [0u8; 1024];
            while let Ok(n) = stderr_pipe.read(&mut buf) {
                if n == 0 {
                    break;
                }
                sink.lock().unwrap().extend_from_slice(&buf[..n]);
            }
        });

        thread::sleep(STARTUP_DELAY);
        Self {
            child,
            records,
            stderr,
        }
    }

    /// Next report record, without its delimiter
    pub fn expect_record(&self) -> Vec<u8> {
        self.records
            .recv_timeout(REPORT_TIMEOUT)
            .expect("no report within timeout")
    }

    /// Assert that no report arrives within `window`
    pub fn expect_silence(&self, window: Duration) {
        match self.records.recv_timeout(window) {
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
            Ok(record) => panic!(
                "unexpected report: {:?}",
                String::from_utf8_lossy(&record)
            ),
        }
    }

    /// Wait for the process to exit on its own
    pub fn wait_exit(&mut self, timeout: Duration) -> ExitStatus {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait().expect("try_wait") {
                return status;
            }
            assert!(
                Instant::now() < deadline,
                "process did not exit within {timeout:?}"
            );
            thread::sleep(Duration::from_millis(25));
        }
    }

    /// Everything the process has written to stderr so far
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr.lock().unwrap()).into_owned()
    }
}

impl Drop for WatchProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Split the raw stdout stream into delimiter-terminated records
fn split_records(mut stdout: impl Read, delimiter: u8, tx: mpsc::Sender<Vec<u8>>) {
    let mut acc = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stdout.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                for &byte in &buf[..n] {
                    if byte == delimiter {
                        if tx.send(std::mem::take(&mut acc)).is_err() {
                            return;
                        }
                    } else {
                        acc.push(byte);
                    }
                }
            }
        }
    }
}
