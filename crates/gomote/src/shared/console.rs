use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// User-facing output. Instance ids go to `out`, `# ...` progress lines to `err`.
///
/// Clones share the same writers, so lines from concurrent tasks interleave
/// but never tear.
#[derive(Clone)]
pub struct Console {
    out: SharedWriter,
    err: SharedWriter,
}

impl Console {
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
            err: Arc::new(Mutex::new(err)),
        }
    }

    /// A console that records everything written to it.
    pub fn captured() -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        let console = Self::new(
            Box::new(BufferWriter(captured.out.clone())),
            Box::new(BufferWriter(captured.err.clone())),
        );
        (console, captured)
    }

    pub fn println(&self, line: impl Display) {
        write_line(&self.out, line);
    }

    pub fn status(&self, line: impl Display) {
        write_line(&self.err, line);
    }
}

fn write_line(writer: &SharedWriter, line: impl Display) {
    let mut writer = writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Err(error) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
        tracing::warn!(error = %error, "Failed to write console output");
    }
}

#[derive(Clone, Default)]
pub struct CapturedOutput {
    out: Arc<Mutex<Vec<u8>>>,
    err: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn stdout(&self) -> String {
        read_buffer(&self.out)
    }

    pub fn stderr(&self) -> String {
        read_buffer(&self.err)
    }

    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout().lines().map(ToString::to_string).collect()
    }

    pub fn stderr_lines(&self) -> Vec<String> {
        self.stderr().lines().map(ToString::to_string).collect()
    }
}

fn read_buffer(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
    let buffer = buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    String::from_utf8_lossy(&buffer).into_owned()
}

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Formats an elapsed time rounded to whole seconds, e.g. `0s`, `42s`, `3m7s`, `1h0m5s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let mut secs = elapsed.as_secs();
    if elapsed.subsec_millis() >= 500 {
        secs += 1;
    }
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_console_separates_streams() {
        let (console, captured) = Console::captured();
        console.println("inst-1");
        console.status("# still creating");
        console.println("inst-2");

        assert_eq!(captured.stdout_lines(), vec!["inst-1", "inst-2"]);
        assert_eq!(captured.stderr_lines(), vec!["# still creating"]);
    }

    #[test]
    fn test_format_elapsed_rounds_to_seconds() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "0s");
        assert_eq!(format_elapsed(Duration::from_millis(1_499)), "1s");
        assert_eq!(format_elapsed(Duration::from_millis(1_500)), "2s");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "59s");
    }

    #[test]
    fn test_format_elapsed_minutes_and_hours() {
        assert_eq!(format_elapsed(Duration::from_secs(187)), "3m7s");
        assert_eq!(format_elapsed(Duration::from_secs(3_605)), "1h0m5s");
    }
}
