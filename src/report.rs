//! Turns outcomes into lines of user output.
//!
//! The arrangement here keeps formatting and writing apart. A [Render] implementation is a pure
//! formatter: given an [Outcome], it returns the [Line]s that describe it and never touches a
//! writer. A [Console] does the writing. Only the aggregator owns a [Console], which is what keeps
//! the output of many hosts from getting mangled when they finish at the same time.
//!
//! Each block of lines is assembled in memory and handed to the underlying writer in as few
//! `write_all` calls as possible. The real standard streams lock once per call, so a block is
//! never split by other writers to the same stream (e.g. log messages on stderr). We do not hold
//! the locks across blocks, because log output from workers would then stall until the run ends.
//!
//! [Outcome]: crate::dispatch::Outcome

use crate::dispatch::{FailureInfo, Outcome};
use std::fmt::Display;
use std::io::{self, Write};

/// Which standard stream a line belongs on.
///
/// Data goes to [Stream::Out] so it can be piped. Headers, failures, and other commentary go to
/// [Stream::Err].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Out,
    Err,
}

/// One line of output, without its trailing newline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub stream: Stream,
    pub text: String,
}

impl Line {
    pub fn out(text: impl Into<String>) -> Self {
        Line {
            stream: Stream::Out,
            text: text.into(),
        }
    }

    pub fn err(text: impl Into<String>) -> Self {
        Line {
            stream: Stream::Err,
            text: text.into(),
        }
    }
}

/// Formats outcomes of one payload type for display.
pub trait Render<P>: Send {
    /// Lines to print once, before any outcome, e.g. a table header.
    fn header(&mut self) -> Vec<Line> {
        Vec::new()
    }

    /// Lines describing one outcome.
    fn render(&mut self, outcome: &Outcome<P>) -> Vec<Line>;
}

/// The formatting every renderer uses for a failed host.
pub fn failure_line(info: &FailureInfo) -> Line {
    Line::err(format!("{}: {}", info.host, info.cause))
}

/// A three-line banner that introduces a block of per-host output.
///
/// ```
/// let banner = panw::report::banner("fw-a");
/// assert_eq!("========", banner[0].text);
/// assert_eq!("= fw-a =", banner[1].text);
/// ```
pub fn banner(host: &str) -> Vec<Line> {
    let rule = "=".repeat(host.len() + 4);
    vec![
        Line::out(rule.clone()),
        Line::out(format!("= {host} =")),
        Line::out(rule),
    ]
}

/// Renders each outcome as a single `host: payload` line.
///
/// A success with an empty payload is marked explicitly so that it can't be mistaken for a
/// failure or for missing output.
#[derive(Clone, Debug, Default)]
pub struct LineRenderer;

impl<P: Display> Render<P> for LineRenderer {
    fn render(&mut self, outcome: &Outcome<P>) -> Vec<Line> {
        match outcome {
            Outcome::Success { host, payload } => {
                let payload = payload.to_string();
                if payload.is_empty() {
                    vec![Line::out(format!("{host}: (no data)"))]
                } else {
                    vec![Line::out(format!("{host}: {payload}"))]
                }
            }
            Outcome::Failure(info) => vec![failure_line(info)],
        }
    }
}

/// Renders each outcome as a banner followed by the payload's text.
#[derive(Clone, Debug, Default)]
pub struct BannerRenderer;

impl<P: AsRef<str>> Render<P> for BannerRenderer {
    fn render(&mut self, outcome: &Outcome<P>) -> Vec<Line> {
        match outcome {
            Outcome::Success { host, payload } => {
                let mut lines = banner(host.as_str());
                lines.extend(payload.as_ref().lines().map(Line::out));
                lines
            }
            Outcome::Failure(info) => vec![failure_line(info)],
        }
    }
}

/// The destination of all user output: a pair of writers standing in for stdout and stderr.
pub struct Console {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl Console {
    pub fn new(out: impl Write + Send + 'static, err: impl Write + Send + 'static) -> Self {
        Console {
            out: Box::new(out),
            err: Box::new(err),
        }
    }

    /// A [Console] on the process's real stdout and stderr.
    pub fn stdio() -> Self {
        Console::new(io::stdout(), io::stderr())
    }

    /// Writes a block of lines, keeping consecutive lines for the same stream together.
    pub fn write_lines(&mut self, lines: &[Line]) -> io::Result<()> {
        let mut run = String::new();
        let mut current = None;
        for line in lines {
            if current.is_some_and(|stream| stream != line.stream) {
                self.write_run(current, &run)?;
                run.clear();
            }
            current = Some(line.stream);
            run.push_str(&line.text);
            run.push('\n');
        }
        self.write_run(current, &run)
    }

    fn write_run(&mut self, stream: Option<Stream>, run: &str) -> io::Result<()> {
        let writer = match stream {
            Some(Stream::Out) => &mut self.out,
            Some(Stream::Err) => &mut self.err,
            None => return Ok(()),
        };
        writer.write_all(run.as_bytes())?;
        writer.flush()
    }
}

#[cfg(test)]
pub mod fixtures {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// An in-memory writer whose clones all append to the same buffer.
    ///
    /// Passing two clones to [Console::new](super::Console::new) captures stdout and stderr
    /// interleaved in the order they were written.
    #[derive(Clone, Debug, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Returns everything written so far, lossily decoded as UTF-8.
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod test;
