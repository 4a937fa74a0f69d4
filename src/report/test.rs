use super::fixtures::SharedBuffer;
use super::*;
use crate::dispatch::{FailureKind, Target};
use std::sync::{Arc, Mutex};

fn success<P>(host: &str, payload: P) -> Outcome<P> {
    Outcome::Success {
        host: Target::new(host),
        payload,
    }
}

fn failure<P>(host: &str, cause: &str) -> Outcome<P> {
    Outcome::Failure(FailureInfo {
        host: Target::new(host),
        kind: FailureKind::Transport,
        cause: cause.to_string(),
    })
}

mod console {
    use super::*;

    #[test]
    fn writes_each_line_with_a_newline() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let mut console = Console::new(out.clone(), err.clone());

        console
            .write_lines(&[Line::out("a"), Line::err("b"), Line::out("c")])
            .unwrap();

        assert_eq!("a\nc\n", out.contents());
        assert_eq!("b\n", err.contents());
    }

    #[test]
    fn preserves_order_across_streams() {
        let buffer = SharedBuffer::new();
        let mut console = Console::new(buffer.clone(), buffer.clone());

        console
            .write_lines(&[
                Line::err("header"),
                Line::out("one"),
                Line::out("two"),
                Line::err("oops"),
            ])
            .unwrap();

        assert_eq!("header\none\ntwo\noops\n", buffer.contents());
    }

    #[test]
    fn ignores_empty_blocks() {
        let buffer = SharedBuffer::new();
        let mut console = Console::new(buffer.clone(), buffer.clone());
        console.write_lines(&[]).unwrap();
        assert_eq!("", buffer.contents());
    }

    #[test]
    fn groups_runs_of_the_same_stream() {
        // Counts the calls to write_all by counting flushes.
        #[derive(Clone, Default)]
        struct Flushes(Arc<Mutex<usize>>);

        impl Write for Flushes {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                *self.0.lock().unwrap() += 1;
                Ok(())
            }
        }

        let out = Flushes::default();
        let err = Flushes::default();
        let mut console = Console::new(out.clone(), err.clone());

        console
            .write_lines(&[
                Line::out("1"),
                Line::out("2"),
                Line::out("3"),
                Line::err("4"),
                Line::out("5"),
            ])
            .unwrap();

        assert_eq!(2, *out.0.lock().unwrap());
        assert_eq!(1, *err.0.lock().unwrap());
    }
}

mod line_renderer {
    use super::*;

    #[test]
    fn works() {
        let mut renderer = LineRenderer;
        assert_eq!(
            vec![Line::out("fw-a: 10.0.0.1")],
            renderer.render(&success("fw-a", "10.0.0.1")),
        );
        assert_eq!(
            vec![Line::err("fw-b: timeout")],
            renderer.render(&failure::<&str>("fw-b", "timeout")),
        );
    }

    #[test]
    fn marks_empty_payloads() {
        let mut renderer = LineRenderer;
        assert_eq!(
            vec![Line::out("fw-a: (no data)")],
            renderer.render(&success("fw-a", String::new())),
        );
    }

    #[test]
    fn has_no_header() {
        assert!(Render::<String>::header(&mut LineRenderer).is_empty());
    }
}

mod banner_renderer {
    use super::*;

    #[test]
    fn works() {
        let mut renderer = BannerRenderer;
        let lines = renderer.render(&success("fw-a", "line 1\nline 2\n"));
        assert_eq!(
            vec![
                Line::out("========"),
                Line::out("= fw-a ="),
                Line::out("========"),
                Line::out("line 1"),
                Line::out("line 2"),
            ],
            lines,
        );
    }

    #[test]
    fn prints_only_the_banner_for_empty_output() {
        let mut renderer = BannerRenderer;
        assert_eq!(3, renderer.render(&success("fw-a", "")).len());
    }

    #[test]
    fn reports_failures_without_a_banner() {
        let mut renderer = BannerRenderer;
        assert_eq!(
            vec![Line::err("fw-a: SSH error: exit code 255")],
            renderer.render(&failure::<String>("fw-a", "SSH error: exit code 255")),
        );
    }
}

mod banner {
    use super::*;

    #[test]
    fn works() {
        let lines = banner("panorama.example.com");
        assert_eq!(3, lines.len());
        assert!(lines.iter().all(|line| line.stream == Stream::Out));
        assert_eq!("=".repeat(24), lines[0].text);
        assert_eq!("= panorama.example.com =", lines[1].text);
        assert_eq!(lines[0], lines[2]);
    }

    #[test]
    fn rule_spans_the_middle_line() {
        let lines = banner("fw-a");
        assert_eq!("========", lines[0].text);
        assert_eq!(lines[1].text.len(), lines[0].text.len());
    }
}

mod failure_line {
    use super::*;

    #[test]
    fn works() {
        let info = FailureInfo {
            host: Target::new("fw-a"),
            kind: FailureKind::Parse,
            cause: "Unable to parse response (no key element)".to_string(),
        };
        assert_eq!(
            Line::err("fw-a: Unable to parse response (no key element)"),
            failure_line(&info),
        );
    }
}

mod shared_buffer {
    use super::*;

    #[test]
    fn clones_share_contents() {
        let buffer = SharedBuffer::new();
        let mut writer = buffer.clone();
        writer.write_all(b"hello").unwrap();
        assert_eq!("hello", buffer.contents());
    }
}
