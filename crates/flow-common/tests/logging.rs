use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use flow_common::{LogConfig, LogFormat, LogSettings, init_logging_with_writer};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn json_logging_captures_flow_events() {
    let capture = Capture::default();
    let writer = capture.clone();
    let settings = LogSettings {
        format: LogFormat::Json,
        ..LogSettings::default()
    };
    let config = LogConfig::from_settings(&settings, 1).with_target(true);

    init_logging_with_writer(&config, move || writer.clone()).unwrap();
    assert!(init_logging_with_writer(&config, io::sink).is_err());

    tracing::debug!(target: "flow_session::book_tab", book = "moby", "session state");

    let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    if std::env::var_os("RUST_LOG").is_none() {
        assert!(output.contains("\"book\":\"moby\""));
        assert!(output.contains("flow_session::book_tab"));
    }
}
