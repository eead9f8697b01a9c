use mnet_core::decoder::Decoder;
use mnet_core::protocol::checksum::checksum_byte_for;
use mnet_core::protocol::{ByteSource, ProtocolError};
use mnet_core::sniffer::Sniffer;
use mnet_core::trace::{TraceLog, TraceSink};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One step of a scripted bus
enum Step {
    Byte(u8),
    Silence,
    Fail,
}

/// Byte source replaying a script, then requesting cancellation
struct ScriptedBus {
    steps: VecDeque<Step>,
    cancel: Arc<AtomicBool>,
}

impl ScriptedBus {
    fn new(steps: Vec<Step>, cancel: Arc<AtomicBool>) -> Self {
        Self {
            steps: steps.into(),
            cancel,
        }
    }
}

impl ByteSource for ScriptedBus {
    fn read_byte(&mut self, _timeout: Duration) -> Result<Option<u8>, ProtocolError> {
        match self.steps.pop_front() {
            Some(Step::Byte(b)) => Ok(Some(b)),
            Some(Step::Silence) => Ok(None),
            Some(Step::Fail) => Err(ProtocolError::SerialError("device unplugged".to_string())),
            None => {
                self.cancel.store(true, Ordering::SeqCst);
                Ok(None)
            }
        }
    }
}

/// Sink that refuses every write
struct BrokenSink;

impl TraceSink for BrokenSink {
    fn write(&mut self, _text: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }
}

fn frame(header: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut bytes = header.to_vec();
    bytes.push(payload.len() as u8);
    bytes.extend_from_slice(payload);
    bytes.push(checksum_byte_for(&bytes));
    bytes.push(0x00);
    bytes
}

fn bytes(frame: &[u8]) -> impl Iterator<Item = Step> + '_ {
    frame.iter().map(|b| Step::Byte(*b))
}

/// Drop the elapsed-time column so runs can be compared
fn strip_time(trace: &str) -> Vec<String> {
    trace
        .lines()
        .map(|line| line.get(11..).unwrap_or("").to_string())
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn run_script(steps: Vec<Step>, timeout: Duration) -> (Result<u64, ProtocolError>, String) {
    init_tracing();
    let cancel = Arc::new(AtomicBool::new(false));
    let bus = ScriptedBus::new(steps, Arc::clone(&cancel));
    let mut out = String::new();
    let result = {
        let mut sniffer = Sniffer::new(bus, &mut out, Decoder::default(), timeout, cancel)
            .with_poll_interval(Duration::from_millis(10));
        sniffer.run().map(|stats| stats.frames)
    };
    (result, out)
}

#[test]
fn test_frames_rendered_in_arrival_order() {
    let status = frame([0xFB, 0x00, 0x00, 0x01], &[0x2D, 0x01]);
    let reply = frame([0x01, 0x00, 0x00, 0xFB], &[0x2D, 0x81, 0x01, 0x00, 0x00]);
    let steps: Vec<Step> = bytes(&status).chain(bytes(&reply)).collect();

    let (result, out) = run_script(steps, Duration::from_secs(10));
    assert_eq!(result.expect("clean shutdown"), 2);
    assert_eq!(
        strip_time(&out),
        vec![
            "FB 00 00 01 02 2D 01 D4 00 get status".to_string(),
            "01 00 00 FB 05 2D 81 01 00 00 50 00  running".to_string(),
        ]
    );
}

#[test]
fn test_idle_window_emits_heartbeat() {
    let status = frame([0xFB, 0x00, 0x00, 0x01], &[0x2D, 0x01]);
    let mut steps: Vec<Step> = bytes(&status[..3]).collect();
    // 3 polls of 10ms reach the 30ms idle window
    steps.extend([Step::Silence, Step::Silence, Step::Silence]);
    steps.extend(bytes(&status));

    let (result, out) = run_script(steps, Duration::from_millis(30));
    assert_eq!(result.expect("clean shutdown"), 1);

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "");
    assert!(lines[1].trim().parse::<f64>().is_ok());
    assert!(lines[2].ends_with("get status"));
}

#[test]
fn test_cancellation_discards_partial_frame() {
    let status = frame([0xFB, 0x00, 0x00, 0x01], &[0x2D, 0x01]);
    let steps: Vec<Step> = bytes(&status[..6]).collect();

    let (result, out) = run_script(steps, Duration::from_secs(10));
    assert_eq!(result.expect("clean shutdown"), 0);
    assert_eq!(out, "");
}

#[test]
fn test_source_failure_is_fatal() {
    let status = frame([0xFB, 0x00, 0x00, 0x01], &[0x2D, 0x01]);
    let mut steps: Vec<Step> = bytes(&status).collect();
    steps.push(Step::Fail);
    steps.extend(bytes(&status));

    let (result, out) = run_script(steps, Duration::from_secs(10));
    assert!(matches!(result, Err(ProtocolError::SerialError(_))));
    assert_eq!(out.lines().count(), 1);
}

#[test]
fn test_sink_failure_is_fatal() {
    let cancel = Arc::new(AtomicBool::new(false));
    let status = frame([0xFB, 0x00, 0x00, 0x01], &[0x2D, 0x01]);
    let bus = ScriptedBus::new(bytes(&status).collect(), Arc::clone(&cancel));

    let mut sniffer = Sniffer::new(bus, BrokenSink, Decoder::default(), Duration::from_secs(1), cancel);
    assert!(matches!(sniffer.run(), Err(ProtocolError::IoError(_))));
}

#[test]
fn test_sessions_are_repeatable() {
    let script = || {
        let mut steps: Vec<Step> = Vec::new();
        steps.extend(bytes(&frame([0xFB, 0x00, 0x00, 0x01], &[0x2D, 0x0E])).collect::<Vec<_>>());
        steps.extend(bytes(&frame([0x01, 0x00, 0x00, 0xFB], &[0x2D, 0x8E, 0x04])).collect::<Vec<_>>());
        steps.push(Step::Silence);
        steps
    };

    let (_, first) = run_script(script(), Duration::from_millis(10));
    let (_, second) = run_script(script(), Duration::from_millis(10));
    assert_eq!(strip_time(&first), strip_time(&second));
    assert!(first.contains(" low\n"));
}

#[test]
fn test_trace_log_receives_session_output() {
    init_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("log.txt");
    let cancel = Arc::new(AtomicBool::new(false));
    let bus = ScriptedBus::new(
        bytes(&frame([0xFB, 0x00, 0x00, 0x01], &[0x25, 0x01])).collect(),
        Arc::clone(&cancel),
    );

    let sink = TraceLog::open(&path, false).expect("open trace");
    let mut sniffer = Sniffer::new(bus, sink, Decoder::default(), Duration::from_secs(1), cancel);
    sniffer.run().expect("clean shutdown");
    drop(sniffer);

    let contents = std::fs::read_to_string(&path).expect("read trace");
    assert!(contents.ends_with("get setpoint temp\n"));
}
