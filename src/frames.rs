use anyhow::{Context, Error, Result};
use flume::Receiver;
use poseguide_core::{Landmark, LandmarkSet};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

const CHANNEL_DEPTH: usize = 8;

/// Landmarks for one video frame, one set per detected subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub timestamp_ms: Option<u64>,
    pub width: u32,
    pub height: u32,
    pub subjects: Vec<LandmarkSet>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireLandmark {
    Object(Landmark),
    Array(Vec<f32>),
}

impl TryFrom<WireLandmark> for Landmark {
    type Error = Error;

    fn try_from(wire: WireLandmark) -> Result<Landmark> {
        match wire {
            WireLandmark::Object(lm) => Ok(lm),
            WireLandmark::Array(coords) => match coords[..] {
                [x, y] => Ok(Landmark::new(x, y)),
                [x, y, z] => Ok(Landmark {
                    z,
                    ..Landmark::new(x, y)
                }),
                _ => Err(Error::msg(format!(
                    "Landmark arrays need 2 or 3 coordinates, got {}",
                    coords.len()
                ))),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(default)]
    timestamp_ms: Option<u64>,
    width: u32,
    height: u32,
    #[serde(default)]
    subjects: Vec<Vec<WireLandmark>>,
}

pub fn parse_line(line: &str) -> Result<Frame> {
    let wire: WireFrame = serde_json::from_str(line)?;

    let subjects = wire
        .subjects
        .into_iter()
        .map(|subject| {
            subject
                .into_iter()
                .map(Landmark::try_from)
                .collect::<Result<Vec<_>>>()
                .map(LandmarkSet::new)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Frame {
        timestamp_ms: wire.timestamp_ms,
        width: wire.width,
        height: wire.height,
        subjects,
    })
}

/// `-` reads stdin.
pub fn open(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    if path.as_os_str() == "-" {
        debug!("Reading frames from stdin");
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }

    let file = File::open(path).with_context(|| format!("Failed to open frames at {path:?}"))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Parse frames on a dedicated thread. Bad lines are skipped; the channel
/// closes at end of input.
pub fn spawn_reader(reader: Box<dyn BufRead + Send>) -> FrameReader {
    let (tx, rx) = flume::bounded(CHANNEL_DEPTH);

    let handle = thread::spawn(move || {
        for (n, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to read frame input: {e:?}");
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line) {
                Ok(frame) => {
                    if tx.send(frame).is_err() {
                        debug!("Frame consumer hung up");
                        break;
                    }
                }
                Err(e) => warn!("Skipping line {}: {e:?}", n + 1),
            }
        }
    });

    FrameReader { rx, handle }
}

pub struct FrameReader {
    rx: Receiver<Frame>,
    handle: JoinHandle<()>,
}

impl FrameReader {
    pub fn frames(&self) -> flume::Iter<'_, Frame> {
        self.rx.iter()
    }

    /// Hang up on the reader. A thread still blocked on input (an idle
    /// stdin) is left detached rather than joined.
    pub fn close(self) {
        drop(self.rx);

        if !self.handle.is_finished() {
            debug!("Frame reader still waiting on input, detaching");
            return;
        }

        if self.handle.join().is_err() {
            error!("Frame reader thread panicked");
        }
    }
}

/// Drops frames arriving faster than the minimum interval.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    min_interval_ms: u64,
    last_ms: Option<u64>,
}

impl FrameThrottle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_ms: None,
        }
    }

    /// Frames without a timestamp always pass. A timestamp earlier than the
    /// last accepted one restarts the clock.
    pub fn accept(&mut self, timestamp_ms: Option<u64>) -> bool {
        let Some(ts) = timestamp_ms else {
            return true;
        };

        match self.last_ms {
            Some(last) if ts >= last && ts - last < self.min_interval_ms => false,
            _ => {
                self.last_ms = Some(ts);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::time::{Duration, Instant};

    #[test]
    fn test_parse_mixed_landmark_forms() {
        let frame = parse_line(
            r#"{"timestamp_ms": 40, "width": 720, "height": 1280,
                "subjects": [[{"x": 0.1, "y": 0.2, "visibility": 0.9}, [0.3, 0.4], [0.5, 0.6, -0.1]]]}"#,
        )
        .unwrap();

        assert_eq!(frame.timestamp_ms, Some(40));
        assert_eq!((frame.width, frame.height), (720, 1280));
        assert_eq!(frame.subjects.len(), 1);

        let set = &frame.subjects[0];
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(0).unwrap().visibility, Some(0.9));
        assert_eq!(*set.get(1).unwrap(), Landmark::new(0.3, 0.4));
        assert_eq!(set.get(2).unwrap().z, -0.1);
    }

    #[test]
    fn test_parse_without_subjects() {
        let frame = parse_line(r#"{"width": 10, "height": 10}"#).unwrap();
        assert!(frame.subjects.is_empty());
        assert_eq!(frame.timestamp_ms, None);
    }

    #[test]
    fn test_parse_rejects_bad_arrays() {
        assert!(parse_line(r#"{"width": 10, "height": 10, "subjects": [[[0.1]]]}"#).is_err());
        assert!(parse_line(r#"{"width": 10}"#).is_err());
        assert!(parse_line("not json").is_err());
    }

    #[test]
    fn test_reader_skips_bad_lines() {
        let input = concat!(
            "{\"width\": 10, \"height\": 10, \"timestamp_ms\": 1}\n",
            "garbage\n",
            "\n",
            "{\"width\": 20, \"height\": 10, \"timestamp_ms\": 2}\n",
        );
        let reader = spawn_reader(Box::new(Cursor::new(input)));
        let frames: Vec<_> = reader.frames().collect();
        reader.close();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].width, 20);
    }

    // Hands out one frame, then stalls like an idle pipe.
    struct StallingInput {
        sent: bool,
        stall: Duration,
    }

    impl Read for StallingInput {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.sent {
                self.sent = true;
                let line = b"{\"width\": 10, \"height\": 10}\n";
                buf[..line.len()].copy_from_slice(line);
                return Ok(line.len());
            }
            thread::sleep(self.stall);
            Ok(0)
        }
    }

    #[test]
    fn test_close_does_not_wait_on_stalled_input() {
        let input = StallingInput {
            sent: false,
            stall: Duration::from_secs(5),
        };
        let reader = spawn_reader(Box::new(BufReader::new(input)));
        assert!(reader.frames().next().is_some());

        let start = Instant::now();
        reader.close();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_throttle() {
        let mut throttle = FrameThrottle::new(16);
        assert!(throttle.accept(Some(0)));
        assert!(!throttle.accept(Some(10)));
        assert!(throttle.accept(Some(16)));
        assert!(!throttle.accept(Some(31)));
        assert!(throttle.accept(None));
        assert!(throttle.accept(Some(40)));
        // stream restarted
        assert!(throttle.accept(Some(5)));
        assert!(!throttle.accept(Some(6)));
    }
}
