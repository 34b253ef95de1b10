//! In-browser video capture state, one instance per form.

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use time::OffsetDateTime;

pub const MAX_RECORDING_SECS: u32 = 60;
pub const RECORDING_CONTENT_TYPE: &str = "video/webm";

/// Container/codec string handed to the media recorder.
pub fn preferred_recorder_mime(vp9_supported: bool) -> &'static str {
    if vp9_supported {
        "video/webm;codecs=vp9"
    } else {
        RECORDING_CONTENT_TYPE
    }
}

#[derive(Debug, Clone)]
pub struct RecordedVideo {
    pub bytes: Bytes,
    pub file_name: String,
    pub content_type: &'static str,
    pub duration_secs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("a recording is already in progress")]
    AlreadyRecording,
}

#[derive(Debug, PartialEq)]
pub enum Tick {
    Running { elapsed_secs: u32 },
    /// The time limit was reached and the recording stopped on its own.
    Finished(RecordedVideoSummary),
}

/// What `Tick::Finished` reports; the video itself is taken with `take`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedVideoSummary {
    pub file_name: String,
    pub size: u64,
}

#[derive(Debug, Default)]
pub struct Recorder {
    chunks: Vec<Bytes>,
    elapsed_secs: u32,
    recording: bool,
    finished: Option<RecordedVideo>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn start(&mut self) -> Result<(), RecorderError> {
        if self.recording {
            return Err(RecorderError::AlreadyRecording);
        }
        self.chunks.clear();
        self.elapsed_secs = 0;
        self.finished = None;
        self.recording = true;
        Ok(())
    }

    /// Empty chunks are ignored.
    pub fn push_chunk(&mut self, chunk: Bytes) {
        if self.recording && !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    /// Called once per second while recording.
    pub fn tick(&mut self, now: OffsetDateTime) -> Option<Tick> {
        if !self.recording {
            return None;
        }
        self.elapsed_secs += 1;
        if self.elapsed_secs >= MAX_RECORDING_SECS {
            let video = self.stop(now)?;
            return Some(Tick::Finished(RecordedVideoSummary {
                file_name: video.file_name.clone(),
                size: video.bytes.len() as u64,
            }));
        }
        Some(Tick::Running {
            elapsed_secs: self.elapsed_secs,
        })
    }

    /// Stops capture and assembles the file. `None` if nothing was recording.
    pub fn stop(&mut self, now: OffsetDateTime) -> Option<&RecordedVideo> {
        if !self.recording {
            return None;
        }
        self.recording = false;

        let mut buffer = BytesMut::with_capacity(self.chunks.iter().map(Bytes::len).sum());
        for chunk in self.chunks.drain(..) {
            buffer.extend_from_slice(&chunk);
        }
        let millis = now.unix_timestamp_nanos() / 1_000_000;

        let video = RecordedVideo {
            bytes: buffer.freeze(),
            file_name: format!("review-{}.webm", millis),
            content_type: RECORDING_CONTENT_TYPE,
            duration_secs: self.elapsed_secs,
        };
        self.elapsed_secs = 0;
        self.finished = Some(video);
        self.finished.as_ref()
    }

    /// Hands over the last finished recording.
    pub fn take(&mut self) -> Option<RecordedVideo> {
        self.finished.take()
    }

    /// `mm:ss` label for the running timer.
    pub fn timer_label(&self) -> String {
        format_timer(self.elapsed_secs)
    }
}

pub fn format_timer(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
