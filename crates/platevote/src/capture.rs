//! Camera capture boundary.
//!
//! Plate recognition is an external collaborator: it turns a frame into a
//! best-effort text guess, possibly empty. Guesses only ever pre-fill the
//! input; a vote is still cast with whatever text the user confirms, which
//! goes through normal plate validation.

use crate::plate::normalize;

/// A single captured image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Raw pixel data in the reader's expected layout.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Create a frame.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Trait for plate text extraction backends.
///
/// Implementors return their best guess at the plate text in a frame, or an
/// empty string when nothing was recognized. They must not fail.
pub trait PlateReader: Send + Sync {
    /// Extract a plate text guess from `frame`.
    fn extract_plate_guess(&self, frame: &Frame) -> String;
}

impl<F> PlateReader for F
where
    F: Fn(&Frame) -> String + Send + Sync,
{
    fn extract_plate_guess(&self, frame: &Frame) -> String {
        self(frame)
    }
}

/// An explicit capture session wrapping one reader.
#[derive(Debug)]
pub struct CaptureSession<R> {
    reader: R,
    frames_read: u64,
}

impl<R: PlateReader> CaptureSession<R> {
    /// Start a session with `reader`.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            frames_read: 0,
        }
    }

    /// Suggest pre-fill text for `frame`, or `None` if nothing usable was read.
    pub fn suggest(&mut self, frame: &Frame) -> Option<String> {
        self.frames_read += 1;
        let guess = normalize(&self.reader.extract_plate_guess(frame));
        (!guess.is_empty()).then_some(guess)
    }

    /// Number of frames passed to the reader so far.
    #[must_use]
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}
