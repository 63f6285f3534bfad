//! Per-frame texture sources.
//!
//! A texture is either fed once from a still image or repeatedly from a
//! stream (video decoder, camera, procedural generator). Callers hold a
//! [`TextureSource`] next to the device texture and call `refresh` each
//! frame; static sources never produce new frames.

use std::collections::VecDeque;

use super::cpu::Image;

/// A producer of successive frames.
pub trait FrameSource: Send {
    /// The next frame, if one became available since the last call.
    fn next_frame(&mut self) -> Option<Image>;
}

/// Where a texture's pixels come from.
pub enum TextureSource {
    /// A still image uploaded once.
    Static(Image),
    /// A stream polled every frame.
    Streaming(Box<dyn FrameSource>),
}

impl TextureSource {
    /// Wrap a frame source.
    pub fn streaming(source: impl FrameSource + 'static) -> Self {
        Self::Streaming(Box::new(source))
    }

    /// Poll for a new frame. Always `None` for static sources.
    pub fn refresh(&mut self) -> Option<Image> {
        match self {
            Self::Static(_) => None,
            Self::Streaming(source) => source.next_frame(),
        }
    }

    /// Check if this source can produce new frames.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming(_))
    }
}

impl std::fmt::Debug for TextureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(image) => f.debug_tuple("Static").field(image).finish(),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// A frame source backed by a queue of pre-decoded frames.
#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<Image>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame to the back of the queue.
    pub fn push(&mut self, frame: Image) {
        self.frames.push_back(frame);
    }

    /// Number of frames not yet consumed.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FromIterator<Image> for FrameQueue {
    fn from_iter<I: IntoIterator<Item = Image>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl FrameSource for FrameQueue {
    fn next_frame(&mut self) -> Option<Image> {
        self.frames.pop_front()
    }
}
