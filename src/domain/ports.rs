use crate::domain::events::ProgressEvent;
use crate::domain::model::{ImageSize, ImageSource, Rect, SlideSize, TextStyle};
use crate::utils::error::Result;
use std::path::Path;

/// Minimal presentation capability the emitter writes through.
///
/// Documents are append-only: text boxes and pictures land on the most
/// recently added slide.
pub trait DocumentBuilder {
    fn slide_size(&self) -> SlideSize;

    fn slide_count(&self) -> usize;

    /// Appends a slide and returns its 0-based index.
    fn add_slide(&mut self) -> Result<usize>;

    fn add_text_box(&mut self, rect: Rect, text: &str, style: &TextStyle) -> Result<()>;

    fn add_picture(&mut self, rect: Rect, image: &ImageSource) -> Result<()>;

    fn save(&mut self, path: &Path) -> Result<()>;
}

/// Reads pixel dimensions without decoding the whole image.
pub trait ImageProbe {
    fn dimensions(&self, path: &Path) -> Result<ImageSize>;
}

/// Receives progress from a run.
pub trait ProgressSink {
    fn report(&mut self, event: ProgressEvent);
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn report(&mut self, event: ProgressEvent) {
        (**self).report(event)
    }
}
