pub mod image_probe;
pub mod pptx;
pub mod progress;

pub use image_probe::FileImageProbe;
pub use pptx::PptxDocument;
pub use progress::{CollectingSink, ConsoleProgress};
