//! PresentationML output built on a template package.

mod document;
mod package;
pub mod parts;
mod slide;

pub use document::PptxDocument;
pub use package::TemplatePackage;
