pub mod emitter;
pub mod engine;
pub mod layout;
pub mod order;
pub mod scanner;

pub use emitter::{EmitStats, SlideEmitter};
pub use engine::{build_deck, DeckEngine};
pub use layout::{group_images, LayoutPlanner};
pub use order::OrderResolver;
pub use scanner::{AssetMatcher, DirectoryScanner};
