// Domain layer: core models, progress events and ports. No adapters here.

pub mod events;
pub mod model;
pub mod ports;
