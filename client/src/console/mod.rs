pub mod model;
pub mod relay_sink;
pub mod surface;
