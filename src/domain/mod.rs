// Domain layer: core models and ports. Adapters and the HTTP layer depend on
// this module, never the other way round.

pub mod model;
pub mod ports;
