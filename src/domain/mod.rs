// Domain layer: market entities and the ports the rule engine depends on.

pub mod model;
pub mod ports;
