// Domain layer: records, the aggregate bundle and the ports adapters implement.

pub mod model;
pub mod ports;
