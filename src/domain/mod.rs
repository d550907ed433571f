// Domain layer: handles, command input and the ports the workflow drives.

pub mod model;
pub mod ports;
