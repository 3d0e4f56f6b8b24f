// Domain layer: timetable and calendar models plus the ports the pipeline is built on.

pub mod model;
pub mod ports;
