//! Ports - boundary interfaces of the application layer

pub mod outbound;
