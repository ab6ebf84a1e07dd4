// REST surface of the machine registry.

pub mod client;
pub mod machines;

pub use client::MachinesClient;
