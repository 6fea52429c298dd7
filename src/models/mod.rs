pub mod appointment;
pub mod patient;

pub use appointment::*;
pub use patient::*;
