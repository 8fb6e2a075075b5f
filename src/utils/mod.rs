pub mod logging;
pub mod wait;

pub use wait::wait_for;
