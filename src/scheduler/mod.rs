pub mod time_interface;

pub use time_interface::{SimTime, StdTime, TimeInterface};
