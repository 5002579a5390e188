pub mod serial;

pub use serial::{forward_lines, open_serial};
