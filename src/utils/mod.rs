pub mod clock;
pub mod dir;
pub mod logging;
pub mod runtime;
pub mod sparse_table;
pub mod time;
