pub mod logging;

pub use logging::{init, init_log_file, log_startup, truncate_text};
