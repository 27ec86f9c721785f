pub mod error_handling;

pub mod reader;
pub use reader::{read_conn_log, ConnectionRecord, LogSource, MalformedPolicy};

pub mod enrich;
pub use enrich::{enrich, ColorMode, RandomColors};

pub mod web_interface;
pub use web_interface::{AppState, WebServer};
