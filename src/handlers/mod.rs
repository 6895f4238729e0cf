pub mod menu_scanner;
pub mod renderer;

pub use menu_scanner::{capture_from_upload, MenuScanner, ScanError};
pub use renderer::{Export, ExportFormat, ResultRenderer};
