//! File collaborators used by test bodies: INI settings and CSV data

pub mod ini;
pub mod table;

pub use ini::IniConfig;
pub use table::DataTable;
