pub mod app;
pub mod draw;
pub mod file_panel;
pub mod output_log;
pub mod panel;
pub mod theme;
