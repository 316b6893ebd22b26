//! Terminal surface: prompts, menus and the printed report.

pub mod display;
pub mod input;
pub mod stdin;

pub use display::{describe_scene, render_menu, render_summary};
pub use input::Console;
pub use stdin::LineChannel;
