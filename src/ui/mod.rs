pub mod beat;
pub mod theme;

pub use beat::{render_status, StatusInfo};
pub use theme::Theme;
