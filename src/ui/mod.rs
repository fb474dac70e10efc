pub mod browser;
pub mod directory;
pub mod popup;
pub mod tabs;
pub mod terminal;

// Re-export commonly used items for convenience
pub use browser::draw_file_browser;
pub use directory::{ConnectionForm, draw_connection_form_popup, draw_connection_list};
pub use popup::{draw_delete_confirmation_popup, draw_error_popup, draw_info_popup};
pub use tabs::draw_tab_bar;
pub use terminal::{TerminalState, draw_terminal};
