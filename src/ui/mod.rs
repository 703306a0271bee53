mod overlay;
mod tray;
mod window;

pub use overlay::{OverlayCallbacks, OverlayWidget};
pub use tray::{TrayCallbacks, TrayManager};
pub use window::MainWindow;
