use gtk::prelude::*;
use libappindicator::{AppIndicator, AppIndicatorStatus};
use std::cell::RefCell;
use std::rc::Rc;

/// Callbacks for tray menu actions
pub struct TrayCallbacks {
    pub on_show_window: Box<dyn Fn()>,
    pub on_quit: Box<dyn Fn()>,
}

impl Default for TrayCallbacks {
    fn default() -> Self {
        Self {
            on_show_window: Box::new(|| {}),
            on_quit: Box::new(|| {}),
        }
    }
}

/// Manages the system tray icon and menu
pub struct TrayManager {
    indicator: AppIndicator,
    callbacks: Rc<RefCell<TrayCallbacks>>,
}

impl TrayManager {
    pub fn new() -> Self {
        let mut indicator = AppIndicator::new("aether-monitor", "utilities-system-monitor");
        indicator.set_status(AppIndicatorStatus::Active);
        indicator.set_title("Aether Monitor");

        let mut menu = gtk::Menu::new();
        let callbacks = Rc::new(RefCell::new(TrayCallbacks::default()));

        let show_item = gtk::MenuItem::with_label("Show Window");
        let callbacks_ref = callbacks.clone();
        show_item.connect_activate(move |_| {
            (callbacks_ref.borrow().on_show_window)();
        });
        menu.append(&show_item);

        menu.append(&gtk::SeparatorMenuItem::new());

        let quit_item = gtk::MenuItem::with_label("Quit");
        let callbacks_ref = callbacks.clone();
        quit_item.connect_activate(move |_| {
            (callbacks_ref.borrow().on_quit)();
        });
        menu.append(&quit_item);

        menu.show_all();
        indicator.set_menu(&mut menu);

        Self {
            indicator,
            callbacks,
        }
    }

    pub fn set_callbacks(&self, callbacks: TrayCallbacks) {
        *self.callbacks.borrow_mut() = callbacks;
    }

    /// Hide the tray icon
    pub fn hide(&mut self) {
        self.indicator.set_status(AppIndicatorStatus::Passive);
    }

    /// Show the tray icon
    pub fn show(&mut self) {
        self.indicator.set_status(AppIndicatorStatus::Active);
    }
}

impl Default for TrayManager {
    fn default() -> Self {
        Self::new()
    }
}
