use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use glib::ControlFlow;
use gtk::prelude::*;
use gtk::{Box as GtkBox, Label, Menu, MenuItem, Orientation, SeparatorMenuItem, Window, WindowType};

use crate::monitor::{LightweightSnapshot, MonitorEngine};

/// The overlay refreshes on its own timer, slower than the main window.
const UPDATE_PERIOD: Duration = Duration::from_secs(5);

const NEUTRAL_COLOR: &str = "#ffffff";
const DIM_COLOR: &str = "#888888";
const COOL_COLOR: &str = "#00ff88";
const HOT_COLOR: &str = "#ff6b6b";
const WARN_COLOR: &str = "#ffaa00";
const ALERT_COLOR: &str = "#ff4444";

/// Callbacks for overlay interactions
pub struct OverlayCallbacks {
    pub on_open: Box<dyn Fn()>,
    pub on_disable: Box<dyn Fn()>,
}

impl Default for OverlayCallbacks {
    fn default() -> Self {
        Self {
            on_open: Box::new(|| {}),
            on_disable: Box::new(|| {}),
        }
    }
}

/// Minimal always-on-top overlay: one line of metrics, draggable with the
/// left button, context menu on the right button.
pub struct OverlayWidget {
    window: Window,
    cpu_value: Label,
    ram_value: Label,
    disk_value: Label,
    temp_value: Label,
    callbacks: Rc<RefCell<OverlayCallbacks>>,
    update_source_id: RefCell<Option<glib::SourceId>>,
}

impl OverlayWidget {
    pub fn new() -> Self {
        let window = Window::new(WindowType::Toplevel);
        window.set_title("Aether Overlay");
        window.set_decorated(false);
        window.set_keep_above(true);
        window.set_skip_taskbar_hint(true);
        window.set_skip_pager_hint(true);
        window.set_resizable(false);
        window.set_default_size(280, 36);
        window.move_(100, 100);

        if let Some(accessible) = window.accessible() {
            accessible.set_name("Aether Monitor overlay");
            accessible.set_description("Compact always-on-top view of current system metrics");
        }

        let content = GtkBox::new(Orientation::Horizontal, 6);
        content.set_margin_top(6);
        content.set_margin_bottom(6);
        content.set_margin_start(8);
        content.set_margin_end(8);

        let (cpu_value, cpu_cell) = Self::metric_cell("CPU");
        let (ram_value, ram_cell) = Self::metric_cell("RAM");
        let (disk_value, disk_cell) = Self::metric_cell("DISK");
        let (temp_value, temp_cell) = Self::metric_cell("TEMP");
        content.pack_start(&cpu_cell, false, false, 0);
        content.pack_start(&ram_cell, false, false, 0);
        content.pack_start(&disk_cell, false, false, 0);
        content.pack_start(&temp_cell, false, false, 0);

        window.add(&content);

        let callbacks = Rc::new(RefCell::new(OverlayCallbacks::default()));

        // Right-click context menu.
        let menu = Menu::new();
        let open_item = MenuItem::with_label("Open Aether Monitor");
        let callbacks_ref = callbacks.clone();
        open_item.connect_activate(move |_| {
            (callbacks_ref.borrow().on_open)();
        });
        menu.append(&open_item);

        menu.append(&SeparatorMenuItem::new());

        let disable_item = MenuItem::with_label("Disable Widget");
        let callbacks_ref = callbacks.clone();
        disable_item.connect_activate(move |_| {
            (callbacks_ref.borrow().on_disable)();
        });
        menu.append(&disable_item);
        menu.show_all();

        window.add_events(gdk::EventMask::BUTTON_PRESS_MASK);
        window.connect_button_press_event(move |window, event| match event.button() {
            1 => {
                let (root_x, root_y) = event.root();
                window.begin_move_drag(1, root_x as i32, root_y as i32, event.time());
                glib::Propagation::Stop
            }
            3 => {
                menu.popup_easy(event.button(), event.time());
                glib::Propagation::Stop
            }
            _ => glib::Propagation::Proceed,
        });

        Self {
            window,
            cpu_value,
            ram_value,
            disk_value,
            temp_value,
            callbacks,
            update_source_id: RefCell::new(None),
        }
    }

    fn metric_cell(name: &str) -> (Label, GtkBox) {
        let cell = GtkBox::new(Orientation::Horizontal, 2);

        let name_label = Label::new(None);
        name_label.set_markup(&format!(
            "<span size=\"small\" foreground=\"{}\">{}:</span>",
            DIM_COLOR, name
        ));
        cell.pack_start(&name_label, false, false, 0);

        let value_label = Label::new(Some("--"));
        value_label.set_width_chars(4);
        if let Some(accessible) = value_label.accessible() {
            accessible.set_name(&format!("{} value", name));
        }
        cell.pack_start(&value_label, false, false, 0);

        (value_label, cell)
    }

    /// Start the 5 s refresh timer, reading the engine's cached metrics.
    pub fn start_updates(&self, engine: Arc<MonitorEngine>) {
        self.stop_updates();

        let window = self.window.clone();
        let cpu_value = self.cpu_value.clone();
        let ram_value = self.ram_value.clone();
        let disk_value = self.disk_value.clone();
        let temp_value = self.temp_value.clone();

        let source_id = glib::timeout_add_local(UPDATE_PERIOD, move || {
            if window.is_visible() {
                let snapshot = engine.lightweight_snapshot();
                render(&cpu_value, &ram_value, &disk_value, &temp_value, &snapshot);
            }
            ControlFlow::Continue
        });
        self.update_source_id.replace(Some(source_id));
    }

    pub fn stop_updates(&self) {
        if let Some(source_id) = self.update_source_id.take() {
            source_id.remove();
        }
    }

    pub fn set_callbacks(&self, callbacks: OverlayCallbacks) {
        *self.callbacks.borrow_mut() = callbacks;
    }

    pub fn show(&self) {
        self.window.show_all();
    }

    pub fn hide(&self) {
        self.window.hide();
    }

    pub fn destroy(&self) {
        self.stop_updates();
        self.window.close();
    }
}

impl Default for OverlayWidget {
    fn default() -> Self {
        Self::new()
    }
}

fn render(
    cpu_value: &Label,
    ram_value: &Label,
    disk_value: &Label,
    temp_value: &Label,
    snapshot: &LightweightSnapshot,
) {
    let cpu_color = if snapshot.cpu_percent > 80.0 {
        HOT_COLOR
    } else {
        NEUTRAL_COLOR
    };
    cpu_value.set_markup(&format!(
        "<span weight=\"bold\" foreground=\"{}\">{:.0}%</span>",
        cpu_color, snapshot.cpu_percent
    ));

    let ram_color = if snapshot.ram_percent > 80.0 {
        WARN_COLOR
    } else {
        NEUTRAL_COLOR
    };
    ram_value.set_markup(&format!(
        "<span weight=\"bold\" foreground=\"{}\">{:.0}%</span>",
        ram_color, snapshot.ram_percent
    ));

    let disk_color = if snapshot.disk_percent > 85.0 {
        ALERT_COLOR
    } else {
        NEUTRAL_COLOR
    };
    disk_value.set_markup(&format!(
        "<span weight=\"bold\" foreground=\"{}\">{:.0}%</span>",
        disk_color, snapshot.disk_percent
    ));

    match snapshot.temp_celsius {
        Some(temp) => {
            let temp_color = if temp > 70.0 { HOT_COLOR } else { COOL_COLOR };
            temp_value.set_markup(&format!(
                "<span weight=\"bold\" foreground=\"{}\">{:.0}°</span>",
                temp_color, temp
            ));
        }
        None => {
            temp_value.set_markup(&format!(
                "<span weight=\"bold\" foreground=\"{}\">--°</span>",
                DIM_COLOR
            ));
        }
    }
}
