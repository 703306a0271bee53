use gdk::keys::constants as key;
use gtk::prelude::*;
use gtk::{
    Align, Box as GtkBox, Button, Frame, Label, Orientation, ProgressBar, Window, WindowPosition,
    WindowType,
};

use crate::config::WindowConfig;
use crate::monitor::Snapshot;

const HEALTHY_COLOR: &str = "#00ff88";
const DEGRADED_COLOR: &str = "#ffaa00";
const CRITICAL_COLOR: &str = "#ff4444";

/// Main window: one bar per metric, a health line, a temperature line and
/// the recommendation area. Renders whatever snapshot it is handed; it
/// never reads the OS itself.
pub struct MainWindow {
    window: Window,
    cpu_bar: ProgressBar,
    cpu_value: Label,
    ram_bar: ProgressBar,
    ram_value: Label,
    disk_bar: ProgressBar,
    disk_value: Label,
    health_label: Label,
    temp_label: Label,
    recommendations_label: Label,
    widget_button: Button,
}

impl MainWindow {
    pub fn new(config: &WindowConfig) -> Self {
        let window = Window::new(WindowType::Toplevel);
        window.set_title("Aether Monitor");
        window.set_default_size(config.width, config.height);
        window.set_resizable(config.resizable);
        window.set_position(WindowPosition::Center);

        if let Some(accessible) = window.accessible() {
            accessible.set_name("Aether Monitor");
            accessible.set_description("System resource monitor with health score");
        }

        let main_box = GtkBox::new(Orientation::Vertical, 10);
        main_box.set_margin_top(10);
        main_box.set_margin_bottom(10);
        main_box.set_margin_start(10);
        main_box.set_margin_end(10);

        let header = Label::new(Some("AETHER MONITOR"));
        header.set_halign(Align::Start);
        header.style_context().add_class("title-2");
        if let Some(accessible) = header.accessible() {
            accessible.set_name("Aether Monitor");
            accessible.set_role(atk::Role::Heading);
        }
        main_box.pack_start(&header, false, false, 0);

        let (cpu_row, cpu_bar, cpu_value) = Self::metric_row("CPU");
        let (ram_row, ram_bar, ram_value) = Self::metric_row("RAM");
        let (disk_row, disk_bar, disk_value) = Self::metric_row("DISK");
        main_box.pack_start(&cpu_row, false, false, 0);
        main_box.pack_start(&ram_row, false, false, 0);
        main_box.pack_start(&disk_row, false, false, 0);

        let health_label = Label::new(Some("HEALTH: --%"));
        health_label.set_halign(Align::Start);
        if let Some(accessible) = health_label.accessible() {
            accessible.set_name("System health");
        }
        main_box.pack_start(&health_label, false, false, 0);

        let temp_label = Label::new(Some("TEMP: --"));
        temp_label.set_halign(Align::Start);
        if let Some(accessible) = temp_label.accessible() {
            accessible.set_name("Temperature");
        }
        main_box.pack_start(&temp_label, false, false, 0);

        let recommendations_frame = Frame::new(Some("Recommendations"));
        let recommendations_label = Label::new(Some("Collecting data..."));
        recommendations_label.set_line_wrap(true);
        recommendations_label.set_halign(Align::Start);
        recommendations_label.set_valign(Align::Start);
        recommendations_label.set_margin_top(8);
        recommendations_label.set_margin_bottom(8);
        recommendations_label.set_margin_start(8);
        recommendations_label.set_margin_end(8);
        if let Some(accessible) = recommendations_label.accessible() {
            accessible.set_name("Recommendations");
            accessible.set_role(atk::Role::Text);
        }
        recommendations_frame.add(&recommendations_label);
        main_box.pack_start(&recommendations_frame, true, true, 0);

        let widget_button = Button::with_label("DISABLE WIDGET");
        if let Some(accessible) = widget_button.accessible() {
            accessible.set_name("Toggle overlay widget");
            accessible.set_description("Show or hide the floating overlay widget");
        }
        main_box.pack_start(&widget_button, false, false, 0);

        window.add(&main_box);

        // Escape hides to tray, same as closing.
        let window_weak = window.downgrade();
        window.connect_key_press_event(move |_, event| {
            if event.keyval() == key::Escape {
                if let Some(window) = window_weak.upgrade() {
                    window.hide();
                }
                return glib::Propagation::Stop;
            }
            glib::Propagation::Proceed
        });

        Self {
            window,
            cpu_bar,
            cpu_value,
            ram_bar,
            ram_value,
            disk_bar,
            disk_value,
            health_label,
            temp_label,
            recommendations_label,
            widget_button,
        }
    }

    fn metric_row(name: &str) -> (GtkBox, ProgressBar, Label) {
        let row = GtkBox::new(Orientation::Horizontal, 8);

        let name_label = Label::new(Some(&format!("{}:", name)));
        name_label.set_halign(Align::Start);
        name_label.set_width_chars(6);
        row.pack_start(&name_label, false, false, 0);

        let bar = ProgressBar::new();
        bar.set_valign(Align::Center);
        bar.set_hexpand(true);
        if let Some(accessible) = bar.accessible() {
            accessible.set_name(&format!("{} usage", name));
        }
        row.pack_start(&bar, true, true, 0);

        let value_label = Label::new(Some("--%"));
        value_label.set_width_chars(5);
        value_label.set_halign(Align::End);
        row.pack_start(&value_label, false, false, 0);

        (row, bar, value_label)
    }

    /// Render a snapshot into the widgets.
    pub fn update(&self, snapshot: &Snapshot) {
        self.cpu_bar.set_fraction(snapshot.cpu_percent / 100.0);
        self.cpu_value
            .set_text(&format!("{:.0}%", snapshot.cpu_percent));

        self.ram_bar.set_fraction(snapshot.ram.percent / 100.0);
        self.ram_value.set_text(&format!(
            "{:.0}%",
            snapshot.ram.percent
        ));
        self.ram_bar.set_tooltip_text(Some(&format!(
            "{:.1} / {:.1} GB",
            snapshot.ram.used_gb, snapshot.ram.total_gb
        )));

        self.disk_bar.set_fraction(snapshot.disk.percent / 100.0);
        self.disk_value
            .set_text(&format!("{:.0}%", snapshot.disk.percent));
        self.disk_bar.set_tooltip_text(Some(&format!(
            "{:.1} / {:.1} GB",
            snapshot.disk.used_gb, snapshot.disk.total_gb
        )));

        let health_color = if snapshot.health >= 70.0 {
            HEALTHY_COLOR
        } else if snapshot.health >= 40.0 {
            DEGRADED_COLOR
        } else {
            CRITICAL_COLOR
        };
        self.health_label.set_markup(&format!(
            "<span foreground=\"{}\">HEALTH: {:.0}%</span>",
            health_color, snapshot.health
        ));

        match snapshot.temp_celsius {
            Some(temp) => {
                let temp_color = if temp > 70.0 { CRITICAL_COLOR } else { HEALTHY_COLOR };
                self.temp_label.set_markup(&format!(
                    "<span foreground=\"{}\">TEMP: {:.0}°C</span>",
                    temp_color, temp
                ));
            }
            None => self.temp_label.set_text("TEMP: n/a"),
        }

        if let Some(recommendations) = &snapshot.recommendations {
            let text = recommendations
                .iter()
                .map(|tip| format!("{}: {}", tip.text, tip.action))
                .collect::<Vec<_>>()
                .join("\n");
            self.recommendations_label.set_text(&text);
        }
    }

    pub fn connect_widget_toggle<F: Fn() + 'static>(&self, callback: F) {
        self.widget_button.connect_clicked(move |_| {
            callback();
        });
    }

    /// Reflect overlay visibility in the toggle button label.
    pub fn set_widget_button_state(&self, widget_visible: bool) {
        let label = if widget_visible {
            "DISABLE WIDGET"
        } else {
            "ENABLE WIDGET"
        };
        self.widget_button.set_label(label);
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Bring the window to the foreground, restoring it if hidden.
    pub fn present(&self) {
        self.window.show_all();
        self.window.present();
    }

    pub fn hide(&self) {
        self.window.hide();
    }
}
