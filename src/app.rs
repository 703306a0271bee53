use glib::ControlFlow;
use gtk::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, warn};

use crate::config::AppConfig;
use crate::monitor::{MonitorEngine, Snapshot};
use crate::ui::{MainWindow, OverlayCallbacks, OverlayWidget, TrayCallbacks, TrayManager};

/// Producer cadence, bounded below by the tightest sampling interval.
const UPDATE_PERIOD: Duration = Duration::from_secs(3);
/// How often the producer asks the engine to check its own footprint.
const MEMORY_CHECK_PERIOD: Duration = Duration::from_secs(30);
/// Sleep slice, so a shutdown request is noticed promptly.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Main application state
pub struct App {
    engine: Arc<MonitorEngine>,
    window: MainWindow,
    overlay: Option<OverlayWidget>,
    tray: Option<TrayManager>,
    running: Arc<AtomicBool>,
    window_visible: Arc<AtomicBool>,
    widget_visible: bool,
    producer: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            engine: Arc::new(MonitorEngine::new(config.poll_intervals)),
            window: MainWindow::new(&config.window),
            overlay: None,
            tray: None,
            running: Arc::new(AtomicBool::new(false)),
            window_visible: Arc::new(AtomicBool::new(false)),
            widget_visible: false,
            producer: None,
        }
    }

    /// Wire up the surfaces and start the producer thread. The main window
    /// stays hidden until requested from the tray or overlay.
    pub fn start(app: Rc<RefCell<Self>>) {
        app.borrow().running.store(true, Ordering::Relaxed);

        Self::setup_tray(app.clone());
        Self::setup_window(app.clone());
        Self::start_producer(app.clone());
        Self::create_overlay(app);
    }

    fn setup_tray(app: Rc<RefCell<Self>>) {
        let tray = TrayManager::new();

        let app_weak = Rc::downgrade(&app);
        let callbacks = TrayCallbacks {
            on_show_window: Box::new(move || {
                if let Some(app) = app_weak.upgrade() {
                    Self::show_main_window(&app);
                }
            }),
            on_quit: Box::new(|| {
                gtk::main_quit();
            }),
        };

        tray.set_callbacks(callbacks);
        app.borrow_mut().tray = Some(tray);
    }

    fn setup_window(app: Rc<RefCell<Self>>) {
        let app_ref = app.borrow();

        // Closing the window minimizes to the tray; only the tray menu or
        // Ctrl-C quit the application.
        app_ref.window.window().connect_delete_event(|window, _| {
            window.hide();
            glib::Propagation::Stop
        });

        let visible = app_ref.window_visible.clone();
        app_ref.window.window().connect_map_event(move |_, _| {
            visible.store(true, Ordering::Relaxed);
            glib::Propagation::Proceed
        });
        let visible = app_ref.window_visible.clone();
        app_ref.window.window().connect_unmap_event(move |_, _| {
            visible.store(false, Ordering::Relaxed);
            glib::Propagation::Proceed
        });

        let app_weak = Rc::downgrade(&app);
        app_ref.window.connect_widget_toggle(move || {
            if let Some(app) = app_weak.upgrade() {
                Self::toggle_widget(&app);
            }
        });
    }

    /// Spawn the background thread that polls the engine and posts each
    /// snapshot to the GTK main loop. Rendering failures stay on the UI
    /// side; the loop itself only samples and sends.
    fn start_producer(app: Rc<RefCell<Self>>) {
        let (sender, receiver) = glib::MainContext::channel::<Snapshot>(glib::Priority::DEFAULT);

        let app_weak = Rc::downgrade(&app);
        receiver.attach(None, move |snapshot| {
            let app = match app_weak.upgrade() {
                Some(app) => app,
                None => return ControlFlow::Break,
            };
            let app_ref = app.borrow();
            if app_ref.window_visible.load(Ordering::Relaxed) {
                app_ref.window.update(&snapshot);
            }
            ControlFlow::Continue
        });

        let engine = app.borrow().engine.clone();
        let running = app.borrow().running.clone();
        let window_visible = app.borrow().window_visible.clone();

        let producer = thread::Builder::new()
            .name("metrics-producer".into())
            .spawn(move || {
                let mut last_memory_check = Instant::now();
                while running.load(Ordering::Relaxed) {
                    // Recommendations are only worth computing when someone
                    // can see them.
                    let include = window_visible.load(Ordering::Relaxed);
                    let snapshot = engine.snapshot(include);
                    if sender.send(snapshot).is_err() {
                        // Main loop is gone.
                        break;
                    }

                    if last_memory_check.elapsed() >= MEMORY_CHECK_PERIOD {
                        engine.check_memory_pressure();
                        last_memory_check = Instant::now();
                    }

                    let mut slept = Duration::ZERO;
                    while slept < UPDATE_PERIOD && running.load(Ordering::Relaxed) {
                        thread::sleep(SHUTDOWN_POLL);
                        slept += SHUTDOWN_POLL;
                    }
                }
            });

        match producer {
            Ok(handle) => app.borrow_mut().producer = Some(handle),
            Err(e) => error!("failed to start producer thread: {}", e),
        }
    }

    fn create_overlay(app: Rc<RefCell<Self>>) {
        let overlay = OverlayWidget::new();

        let app_weak = Rc::downgrade(&app);
        let on_open = Box::new(move || {
            if let Some(app) = app_weak.upgrade() {
                Self::show_main_window(&app);
            }
        });
        let app_weak = Rc::downgrade(&app);
        let on_disable = Box::new(move || {
            if let Some(app) = app_weak.upgrade() {
                Self::disable_widget(&app);
            }
        });
        overlay.set_callbacks(OverlayCallbacks { on_open, on_disable });

        overlay.start_updates(app.borrow().engine.clone());
        overlay.show();

        let mut app_ref = app.borrow_mut();
        app_ref.overlay = Some(overlay);
        app_ref.widget_visible = true;
        app_ref.window.set_widget_button_state(true);
    }

    fn show_main_window(app: &Rc<RefCell<Self>>) {
        app.borrow().window.present();
    }

    fn disable_widget(app: &Rc<RefCell<Self>>) {
        let app_ref = &mut *app.borrow_mut();
        if let Some(overlay) = &app_ref.overlay {
            overlay.hide();
        }
        app_ref.widget_visible = false;
        app_ref.window.set_widget_button_state(false);
    }

    /// Toggle overlay visibility from the main window button.
    fn toggle_widget(app: &Rc<RefCell<Self>>) {
        let app_ref = &mut *app.borrow_mut();
        match &app_ref.overlay {
            Some(overlay) if app_ref.widget_visible => {
                overlay.hide();
                app_ref.widget_visible = false;
            }
            Some(overlay) => {
                overlay.show();
                app_ref.widget_visible = true;
            }
            None => {}
        }
        app_ref.window.set_widget_button_state(app_ref.widget_visible);
    }

    /// Clean shutdown: stop the producer and let any in-flight OS query
    /// finish before joining.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);

        if let Some(producer) = self.producer.take() {
            if producer.join().is_err() {
                warn!("producer thread panicked during shutdown");
            }
        }

        if let Some(overlay) = self.overlay.take() {
            overlay.destroy();
        }
        if let Some(mut tray) = self.tray.take() {
            tray.hide();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}
