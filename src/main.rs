mod app;
mod autostart;
mod config;
mod monitor;
mod ui;

use std::cell::RefCell;
use std::env;
use std::rc::Rc;

use app::App;
use config::AppConfig;

fn print_usage() {
    eprintln!("Usage: aether-monitor [OPTION]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --setup-autostart     Register the monitor to start on login");
    eprintln!("  --remove-autostart    Remove the autostart registration");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Without options the monitor starts minimized to the tray, with");
    eprintln!("the overlay widget visible.");
}

fn main() {
    env_logger::init();

    // Handle command-line options before touching GTK.
    let args: Vec<String> = env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "--setup-autostart" => match autostart::enable() {
                Ok(path) => {
                    println!("Autostart entry created: {}", path.display());
                    std::process::exit(0);
                }
                Err(e) => {
                    eprintln!("Failed to set up autostart: {}", e);
                    std::process::exit(1);
                }
            },
            "--remove-autostart" => match autostart::disable() {
                Ok(true) => {
                    println!("Autostart entry removed");
                    std::process::exit(0);
                }
                Ok(false) => {
                    println!("No autostart entry found");
                    std::process::exit(0);
                }
                Err(e) => {
                    eprintln!("Failed to remove autostart: {}", e);
                    std::process::exit(1);
                }
            },
            other => {
                eprintln!("Unknown option: {}", other);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    // Initialize GTK
    if let Err(e) = gtk::init() {
        eprintln!("Failed to initialize GTK: {}", e);
        std::process::exit(1);
    }

    // Set application name for accessibility
    glib::set_application_name("Aether Monitor");
    glib::set_prgname(Some("aether-monitor"));

    let config = AppConfig::load();

    // Create application
    let app = Rc::new(RefCell::new(App::new(&config)));
    App::start(app.clone());

    // Quit cleanly on Ctrl-C as well as from the tray menu.
    if let Err(e) = ctrlc::set_handler(|| {
        glib::idle_add(|| {
            gtk::main_quit();
            glib::ControlFlow::Break
        });
    }) {
        eprintln!("Warning: could not install Ctrl-C handler: {}", e);
    }

    // Run GTK main loop
    gtk::main();

    // Cleanup
    app.borrow_mut().shutdown();
}
