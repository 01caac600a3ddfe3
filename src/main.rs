mod buffer;
mod capture;
mod cli;
mod config;
mod core;
mod domain;
mod localize;
mod notify;
mod ocr;
mod screenshot;
mod wayland;
mod widget;

use clap::Parser;

fn main() -> cosmic::iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    localize::localize();

    let cli = cli::Cli::parse();
    if cli.list_backends {
        for backend in ocr::backends() {
            let availability = if backend.is_available() {
                "available"
            } else {
                "not available"
            };
            println!("{:<12} {availability}", backend.name());
        }
        return Ok(());
    }

    let config = config::SnaptextConfig::load();
    let preferred = cli.backend.clone().or_else(|| config.default_backend.clone());
    let languages = {
        let from_cli = cli.languages();
        if from_cli.is_empty() {
            config.default_languages.clone()
        } else {
            from_cli
        }
    };

    let Some(backend) = ocr::select(preferred.as_deref()) else {
        match preferred {
            Some(name) => eprintln!("Error: OCR backend \"{name}\" is not available"),
            None => eprintln!(
                "Error: no OCR backend is available (install tesseract, or PP-OCR models)"
            ),
        }
        std::process::exit(1);
    };
    log::info!("Using OCR backend {}", backend.name());

    core::app::run(core::app::Flags {
        backend,
        languages,
        save_debug_screenshot: cli.debug_screenshot || config.save_debug_screenshot,
    })
}
