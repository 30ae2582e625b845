use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Local;

lazy_static::lazy_static! {
    static ref LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);
}

static ECHO_TO_STDERR: AtomicBool = AtomicBool::new(false);

pub fn init_logging(verbose: bool) -> std::io::Result<PathBuf> {
    ECHO_TO_STDERR.store(verbose, Ordering::Relaxed);

    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("revops-cli")
        .join("logs");

    create_dir_all(&log_dir)?;

    let log_file = log_dir.join(format!("revops-{}.log", Local::now().format("%Y%m%d-%H%M%S")));

    if let Ok(mut slot) = LOG_FILE.lock() {
        *slot = Some(log_file.clone());
    }

    log_info(&format!("Logging initialized to: {}", log_file.display()));

    Ok(log_file)
}

pub fn log_error(message: &str) {
    log_with_level("ERROR", message);
}

pub fn log_warn(message: &str) {
    log_with_level("WARN", message);
}

pub fn log_info(message: &str) {
    log_with_level("INFO", message);
}

pub fn log_debug(message: &str) {
    log_with_level("DEBUG", message);
}

pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log_panic_info(info);
        default_hook(info);
    }));
}

fn log_panic_info(info: &std::panic::PanicInfo) {
    let mut message = String::from("PANIC: ");

    if let Some(location) = info.location() {
        message.push_str(&format!(
            "at {}:{}:{} - ",
            location.file(),
            location.line(),
            location.column()
        ));
    }

    if let Some(s) = info.payload().downcast_ref::<&str>() {
        message.push_str(s);
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        message.push_str(s);
    } else {
        message.push_str("Unknown panic payload");
    }

    log_error(&message);

    let backtrace = std::backtrace::Backtrace::capture();
    log_debug(&format!("Backtrace:\n{}", backtrace));
}

fn log_with_level(level: &str, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

    // Logging before init_logging is a no-op apart from the stderr echo.
    if let Ok(guard) = LOG_FILE.lock() {
        if let Some(log_file) = guard.as_ref() {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_file) {
                let _ = writeln!(file, "[{}] {} - {}", timestamp, level, message);
            }
        }
    }

    if ECHO_TO_STDERR.load(Ordering::Relaxed) {
        eprintln!("[{}] {} - {}", timestamp, level, message);
    }
}
