use log::{LevelFilter, Log, Metadata, Record};
use workspace_core::{ConfigurationSummary, LoadReport};

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        eprintln!("[Workspace][{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

/// Routes engine logs to stderr. Warnings and errors only unless `verbose`.
pub fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    if log::set_logger(&ConsoleLogger).is_ok() {
        log::set_max_level(level);
    }
}

pub fn print_info(message: &str) {
    println!("[Workspace][INFO] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[Workspace][ERROR]: {message}");
}

pub fn print_report(report: &LoadReport) {
    print_info(&format!(
        "Loaded {} tab(s), {} panel(s), {} deferred",
        report.tabs, report.panels, report.deferred
    ));
    if report.aliased > 0 {
        print_info(&format!("Renamed {} legacy panel(s)", report.aliased));
    }
    for missing in &report.missing {
        print_error(&format!("Plugin {missing} not found"));
    }
    println!(
        "subscriptions: {} wired, {} held, {} dropped",
        report.subscriptions_wired, report.subscriptions_held, report.subscriptions_dropped
    );
}

pub fn print_summary(heading: &str, summary: &ConfigurationSummary) {
    print_info(&format!("{heading}:"));
    print!("{summary}");
}
