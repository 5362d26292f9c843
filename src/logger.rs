// logger.rs - Structured logging module with modern display

use log::{debug, error, info, warn, LevelFilter};
use serde::Serialize;
use std::sync::Once;

use crate::formats::format_bytes;

static INIT: Once = Once::new();

/// ANSI color codes for modern terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RED: &str = "\x1b[31m";
    pub const CYAN: &str = "\x1b[36m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const WHITE: &str = "\x1b[37m";
    pub const BG_BLUE: &str = "\x1b[44m";
    pub const BG_GREEN: &str = "\x1b[42m";
    pub const BG_YELLOW: &str = "\x1b[43m";
    pub const BG_RED: &str = "\x1b[41m";
    pub const BG_MAGENTA: &str = "\x1b[45m";
}

#[derive(Debug, Clone)]
pub struct Logger {
    _enabled: bool,
    _max_level: LevelFilter,
}

impl Logger {
    pub fn init(level: &str, _enabled: bool) {
        INIT.call_once(|| {
            let level_filter = match level.to_uppercase().as_str() {
                "DEBUG" => LevelFilter::Debug,
                "TRACE" => LevelFilter::Trace,
                "WARN" => LevelFilter::Warn,
                "ERROR" => LevelFilter::Error,
                _ => LevelFilter::Info,
            };

            env_logger::Builder::new()
                .filter_level(level_filter)
                .format_timestamp(None)
                .format_module_path(false)
                .format_target(false)
                .init();
        });
    }

    pub fn new(level: &str, enabled: bool) -> Self {
        let max_level = match level.to_uppercase().as_str() {
            "DEBUG" => LevelFilter::Debug,
            "TRACE" => LevelFilter::Trace,
            "WARN" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            _ => LevelFilter::Info,
        };

        Logger { _enabled: enabled, _max_level: max_level }
    }

    fn truncate_name(&self, name: &str, max_length: usize) -> String {
        if name.len() > max_length {
            format!("{}...", &name[..max_length.saturating_sub(3)])
        } else {
            name.to_string()
        }
    }

    /// Log the outcome of one pipeline run
    pub fn log_compression(
        &self,
        name: &str,
        original_size: u64,
        compressed_size: u64,
        quality: u8,
        format: &str,
    ) {
        use colors::*;

        let percent = if original_size > 0 {
            (1.0 - compressed_size as f64 / original_size as f64) * 100.0
        } else {
            0.0
        };

        let format_badge = match format {
            "jpeg" => String::new() + BG_YELLOW + WHITE + BOLD + " JPEG " + RESET,
            "png" => String::new() + BG_GREEN + WHITE + BOLD + " PNG " + RESET,
            "webp" => String::new() + BG_BLUE + WHITE + BOLD + " WEBP " + RESET,
            _ => String::new() + BG_BLUE + WHITE + BOLD + " " + &format.to_uppercase() + " " + RESET,
        };

        let percent_color = if percent >= 0.0 { CYAN } else { RED };

        let msg = format_badge
            + " " + DIM + "compress" + RESET
            + " " + WHITE + &self.truncate_name(name, 40) + RESET
            + " " + WHITE + &format_bytes(original_size) + RESET
            + " " + DIM + "→" + RESET
            + " " + GREEN + &format_bytes(compressed_size) + RESET
            + " " + percent_color + &format!("({:+.1}%)", -percent) + RESET
            + " " + DIM + &format!("Q:{}", quality) + RESET;
        info!("{}", msg);
    }

    /// Log one history store operation
    pub fn log_history(&self, op: &str, detail: &str) {
        use colors::*;

        let badge = match op {
            "save" => String::new() + BG_GREEN + WHITE + BOLD + " SAVE " + RESET,
            "list" => String::new() + BG_BLUE + WHITE + BOLD + " LIST " + RESET,
            "delete" => String::new() + BG_YELLOW + WHITE + BOLD + " DEL " + RESET,
            _ => String::new() + BG_BLUE + WHITE + BOLD + " " + &op.to_uppercase() + " " + RESET,
        };

        let msg = badge
            + " " + DIM + "history" + RESET
            + " " + WHITE + detail + RESET;
        info!("{}", msg);
    }

    pub fn error<T: Serialize>(&self, message: &str, metadata: &T) {
        use colors::*;
        let meta = serde_json::to_string(metadata).unwrap_or_default();
        let msg = String::new()
            + BG_RED + WHITE + BOLD + " ✗ ERROR " + RESET
            + " " + RED + &format!("{} | {}", message, meta) + RESET;
        error!("{}", msg);
    }

    pub fn warn<T: Serialize>(&self, message: &str, metadata: &T) {
        use colors::*;
        let meta = serde_json::to_string(metadata).unwrap_or_default();
        let msg = String::new()
            + BG_YELLOW + WHITE + BOLD + " ⚠ WARN " + RESET
            + " " + YELLOW + &format!("{} | {}", message, meta) + RESET;
        warn!("{}", msg);
    }

    pub fn info<T: Serialize>(&self, message: &str, metadata: &T) {
        use colors::*;
        let meta = serde_json::to_string(metadata).unwrap_or_default();
        let msg = String::new()
            + BG_BLUE + WHITE + BOLD + " ℹ INFO " + RESET
            + " " + CYAN + &format!("{} | {}", message, meta) + RESET;
        info!("{}", msg);
    }

    pub fn debug<T: Serialize>(&self, message: &str, metadata: &T) {
        use colors::*;
        let meta = serde_json::to_string(metadata).unwrap_or_default();
        let msg = String::new()
            + BG_MAGENTA + WHITE + BOLD + " ⋯ DEBUG " + RESET
            + " " + MAGENTA + &format!("{} | {}", message, meta) + RESET;
        debug!("{}", msg);
    }

    /// Log server startup with style
    pub fn log_startup(&self, version: &str, address: &str, backend: &str) {
        use colors::*;

        let box_style = String::new() + BOLD + BG_BLUE + WHITE;
        let r = RESET;

        eprintln!();
        eprintln!("{box_style} ════════════════════════════════════════════════════ {r}");
        eprintln!("{box_style} ║ {r}                                              {box_style} ║ {r}");
        eprintln!("{box_style} ║  {BOLD}{WHITE} 🗜  PIXELPRESS {r} {box_style}                                {r}{box_style} ║ {r}");
        eprintln!("{box_style} ║  {WHITE}Version: {CYAN}{version}{r} {box_style}                                 {r}{box_style} ║ {r}");
        eprintln!("{box_style} ║  {WHITE}Address: {GREEN}{address}{r} {box_style}                              {r}{box_style} ║ {r}");
        eprintln!("{box_style} ║  {WHITE}History: {MAGENTA}{backend}{r} {box_style}                                 {r}{box_style} ║ {r}");
        eprintln!("{box_style} ║ {r}                                              {box_style} ║ {r}");
        eprintln!("{box_style} ════════════════════════════════════════════════════ {r}");
        eprintln!();
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("INFO", true)
    }
}
