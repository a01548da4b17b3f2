//! Startup banner

use super::config::{is_all_interfaces, is_loopback};
use super::constants::APP_NAME;

const W: usize = 10;

/// Print the startup banner with the API endpoint and storage location
pub fn print_banner(host: &str, port: u16, auth_enabled: bool, data_dir: &str) {
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/v1",
        "API:", display_host, port
    );
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/openapi.json",
        "OpenAPI:", display_host, port
    );

    if auth_enabled {
        println!(
            "  \x1b[90m➜  {:<W$} Authorization: Bearer <key> (pulseboard keys create)\x1b[0m",
            "Auth:"
        );
    } else {
        println!(
            "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m disabled, requests use the default organization",
            "Auth:"
        );
    }

    if is_loopback(host) {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }
    println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Data:", data_dir);
    println!();
}
