use std::path::Path;

use crate::config::{AppConfig, config_path};

pub fn run(config: &AppConfig, explicit: Option<&Path>) {
    match explicit.map(Path::to_path_buf).or_else(config_path) {
        Some(path) if path.exists() => println!("# Config file: {}", path.display()),
        Some(path) => println!("# Config file: {} (not created yet)", path.display()),
        None => println!("# Config file: (no config directory)"),
    }
    println!("# Effective settings, including command line flags");
    println!();
    print!("{}", config.to_contents());
}
