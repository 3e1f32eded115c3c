//! Status-line output helpers for the CLI

/// Print an informational message to stdout
pub fn print_info(message: &str) {
    println!("{}", message);
}

/// Print a success message with a green check mark
pub fn print_success(message: &str) {
    println!("\x1b[32m✓\x1b[0m {}", message);
}

/// Print a warning message with a yellow marker to stderr
pub fn print_warning(message: &str) {
    eprintln!("\x1b[33m!\x1b[0m {}", message);
}

/// Print an error message with a red marker to stderr
pub fn print_error(message: &str) {
    eprintln!("\x1b[31m✗\x1b[0m {}", message);
}
