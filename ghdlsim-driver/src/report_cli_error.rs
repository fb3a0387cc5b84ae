// SPDX-License-Identifier: Apache-2.0

use colored::Colorize;

pub fn report_cli_error_and_exit(
    message: &str,
    context: Option<&str>,
    details: Vec<(&str, &str)>,
) -> ! {
    let context_str = if let Some(context) = context {
        format!("{}: ", context)
    } else {
        String::new()
    };
    eprintln!("ghdlsim-driver: {}{}", context_str, message.red().bold());
    for (key, value) in details {
        eprintln!("  {}: {}", key, value);
    }
    std::process::exit(1);
}

/// Prints a non-fatal problem in the same style as CLI errors.
pub fn report_cli_warning(message: &str, details: Vec<(&str, &str)>) {
    eprintln!("ghdlsim-driver: {}", message.yellow().bold());
    for (key, value) in details {
        eprintln!("  {}: {}", key, value);
    }
}
