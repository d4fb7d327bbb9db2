use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Styles used for messages written to stderr.
pub enum StyleType {
    Error,
    Subtle,
}

/// Applies a style to `text`. Colors are dropped when stderr is not a terminal.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Error => style(text).red().bold().for_stderr(),
        StyleType::Subtle => style(text).dim().for_stderr(),
    };
    styled.to_string()
}

/// Creates a spinner on stderr. It stays hidden when stderr is not a terminal.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(spinner_style);
    pb.set_message(style_text(message, StyleType::Subtle));
    pb.tick();
    pb
}
