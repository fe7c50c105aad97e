pub mod extract;
pub mod info;

use owo_colors::OwoColorize;

use o2jam_core::{Diagnostics, Difficulty, Severity};

/// Difficulty label with color, padded to a fixed width
fn format_colored_difficulty(difficulty: Difficulty) -> String {
    let name = format!("{:<6}", difficulty.name());
    match difficulty {
        Difficulty::Easy => name.green().to_string(),
        Difficulty::Normal => name.yellow().to_string(),
        Difficulty::Hard => name.red().to_string(),
    }
}

/// Print collected diagnostics to stderr, one per line
fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    eprintln!();
    eprintln!(
        "{} diagnostics ({} warnings):",
        diagnostics.len(),
        diagnostics.warnings()
    );
    for diagnostic in diagnostics {
        let label = match diagnostic.severity() {
            Severity::Info => Severity::Info.dimmed().to_string(),
            Severity::Warning => Severity::Warning.yellow().to_string(),
        };
        eprintln!("  {} {}", label, diagnostic);
    }
}
