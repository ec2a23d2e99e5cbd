//! Help text.

use crate::registry::{CommandRegistry, CommandSpec};

/// Full help: every command, the code table, and examples.
pub fn render_help() -> String {
    let registry = CommandRegistry::global();
    let mut out = String::new();
    out.push_str("TDK Vibrotactor Interface Help:\n");
    out.push_str("-------------------------------\n");
    out.push_str("Usage: tactor <command> <args>...\n\n");
    out.push_str("Commands:\n");
    for spec in registry.commands() {
        push_command_line(&mut out, &spec.usage(), spec.description);
    }

    out.push_str("\nAlternative: use uint8 codes for commands to reduce processing overhead:\n");
    let codes: Vec<String> = registry
        .commands()
        .iter()
        .map(|spec| format!("{} = '{}'", spec.code(), spec.name))
        .collect();
    for row in codes.chunks(4) {
        out.push_str(&format!("  {}\n", row.join(", ")));
    }

    out.push_str("\nExamples:\n");
    out.push_str("  tactor initialize\n");
    out.push_str("  tactor discover 1\n");
    out.push_str("  tactor connect 'DeviceName' 1\n");
    out.push_str("  tactor pulse deviceID 1 100 0\n");
    out.push_str("  tactor shutdown\n");
    out
}

/// Usage and description in a 24-column layout. Usages that leave no room
/// for a separating space get the description on the next line.
fn push_command_line(out: &mut String, usage: &str, description: &str) {
    const WIDTH: usize = 24;
    if usage.len() < WIDTH {
        out.push_str(&format!("  {usage:width$}{description}\n", width = WIDTH));
    } else {
        out.push_str(&format!("  {usage}\n"));
        out.push_str(&format!("  {:width$}{description}\n", "", width = WIDTH));
    }
}

/// Usage block for a single command.
pub fn render_command(spec: &CommandSpec) -> String {
    let mut out = format!("{} (code {})\n", spec.name, spec.code());
    out.push_str(&format!("  {}\n", spec.description));
    out.push_str(&format!("  Usage: {}", spec.usage()));
    if !spec.aliases.is_empty() {
        out.push_str(&format!("\n  Synonyms: {}", spec.aliases.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommandId;

    #[test]
    fn full_help_lists_every_command_and_code() {
        let text = render_help();
        for spec in CommandRegistry::global().commands() {
            assert!(text.contains(&spec.usage()), "missing {}", spec.name);
            assert!(
                text.contains(&format!("{} = '{}'", spec.code(), spec.name)),
                "missing code for {}",
                spec.name
            );
        }
        assert!(text.contains("Examples:"));
    }

    #[test]
    fn usage_never_runs_into_description() {
        let mut out = String::new();
        push_command_line(&mut out, "abcdefghijklmnopqrstuvwx", "Desc.");
        assert_eq!(out, format!("  abcdefghijklmnopqrstuvwx\n  {:24}Desc.\n", ""));

        let mut out = String::new();
        push_command_line(&mut out, "abcdefghijklmnopqrstuvw", "Desc.");
        assert_eq!(out, "  abcdefghijklmnopqrstuvw Desc.\n");
    }

    #[test]
    fn command_help() {
        let reg = CommandRegistry::global();
        let text = render_command(reg.get(CommandId::Pulse));
        assert!(text.starts_with("pulse (code 5)"));
        assert!(text.contains("Usage: pulse <deviceID> <tactor> <duration> <delay>"));
        assert!(!text.contains("Synonyms"));
    }

    #[test]
    fn command_help_lists_synonyms() {
        let text = render_command(CommandRegistry::global().get(CommandId::Help));
        assert!(text.contains("Synonyms: h, list, l"));
    }
}
