//! Terminal styling for gitavatar output.

use console::Style;

/// How a line or a figure should read at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Bad,
    Caution,
    Quiet,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Good => Style::new().green(),
            Tone::Bad => Style::new().red(),
            Tone::Caution => Style::new().yellow(),
            Tone::Quiet => Style::new().dim(),
        }
    }

    fn mark(self) -> &'static str {
        match self {
            Tone::Good => "✓",
            Tone::Bad => "✗",
            Tone::Caution => "!",
            Tone::Quiet => "·",
        }
    }
}

/// A message led by the tone's coloured mark.
pub fn status(tone: Tone, msg: &str) -> String {
    format!("{} {}", tone.style().apply_to(tone.mark()), msg)
}

/// One line of the fetch summary. Zero counts always read as quiet.
pub fn count_row(label: &str, value: usize, tone: Tone) -> String {
    let tone = if value == 0 { Tone::Quiet } else { tone };
    format!("  {:<11}{}", label, tone.style().apply_to(value))
}

/// A labelled detail line, value dimmed.
pub fn detail_row(label: &str, value: &str) -> String {
    format!("  {:<11}{}", label, Tone::Quiet.style().apply_to(value))
}

pub fn heading(text: &str) -> String {
    Style::new().bold().apply_to(text).to_string()
}

pub fn quiet(text: &str) -> String {
    Tone::Quiet.style().apply_to(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_without_colors() {
        console::set_colors_enabled(false);
        assert_eq!(status(Tone::Good, "done"), "✓ done");
        assert_eq!(status(Tone::Bad, "boom"), "✗ boom");
        assert_eq!(count_row("Saved", 3, Tone::Good), "  Saved      3");
        assert_eq!(count_row("Failed", 0, Tone::Bad), "  Failed     0");
        assert_eq!(detail_row("Directory", "/out"), "  Directory  /out");
        assert_eq!(heading("Fetch summary"), "Fetch summary");
    }
}
