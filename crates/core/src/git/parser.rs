//! Parser for `git log --pretty=format:%ae|%an` output.
//!
//! Each line is `email|name`. Anything else is skipped without error: blank
//! lines, lines that do not split into exactly two fields, and lines with
//! an empty email.

/// One author record from the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry<'a> {
    pub email: &'a str,
    pub name: &'a str,
}

/// Lazily parse raw log lines into [`LogEntry`] values.
pub fn parse_log_lines<'a, I>(lines: I) -> impl Iterator<Item = LogEntry<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().filter_map(parse_line)
}

/// Lazily parse a whole log blob, one record per line.
pub fn parse_log(text: &str) -> impl Iterator<Item = LogEntry<'_>> {
    parse_log_lines(text.lines())
}

fn parse_line(line: &str) -> Option<LogEntry<'_>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return None;
    }
    let mut fields = line.split('|');
    let email = fields.next()?;
    let name = fields.next()?;
    if fields.next().is_some() || email.is_empty() {
        return None;
    }
    Some(LogEntry { email, name })
}
