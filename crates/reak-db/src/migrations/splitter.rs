//! Naive lexical splitting of migration text into statements.
//!
//! The split happens on every `;`. Quotes and comments are not parsed, so a
//! semicolon inside a string literal or comment splits the statement too.
//! Migration authors must keep semicolons out of literals and comments.

const TERMINATOR: char = ';';

/// Lazily yield each statement, trimmed and re-terminated with `;`.
///
/// Fragments that hold only whitespace and SQL comments are dropped, so a
/// file with nothing but comments produces no statements.
pub fn split_statements(sql: &str) -> impl Iterator<Item = String> + '_ {
    sql.split(TERMINATOR)
        .map(str::trim)
        .filter(|fragment| !is_blank(fragment))
        .map(|fragment| format!("{fragment}{TERMINATOR}"))
}

/// True when `fragment` contains nothing but whitespace, `--` line comments
/// and `/* */` block comments.
fn is_blank(fragment: &str) -> bool {
    let mut rest = fragment.trim_start();
    loop {
        if rest.is_empty() {
            return true;
        }
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(end) => after[end..].trim_start(),
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(end) => after[end + 2..].trim_start(),
                None => "",
            };
        } else {
            return false;
        }
    }
}
