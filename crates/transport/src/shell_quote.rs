// SPDX-License-Identifier: MIT

//! Credential-safe script interpolation. Remote scripts sometimes need a
//! secret spliced directly into their source rather than passed as an
//! out-of-band parameter; every such interpolation must go through
//! [`escape_for_shell`] so a crafted password can't break out of its quoted
//! context and no plaintext credential ends up anywhere else (logs included
//! — callers must never log the unescaped value either).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellDialect {
    PowerShell,
    Posix,
}

/// Escapes `value` for safe interpolation into a single-quoted (PowerShell)
/// or double-quoted (POSIX) script literal.
pub fn escape_for_shell(value: &str, dialect: ShellDialect) -> String {
    match dialect {
        ShellDialect::PowerShell => {
            // PowerShell single-quoted strings treat `'` as the only special
            // character; escape by doubling it, and neutralize backticks
            // that would otherwise trigger escape-sequence parsing if the
            // literal is later interpolated into a double-quoted context.
            let mut escaped = value.replace('`', "``").replace('\'', "''");
            escaped.insert(0, '\'');
            escaped.push('\'');
            escaped
        }
        ShellDialect::Posix => {
            // Double-quoted POSIX strings: escape backslash, double-quote,
            // backtick, and dollar-sign so command substitution can't fire.
            let mut escaped = String::with_capacity(value.len() + 2);
            escaped.push('"');
            for c in value.chars() {
                if matches!(c, '\\' | '"' | '`' | '$') {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            escaped.push('"');
            escaped
        }
    }
}

#[cfg(test)]
#[path = "shell_quote_tests.rs"]
mod tests;
