//! Path helpers for settings files named in environment variables.

use std::path::PathBuf;

use dirs_next::home_dir;

/// Resolve a leading `~` against the home directory.
///
/// Both `~/` and the Windows-style `~\` prefixes are recognized. Anything
/// else is returned trimmed but otherwise unchanged; without a home
/// directory the `~` is kept literally.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let remainder = match trimmed {
        "~" => Some(""),
        _ => trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")),
    };

    match remainder {
        Some(rest) => {
            let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
            if rest.is_empty() { home } else { home.join(rest) }
        }
        None => PathBuf::from(trimmed),
    }
}
