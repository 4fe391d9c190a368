use crate::errors::{MigrationError, Result};
use std::path::{Component, Path};

/// Single-quoted TypeScript string literal.
pub fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// `LoginPage` -> `loginPage`.
pub fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Module specifier that imports `module` living in `to_dir` from a file in
/// `from_dir`. Always `/`-separated and always relative.
pub fn relative_module_path(from_dir: &Path, to_dir: &Path, module: &str) -> String {
    let from: Vec<Component<'_>> = from_dir.components().filter(|c| *c != Component::CurDir).collect();
    let to: Vec<Component<'_>> = to_dir.components().filter(|c| *c != Component::CurDir).collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = std::iter::repeat("..".to_string())
        .take(from.len() - common)
        .collect();
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.push(module.to_string());

    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}

/// Indents every non-empty line by `level` two-space steps.
pub fn indent(text: &str, level: usize) -> String {
    let pad = "  ".repeat(level);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes a generated module, creating its directory first.
pub fn write_module(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| MigrationError::write(dir, e))?;
    }
    std::fs::write(path, contents).map_err(|e| MigrationError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_quoted_escapes() {
        assert_eq!(single_quoted("it's"), r"'it\'s'");
        assert_eq!(single_quoted(r"a\b"), r"'a\\b'");
    }

    #[test]
    fn test_lower_camel() {
        assert_eq!(lower_camel("LoginPage"), "loginPage");
        assert_eq!(lower_camel("CRMHome"), "cRMHome");
        assert_eq!(lower_camel(""), "");
    }

    #[test]
    fn test_relative_module_path() {
        assert_eq!(
            relative_module_path(Path::new("out/tests"), Path::new("out/pages"), "LoginPage"),
            "../pages/LoginPage"
        );
        assert_eq!(
            relative_module_path(Path::new("out"), Path::new("out/pages"), "HomePage"),
            "./pages/HomePage"
        );
        assert_eq!(
            relative_module_path(Path::new("./a/b"), Path::new("a/b"), "X"),
            "./X"
        );
    }

    #[test]
    fn test_indent_skips_blank_lines() {
        assert_eq!(indent("a\n\nb", 2), "    a\n\n    b");
    }
}
