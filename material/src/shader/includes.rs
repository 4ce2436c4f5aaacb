use std::collections::HashSet;
use std::sync::Arc;

use crate::error::BuildError;

/// Resolves an include: receives the include name and the name of the
/// including file, returns the included text.
pub type IncludeCallback = Arc<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;

/// Expands `#include "name"` and `#include <name>` lines recursively.
///
/// Every include is inserted at most once, wrapped in `#line` directives so
/// diagnostics point into the included file and back at the following line.
/// Code without include directives is returned unchanged.
pub fn resolve_includes(
    source: &str,
    file_name: &str,
    callback: Option<&IncludeCallback>,
) -> Result<String, BuildError> {
    if !source.lines().any(|line| parse_include_directive(line.trim()).is_some()) {
        return Ok(source.to_string());
    }
    let mut included = HashSet::new();
    expand(source, file_name, callback, &mut included)
}

fn expand(
    source: &str,
    file_name: &str,
    callback: Option<&IncludeCallback>,
    included: &mut HashSet<String>,
) -> Result<String, BuildError> {
    let mut result = String::with_capacity(source.len());

    for (index, line) in source.lines().enumerate() {
        let Some(path) = parse_include_directive(line.trim()) else {
            result.push_str(line);
            result.push('\n');
            continue;
        };
        if !included.insert(path.to_string()) {
            continue;
        }

        let text = callback
            .and_then(|resolve| resolve(path, file_name))
            .ok_or_else(|| BuildError::IncludeResolution {
                include: path.to_string(),
                file: file_name.to_string(),
            })?;

        let resolved = expand(&text, path, callback, included)?;
        result.push_str("#line 1\n");
        result.push_str(&resolved);
        if !resolved.ends_with('\n') {
            result.push('\n');
        }
        result.push_str(&format!("#line {}\n", index + 2));
    }

    Ok(result)
}

/// Parses an include directive, returning the included name.
fn parse_include_directive(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("#include")?.trim();
    if let Some(inner) = rest.strip_prefix('"') {
        inner.strip_suffix('"')
    } else if let Some(inner) = rest.strip_prefix('<') {
        inner.strip_suffix('>')
    } else {
        None
    }
}
