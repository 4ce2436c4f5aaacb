//! Static checks of generated programs.
//!
//! Property discovery runs on a program generated with every property
//! assumed present, so analysis sees every branch of the user code, and
//! records only the properties the user code actually writes. Semantic
//! analysis then runs on programs generated with the discovered properties.

use crate::error::AnalysisError;
use crate::info::MaterialInfo;
use crate::permutation::Permutation;
use crate::property::{Property, PropertySet};
use crate::types::{MaterialDomain, ShaderStage};

/// Statically inspects generated programs before compilation.
pub trait ShaderAnalyzer: Send + Sync {
    /// Adds the properties referenced by the user entry point of `stage`.
    fn find_properties(
        &self,
        stage: ShaderStage,
        source: &str,
        properties: &mut PropertySet,
        permutation: &Permutation,
    ) -> Result<(), AnalysisError>;

    /// Rejects programs that cannot compile or miss a required entry point.
    fn analyze(
        &self,
        stage: ShaderStage,
        source: &str,
        permutation: &Permutation,
        info: &MaterialInfo,
    ) -> Result<(), AnalysisError>;
}

/// Lexical analyzer working on comment-stripped source text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAnalyzer;

impl StaticAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl ShaderAnalyzer for StaticAnalyzer {
    fn find_properties(
        &self,
        stage: ShaderStage,
        source: &str,
        properties: &mut PropertySet,
        _permutation: &Permutation,
    ) -> Result<(), AnalysisError> {
        let code = strip_comments(source);
        check_delimiters(stage, &code)?;

        let entry = match stage {
            ShaderStage::Vertex => "materialVertex",
            ShaderStage::Fragment => "material",
        };
        let Some(function) = find_function(&code, entry) else {
            return match stage {
                // vertex code is optional
                ShaderStage::Vertex => Ok(()),
                ShaderStage::Fragment => Err(AnalysisError::new(
                    stage,
                    format!("entry point {entry}() not found"),
                )),
            };
        };

        let Some(receiver) = first_parameter_name(function.params) else {
            return match stage {
                ShaderStage::Vertex => Ok(()),
                ShaderStage::Fragment => Err(AnalysisError::new(
                    stage,
                    format!("entry point {entry}() takes no inputs parameter"),
                )),
            };
        };
        for name in member_accesses(function.body, receiver) {
            if let Some(property) = Property::from_name(name) {
                // fragment entry points cannot write vertex properties and vice versa
                if property.is_vertex() == (stage == ShaderStage::Vertex) {
                    properties.insert(property);
                }
            }
        }
        Ok(())
    }

    fn analyze(
        &self,
        stage: ShaderStage,
        source: &str,
        _permutation: &Permutation,
        info: &MaterialInfo,
    ) -> Result<(), AnalysisError> {
        let code = strip_comments(source);
        check_delimiters(stage, &code)?;

        if function_body(&code, "main").is_none() {
            return Err(AnalysisError::new(stage, "entry point main() not found"));
        }
        if stage == ShaderStage::Vertex {
            return Ok(());
        }

        match info.domain() {
            MaterialDomain::Surface => {
                let body = function_body(&code, "material").ok_or_else(|| {
                    AnalysisError::new(stage, "entry point material() not found")
                })?;
                if !contains_call(body, "prepareMaterial") {
                    return Err(AnalysisError::new(
                        stage,
                        "material() must call prepareMaterial()",
                    ));
                }
                if info.state.custom_surface_shading && function_body(&code, "surfaceShading").is_none() {
                    return Err(AnalysisError::new(
                        stage,
                        "custom surface shading requires a surfaceShading() function",
                    ));
                }
            }
            MaterialDomain::PostProcess => {
                if function_body(&code, "postProcess").is_none() {
                    return Err(AnalysisError::new(stage, "entry point postProcess() not found"));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lexical helpers
// ---------------------------------------------------------------------------

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replaces comments with spaces, keeping newlines so line numbers survive.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if previous == '*' && c == '/' {
                        break;
                    }
                    previous = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Checks that parentheses, brackets and braces are balanced.
fn check_delimiters(stage: ShaderStage, code: &str) -> Result<(), AnalysisError> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    for (index, line) in code.lines().enumerate() {
        let line_number = index + 1;
        // preprocessor lines may hold unbalanced text in macro bodies
        if line.trim_start().starts_with('#') {
            continue;
        }
        for c in line.chars() {
            match c {
                '(' | '[' | '{' => stack.push((c, line_number)),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        Some((open, opened_at)) => {
                            return Err(AnalysisError::new(
                                stage,
                                format!(
                                    "line {line_number}: '{c}' does not match '{open}' opened on line {opened_at}"
                                ),
                            ));
                        }
                        None => {
                            return Err(AnalysisError::new(
                                stage,
                                format!("line {line_number}: unexpected '{c}'"),
                            ));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    match stack.pop() {
        Some((open, line_number)) => Err(AnalysisError::new(
            stage,
            format!("'{open}' opened on line {line_number} is never closed"),
        )),
        None => Ok(()),
    }
}

/// Parameter list and body of a function definition, without the outer
/// parentheses and braces.
#[derive(Debug, Clone, Copy)]
struct Function<'a> {
    params: &'a str,
    body: &'a str,
}

fn function_body<'a>(code: &'a str, name: &str) -> Option<&'a str> {
    find_function(code, name).map(|function| function.body)
}

/// Last identifier of the first parameter, e.g. `m` in `inout MaterialInputs m`.
fn first_parameter_name(params: &str) -> Option<&str> {
    let first = params.split(',').next()?;
    let first = first.split('[').next()?.trim_end();
    let start = first
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_ident(c))
        .last()
        .map(|(index, _)| index)?;
    let name = &first[start..];
    name.starts_with(|c: char| !c.is_ascii_digit()).then_some(name)
}

/// First definition of `name`.
fn find_function<'a>(code: &'a str, name: &str) -> Option<Function<'a>> {
    let mut search = 0;
    while let Some(found) = code[search..].find(name) {
        let start = search + found;
        let end = start + name.len();
        search = end;

        let before = code[..start].chars().next_back();
        if before.is_some_and(is_ident) {
            continue;
        }
        let rest = &code[end..];
        let Some(params) = rest.trim_start().strip_prefix('(') else {
            continue;
        };
        // a definition has a return type before the name
        let declared = code[..start]
            .trim_end()
            .chars()
            .next_back()
            .is_some_and(is_ident);
        if !declared {
            continue;
        }
        let close = params.find(')')?;
        let after = params[close + 1..].trim_start();
        if !after.starts_with('{') {
            continue;
        }
        let open = code.len() - after.len();
        return matching_brace(code, open).map(|close_brace| Function {
            params: &params[..close],
            body: &code[open + 1..close_brace],
        });
    }
    None
}

/// Index of the brace closing the one at `open`.
fn matching_brace(code: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in code[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Identifiers accessed as `receiver.<ident>`.
fn member_accesses<'a>(body: &'a str, receiver: &str) -> impl Iterator<Item = &'a str> {
    let pattern = format!("{receiver}.");
    let mut matches = Vec::new();
    for (index, _) in body.match_indices(&pattern) {
        if body[..index].chars().next_back().is_some_and(is_ident) {
            continue;
        }
        let rest = &body[index + pattern.len()..];
        let len = rest.find(|c: char| !is_ident(c)).unwrap_or(rest.len());
        if len > 0 {
            matches.push(&rest[..len]);
        }
    }
    matches.into_iter()
}

fn contains_call(body: &str, name: &str) -> bool {
    body.match_indices(name).any(|(index, _)| {
        let before_ok = !body[..index].chars().next_back().is_some_and(is_ident);
        let after = body[index + name.len()..].trim_start();
        before_ok && after.starts_with('(')
    })
}
