//! Lexical scan of a single source file for `module`/`use` declarations.
//!
//! This is deliberately not a real Fortran parser: no continuation lines, no
//! string-literal-aware tokenization, no conditional compilation. It is a
//! best-effort scan that is sufficient to build the module dependency graph.

use crate::{
    error::{FcompileError, Result},
    types::ModuleName,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    collections::HashSet,
    io::{BufRead, BufReader, Read},
    path::Path,
};

static MODULE_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^module\s+(\w+)\s*").unwrap());
static USE_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^use\s+(\w+)\s*").unwrap());

/// The result of scanning one source file.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ParsedSource {
    pub line_count: usize,
    pub defined_modules: Vec<ModuleName>,
    pub used_modules: HashSet<ModuleName>,
}

/// Scans `reader` line by line, extracting `module`/`use` declarations.
pub fn parse_modules(file: &Path, reader: impl Read) -> Result<ParsedSource> {
    let mut defined = Vec::new();
    let mut used = HashSet::new();
    let mut line_count = 0usize;

    for line in BufReader::new(reader).lines() {
        let line = line?;
        line_count += 1;
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('!') {
            continue;
        }

        let Some(word_end) = trimmed.find(char::is_whitespace) else { continue };
        let word = trimmed[..word_end].to_lowercase();

        match word.as_str() {
            "module" => {
                let caps = MODULE_DECL.captures(trimmed).ok_or(FcompileError::MalformedDeclaration {
                    file: file.to_path_buf(),
                    line: line_count,
                    keyword: "module",
                })?;
                let ident = caps.get(1).unwrap().as_str().to_lowercase();
                if ident != "procedure" {
                    defined.push(ModuleName::new(ident));
                }
            }
            "use" => {
                let caps = USE_DECL.captures(trimmed).ok_or(FcompileError::MalformedDeclaration {
                    file: file.to_path_buf(),
                    line: line_count,
                    keyword: "use",
                })?;
                used.insert(ModuleName::new(caps.get(1).unwrap().as_str()));
            }
            _ => {}
        }
    }

    for module in &defined {
        used.remove(module);
    }

    Ok(ParsedSource { line_count, defined_modules: defined, used_modules: used })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> ParsedSource {
        parse_modules(Path::new("test.f90"), src.as_bytes()).unwrap()
    }

    #[test]
    fn finds_module_and_use() {
        let p = parse("module Foo\n  use Bar\nend module Foo\n");
        assert_eq!(p.defined_modules, vec![ModuleName::new("foo")]);
        assert!(p.used_modules.contains(&ModuleName::new("bar")));
        assert_eq!(p.line_count, 3);
    }

    #[test]
    fn self_use_is_dropped() {
        let p = parse("module foo\nuse foo\nend module foo\n");
        assert!(p.used_modules.is_empty());
    }

    #[test]
    fn module_procedure_is_not_a_definition() {
        let p = parse("module procedure bar\nend procedure\n");
        assert!(p.defined_modules.is_empty());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let p = parse("! a comment\n\n   \nuse baz\n");
        assert!(p.used_modules.contains(&ModuleName::new("baz")));
        assert_eq!(p.line_count, 4);
    }

    #[test]
    fn case_is_folded() {
        let p = parse("MODULE Foo\nUSE BAR\n");
        assert_eq!(p.defined_modules, vec![ModuleName::new("foo")]);
        assert!(p.used_modules.contains(&ModuleName::new("bar")));
    }
}
