//! Pure text predicates used for impl ownership and generic-argument probing.
//!
//! Everything here works on rendered source text, so it is shared by every
//! language backend.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static TYPE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:(?:::|\.)[A-Za-z_][A-Za-z0-9_]*)*")
        .expect("static regex is valid")
});

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offset of the first occurrence of `token` not glued to other
/// identifier characters.
pub fn find_token(haystack: &str, token: &str) -> Option<usize> {
    if token.is_empty() {
        return None;
    }
    haystack.match_indices(token).map(|(i, _)| i).find(|&i| {
        let before_ok = haystack[..i].chars().next_back().is_none_or(|c| !is_ident_char(c));
        let after_ok = haystack[i + token.len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_ident_char(c));
        before_ok && after_ok
    })
}

pub fn has_token(haystack: &str, token: &str) -> bool {
    find_token(haystack, token).is_some()
}

/// Drop a trailing `where` clause
pub fn strip_where_clause(header: &str) -> &str {
    match find_token(header, "where") {
        Some(idx) => header[..idx].trim_end(),
        None => header,
    }
}

/// Whether `header` names `type_name` as a whole type token.
///
/// The name must be preceded by start, `<`, `,`, `:` or a space and followed
/// by end, `<`, `>`, `,` or a space. Anything after `where` is ignored.
pub fn names_owner(header: &str, type_name: &str) -> bool {
    if type_name.is_empty() {
        return false;
    }
    let header = strip_where_clause(header);
    header.match_indices(type_name).any(|(i, _)| {
        let before_ok = header[..i]
            .chars()
            .next_back()
            .is_none_or(|c| matches!(c, '<' | ',' | ' ' | ':'));
        let after_ok = header[i + type_name.len()..]
            .chars()
            .next()
            .is_none_or(|c| matches!(c, '<' | '>' | ',' | ' '));
        before_ok && after_ok
    })
}

/// The self type of an impl header: the part after `for` when present
pub fn impl_self_type(header: &str) -> &str {
    let header = strip_where_clause(header);
    let mut rest = header;
    let mut consumed = 0;
    let mut last_for = None;
    while let Some(idx) = find_token(rest, "for") {
        last_for = Some(consumed + idx);
        consumed += idx + 3;
        rest = &header[consumed..];
    }
    match last_for {
        Some(idx) => header[idx + 3..].trim(),
        None => header
            .trim()
            .strip_prefix("impl")
            .map(str::trim)
            .unwrap_or(header),
    }
}

/// Whether an impl header implements a trait
pub fn is_trait_impl(header: &str) -> bool {
    has_token(strip_where_clause(header), "for")
}

/// Split on commas that are not nested in `<>`, `()`, `[]` or `{}`.
///
/// Returns each piece with its byte offset inside `text`. The `>` of `->`
/// does not close a bracket.
pub fn split_top_level_commas(text: &str) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    let mut prev = '\0';
    for (i, c) in text.char_indices() {
        match c {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' if prev != '-' => depth -= 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                pieces.push((start, &text[start..i]));
                start = i + 1;
            }
            _ => {}
        }
        prev = c;
    }
    if !text[start..].trim().is_empty() || !pieces.is_empty() {
        pieces.push((start, &text[start..]));
    }
    pieces
}

/// Head type identifier of one generic argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadIdent {
    /// Last path segment, e.g. `Foo` for `crate::model::Foo<T>`
    pub name: String,
    /// Byte offset of `name` inside the argument text
    pub offset: usize,
    /// Span between the argument's own angle brackets, if any
    pub generics: Option<Range<usize>>,
}

/// Locate the head identifier of a type written as text.
///
/// Skips references, lifetimes, `mut`, `dyn`, `impl`, `final` and Java
/// wildcard bounds. Returns `None` for lifetimes and `?` alone.
pub fn head_identifier(arg: &str) -> Option<HeadIdent> {
    let mut pos = 0;
    loop {
        let rest = &arg[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();
        if let Some(after) = trimmed.strip_prefix('&').or_else(|| trimmed.strip_prefix('*')) {
            pos += trimmed.len() - after.len();
            continue;
        }
        if trimmed.starts_with('\'') {
            let len = trimmed[1..]
                .find(|c: char| !is_ident_char(c))
                .map_or(trimmed.len(), |n| n + 1);
            if trimmed[len..].trim().is_empty() {
                return None;
            }
            pos += len;
            continue;
        }
        if let Some(after) = trimmed.strip_prefix('?') {
            let after_trim = after.trim_start();
            let bound = ["extends", "super"]
                .into_iter()
                .find_map(|kw| after_trim.strip_prefix(kw).filter(|r| r.starts_with(' ')));
            match bound {
                Some(r) => pos += trimmed.len() - r.len(),
                None => return None,
            }
            continue;
        }
        let keyword = ["mut", "const", "dyn", "impl", "final"]
            .into_iter()
            .find(|&kw| {
                trimmed.starts_with(kw)
                    && trimmed[kw.len()..]
                        .chars()
                        .next()
                        .is_some_and(|c| !is_ident_char(c))
            });
        match keyword {
            Some(kw) => pos += kw.len(),
            None => break,
        }
    }

    let rest = &arg[pos..];
    let m = TYPE_PATH.find(rest)?;
    let path = m.as_str();
    let last = path
        .rfind([':', '.'])
        .map_or(0, |i| i + 1);
    let name = path[last..].to_string();
    let offset = pos + last;

    let after = &rest[m.end()..];
    let gap = after.len() - after.trim_start().len();
    let open = pos + m.end() + gap;
    let generics = if arg[open..].starts_with('<') {
        matching_close(arg, open).map(|close| open + 1..close)
    } else {
        None
    };

    Some(HeadIdent {
        name,
        offset,
        generics,
    })
}

/// Index of the `>` closing the `<` at `open`
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0;
    let mut prev = '\0';
    for (i, c) in text[open..].char_indices() {
        match c {
            '<' => depth += 1,
            '>' if prev != '-' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
        prev = c;
    }
    None
}

/// Insert `name` right after the `fn` keyword of a function detail
pub fn insert_fn_name(detail: &str, name: &str) -> String {
    match find_token(detail, "fn") {
        Some(idx) => {
            let (head, tail) = detail.split_at(idx + 2);
            format!("{} {}{}", head, name, tail.trim_start())
        }
        None => detail.to_string(),
    }
}

/// Collapse runs of whitespace into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove all whitespace, for structural type comparison
pub fn squash_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
