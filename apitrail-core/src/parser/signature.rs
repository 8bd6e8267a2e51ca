//! Canonical signature text for functions and methods.
//!
//! Rendering turns extracted parameters into `(params) -> return`. Parsing
//! reads that text back into parameters so the compatibility check can
//! reason about what changed.

use std::fmt;

use super::helpers::collapse_whitespace;

/// Placeholder for a missing return annotation.
pub const UNKNOWN_RETURN: &str = "<unknown>";

/// Kind of a parameter slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Plain, annotated and/or defaulted parameter.
    Regular,
    /// `*args`
    VarPositional,
    /// `**kwargs`
    VarKeyword,
    /// Bare `*`
    KeywordOnlyMarker,
    /// `/`
    PositionalOnlyMarker,
}

/// One parameter slot of a signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub kind: ParamKind,
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<String>,
}

impl Param {
    pub fn regular(name: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::Regular,
            name: name.into(),
            annotation: None,
            default: None,
        }
    }

    pub fn var_positional(name: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::VarPositional,
            ..Self::regular(name)
        }
    }

    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::VarKeyword,
            ..Self::regular(name)
        }
    }

    pub fn keyword_only_marker() -> Self {
        Self {
            kind: ParamKind::KeywordOnlyMarker,
            ..Self::regular("*")
        }
    }

    pub fn positional_only_marker() -> Self {
        Self {
            kind: ParamKind::PositionalOnlyMarker,
            ..Self::regular("/")
        }
    }

    /// Set the annotation, collapsing whitespace.
    pub fn with_annotation(mut self, annotation: &str) -> Self {
        self.annotation = Some(collapse_whitespace(annotation));
        self
    }

    /// Set the default, collapsing whitespace.
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(collapse_whitespace(default));
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Whether this slot can be named in a call (excludes markers).
    pub fn is_named(&self) -> bool {
        !matches!(
            self.kind,
            ParamKind::KeywordOnlyMarker | ParamKind::PositionalOnlyMarker
        )
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::KeywordOnlyMarker => return f.write_str("*"),
            ParamKind::PositionalOnlyMarker => return f.write_str("/"),
            ParamKind::VarPositional => write!(f, "*{}", self.name)?,
            ParamKind::VarKeyword => write!(f, "**{}", self.name)?,
            ParamKind::Regular => f.write_str(&self.name)?,
        }
        match (&self.annotation, &self.default) {
            (Some(ann), Some(def)) => write!(f, ": {} = {}", ann, def),
            (Some(ann), None) => write!(f, ": {}", ann),
            (None, Some(def)) => write!(f, "={}", def),
            (None, None) => Ok(()),
        }
    }
}

/// Render the canonical signature.
pub fn render(params: &[Param], return_annotation: Option<&str>) -> String {
    let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    let ret = return_annotation
        .map(collapse_whitespace)
        .unwrap_or_else(|| UNKNOWN_RETURN.to_string());
    format!("({}) -> {}", params.join(", "), ret)
}

/// A signature read back from its canonical text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedSignature {
    pub params: Vec<Param>,
    pub return_annotation: String,
}

impl ParsedSignature {
    /// Index of the first keyword-only slot, if the signature has any.
    pub fn keyword_only_start(&self) -> Option<usize> {
        self.params
            .iter()
            .position(|p| {
                matches!(
                    p.kind,
                    ParamKind::KeywordOnlyMarker | ParamKind::VarPositional
                )
            })
            .map(|i| i + 1)
    }
}

/// Parse canonical signature text. Returns `None` for anything that is not
/// of the form `(params) -> return`.
pub fn parse(signature: &str) -> Option<ParsedSignature> {
    let signature = signature.trim();
    if !signature.starts_with('(') {
        return None;
    }
    let close = matching_paren(signature)?;
    let inner = &signature[1..close];
    let rest = signature[close + 1..].trim();
    let return_annotation = rest.strip_prefix("->")?.trim().to_string();

    let params = split_top_level(inner, ',')
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(parse_param)
        .collect();

    Some(ParsedSignature {
        params,
        return_annotation,
    })
}

fn parse_param(token: &str) -> Param {
    match token {
        "*" => return Param::keyword_only_marker(),
        "/" => return Param::positional_only_marker(),
        _ => {}
    }

    let (head, default) = match find_default_separator(token) {
        Some(idx) => (token[..idx].trim(), Some(token[idx + 1..].trim())),
        None => (token, None),
    };
    let (name, annotation) = match find_top_level(head, ':') {
        Some(idx) => (head[..idx].trim(), Some(head[idx + 1..].trim())),
        None => (head.trim(), None),
    };

    let mut param = if let Some(name) = name.strip_prefix("**") {
        Param::var_keyword(name)
    } else if let Some(name) = name.strip_prefix('*') {
        Param::var_positional(name)
    } else {
        Param::regular(name)
    };
    if let Some(ann) = annotation {
        param = param.with_annotation(ann);
    }
    if let Some(def) = default {
        param = param.with_default(def);
    }
    param
}

/// Byte index of the `)` closing the leading `(`.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Positions of `sep` outside brackets and string literals.
fn top_level_positions(text: &str, sep: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == sep && depth == 0 => positions.push(idx),
            _ => {}
        }
    }
    positions
}

fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for idx in top_level_positions(text, sep) {
        parts.push(&text[start..idx]);
        start = idx + sep.len_utf8();
    }
    parts.push(&text[start..]);
    parts
}

fn find_top_level(text: &str, sep: char) -> Option<usize> {
    top_level_positions(text, sep).into_iter().next()
}

/// First top-level `=` that is an assignment, not part of `==`, `!=`, `<=`, `>=`.
fn find_default_separator(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    top_level_positions(text, '=').into_iter().find(|&idx| {
        let prev = idx.checked_sub(1).map(|i| bytes[i]);
        let next = bytes.get(idx + 1).copied();
        !matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) && next != Some(b'=')
    })
}
