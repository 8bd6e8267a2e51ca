//! Python API extractor using tree-sitter.
//!
//! Models module-level functions, classes with their direct methods, and
//! upper-case constants bound to trivially evaluable values. Nested classes and
//! definitions inside control flow are not visited.

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node, Parser};

use super::deprecation;
use super::helpers::{
    clean_docstring, collapse_whitespace, find_child_by_type, first_error_line, get_node_text,
    get_start_line, named_children, string_literal_value,
};
use super::signature::{self, Param};
use crate::types::{ApiElement, ApiKind, ElementDetail};

static CONSTANT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^_*[A-Z][A-Z0-9_]*$").unwrap());

/// Parse one Python module and return its elements in source order.
///
/// A source whose syntax tree contains errors is rejected as a whole.
pub fn parse(source: &str, module_path: &str) -> Result<Vec<ApiElement>, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| format!("Failed to set Python language: {}", e))?;

    let tree = parser
        .parse(source, None)
        .ok_or("Failed to parse Python source")?;
    let root = tree.root_node();

    if let Some(line) = first_error_line(&root) {
        return Err(format!("Syntax error near line {}", line));
    }

    let mut elements = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                elements.push(extract_function(
                    &child,
                    source,
                    module_path,
                    ApiKind::Function,
                    Vec::new(),
                ));
            }
            "class_definition" => {
                extract_class(&child, source, module_path, Vec::new(), &mut elements);
            }
            "decorated_definition" => {
                let decorators = extract_decorators(&child, source);
                if let Some(def) = child.child_by_field_name("definition") {
                    match def.kind() {
                        "function_definition" => elements.push(extract_function(
                            &def,
                            source,
                            module_path,
                            ApiKind::Function,
                            decorators,
                        )),
                        "class_definition" => {
                            extract_class(&def, source, module_path, decorators, &mut elements)
                        }
                        _ => {}
                    }
                }
            }
            "expression_statement" => {
                if let Some(constant) = extract_constant(&child, source, module_path) {
                    elements.push(constant);
                }
            }
            _ => {}
        }
    }

    Ok(elements)
}

/// Extract a class and its direct methods.
fn extract_class(
    node: &Node,
    source: &str,
    module_path: &str,
    decorators: Vec<String>,
    elements: &mut Vec<ApiElement>,
) {
    let name = match node.child_by_field_name("name") {
        Some(n) => get_node_text(&n, source).to_string(),
        None => return,
    };

    let bases = node
        .child_by_field_name("superclasses")
        .map(|args| extract_bases(&args, source))
        .unwrap_or_default();
    let body = node.child_by_field_name("body");
    let docstring = body.as_ref().and_then(|b| extract_docstring(b, source));

    let mut class = ApiElement::new(name.as_str(), ApiKind::Class, module_path)
        .with_line_number(get_start_line(node))
        .with_detail(ElementDetail::Class { bases });
    if deprecation::detect(&name, &decorators, docstring.as_deref()).is_some() {
        class = class.mark_deprecated();
    }
    class = class.with_decorators(decorators);
    if let Some(doc) = docstring {
        class = class.with_docstring(doc);
    }
    elements.push(class);

    let Some(body) = body else {
        return;
    };
    let member_path = format!("{}.{}", module_path, name);

    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                elements.push(extract_function(
                    &child,
                    source,
                    &member_path,
                    ApiKind::Method,
                    Vec::new(),
                ));
            }
            "decorated_definition" => {
                let decorators = extract_decorators(&child, source);
                if decorators.iter().any(|d| is_accessor_decorator(d)) {
                    continue;
                }
                if let Some(def) = child.child_by_field_name("definition") {
                    if def.kind() == "function_definition" {
                        elements.push(extract_function(
                            &def,
                            source,
                            &member_path,
                            ApiKind::Method,
                            decorators,
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

/// Base class expressions as written. Keyword arguments such as
/// `metaclass=...` are not bases.
fn extract_bases(args: &Node, source: &str) -> Vec<String> {
    named_children(args)
        .iter()
        .filter(|n| {
            !matches!(
                n.kind(),
                "keyword_argument" | "list_splat" | "dictionary_splat"
            )
        })
        .map(|n| collapse_whitespace(get_node_text(n, source)))
        .collect()
}

/// `@x.setter` and `@x.deleter` are folded into the property getter.
fn is_accessor_decorator(decorator: &str) -> bool {
    decorator.ends_with(".setter") || decorator.ends_with(".deleter")
}

/// Extract a function or method.
fn extract_function(
    node: &Node,
    source: &str,
    module_path: &str,
    kind: ApiKind,
    decorators: Vec<String>,
) -> ApiElement {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_node_text(&n, source).to_string())
        .unwrap_or_default();
    let is_async = find_child_by_type(node, "async").is_some();

    let params = node
        .child_by_field_name("parameters")
        .map(|p| extract_parameters(&p, source))
        .unwrap_or_default();
    let return_type = node
        .child_by_field_name("return_type")
        .map(|t| collapse_whitespace(get_node_text(&t, source)));
    let docstring = node
        .child_by_field_name("body")
        .and_then(|b| extract_docstring(&b, source));

    let detail = ElementDetail::Callable {
        is_async,
        is_static: decorators.iter().any(|d| d == "staticmethod"),
        is_classmethod: decorators.iter().any(|d| d == "classmethod"),
        is_property: decorators.iter().any(|d| is_property_decorator(d)),
    };

    let mut element = ApiElement::new(name.as_str(), kind, module_path)
        .with_signature(signature::render(&params, return_type.as_deref()))
        .with_line_number(get_start_line(node))
        .with_detail(detail);

    for param in params.iter().filter(|p| p.is_named()) {
        if let Some(ann) = &param.annotation {
            element = element.with_type_hint(param.name.as_str(), ann.as_str());
        }
    }
    if let Some(ret) = return_type {
        element = element.with_type_hint("return", ret);
    }
    if deprecation::detect(&name, &decorators, docstring.as_deref()).is_some() {
        element = element.mark_deprecated();
    }
    element = element.with_decorators(decorators);
    if let Some(doc) = docstring {
        element = element.with_docstring(doc);
    }
    element
}

fn is_property_decorator(decorator: &str) -> bool {
    matches!(
        decorator,
        "property" | "cached_property" | "functools.cached_property"
    )
}

/// Extract parameters in declaration order.
fn extract_parameters(node: &Node, source: &str) -> Vec<Param> {
    named_children(node)
        .iter()
        .filter_map(|child| extract_parameter(child, source))
        .collect()
}

fn extract_parameter(node: &Node, source: &str) -> Option<Param> {
    let text = |n: &Node| get_node_text(n, source).to_string();
    let param = match node.kind() {
        "identifier" => Param::regular(text(node)),
        "list_splat_pattern" => Param::var_positional(splat_name(node, source)),
        "dictionary_splat_pattern" => Param::var_keyword(splat_name(node, source)),
        "keyword_separator" => Param::keyword_only_marker(),
        "positional_separator" => Param::positional_only_marker(),
        "typed_parameter" => {
            let base = match named_children(node).first() {
                Some(inner) if inner.kind() == "list_splat_pattern" => {
                    Param::var_positional(splat_name(inner, source))
                }
                Some(inner) if inner.kind() == "dictionary_splat_pattern" => {
                    Param::var_keyword(splat_name(inner, source))
                }
                Some(inner) => Param::regular(text(inner)),
                None => return None,
            };
            match node.child_by_field_name("type") {
                Some(t) => base.with_annotation(get_node_text(&t, source)),
                None => base,
            }
        }
        "default_parameter" | "typed_default_parameter" => {
            let name = node.child_by_field_name("name").map(|n| text(&n))?;
            let mut param = Param::regular(name);
            if let Some(t) = node.child_by_field_name("type") {
                param = param.with_annotation(get_node_text(&t, source));
            }
            if let Some(v) = node.child_by_field_name("value") {
                param = param.with_default(get_node_text(&v, source));
            }
            param
        }
        _ => return None,
    };
    Some(param)
}

fn splat_name(node: &Node, source: &str) -> String {
    find_child_by_type(node, "identifier")
        .map(|n| get_node_text(&n, source).to_string())
        .unwrap_or_default()
}

/// Decorator names without `@` and without call arguments.
fn extract_decorators(node: &Node, source: &str) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let text = get_node_text(&child, source);
        let text = text.strip_prefix('@').unwrap_or(text);
        let text = match text.find('(') {
            Some(idx) => &text[..idx],
            None => text,
        };
        decorators.push(collapse_whitespace(text));
    }
    decorators
}

/// Cleaned docstring of a block: its first statement, if that is a string.
fn extract_docstring(block: &Node, source: &str) -> Option<String> {
    let first = named_children(block).into_iter().next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = named_children(&first).into_iter().next()?;
    let raw = match expr.kind() {
        "string" if !has_interpolation(&expr) => {
            string_literal_value(get_node_text(&expr, source)).to_string()
        }
        "concatenated_string" => named_children(&expr)
            .iter()
            .filter(|s| s.kind() == "string")
            .map(|s| string_literal_value(get_node_text(s, source)))
            .collect::<String>(),
        _ => return None,
    };
    clean_docstring(&raw)
}

/// Extract an upper-case module constant from `NAME = value` or
/// `NAME: T = value`.
fn extract_constant(node: &Node, source: &str, module_path: &str) -> Option<ApiElement> {
    let assignment = find_child_by_type(node, "assignment")?;
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let name = get_node_text(&left, source);
    if !CONSTANT_NAME.is_match(name) {
        return None;
    }
    let right = assignment.child_by_field_name("right")?;
    if !is_trivially_evaluable(&right) {
        return None;
    }

    let mut constant = ApiElement::new(name, ApiKind::Constant, module_path)
        .with_line_number(get_start_line(node))
        .with_detail(ElementDetail::Constant {
            value: get_node_text(&right, source).to_string(),
        });
    if let Some(t) = assignment.child_by_field_name("type") {
        constant = constant.with_type_hint("type", collapse_whitespace(get_node_text(&t, source)));
    }
    if deprecation::detect(name, &[], None).is_some() {
        constant = constant.mark_deprecated();
    }
    Some(constant)
}

/// Literals and operator/container expressions built only from literals.
fn is_trivially_evaluable(node: &Node) -> bool {
    match node.kind() {
        "integer" | "float" | "true" | "false" | "none" => true,
        "string" => !has_interpolation(node),
        "concatenated_string" => named_children(node).iter().all(is_trivially_evaluable),
        "unary_operator" => node
            .child_by_field_name("argument")
            .map_or(false, |n| is_trivially_evaluable(&n)),
        "binary_operator" => {
            let left = node.child_by_field_name("left");
            let right = node.child_by_field_name("right");
            match (left, right) {
                (Some(l), Some(r)) => is_trivially_evaluable(&l) && is_trivially_evaluable(&r),
                _ => false,
            }
        }
        "parenthesized_expression" | "tuple" | "list" | "set" => {
            named_children(node).iter().all(is_trivially_evaluable)
        }
        "dictionary" => named_children(node).iter().all(|pair| {
            pair.kind() == "pair"
                && pair
                    .child_by_field_name("key")
                    .map_or(false, |k| is_trivially_evaluable(&k))
                && pair
                    .child_by_field_name("value")
                    .map_or(false, |v| is_trivially_evaluable(&v))
        }),
        _ => false,
    }
}

fn has_interpolation(string: &Node) -> bool {
    find_child_by_type(string, "interpolation").is_some()
}
