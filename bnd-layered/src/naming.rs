//! Identifier helpers shared by every emitter.

/// Rust keywords that cannot be used as bare identifiers.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that are not accepted as raw identifiers either.
const RESERVED: &[&str] = &["self", "Self", "crate", "super", "_"];

/// Turn a raw C identifier into a valid Rust identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, a leading digit gets a `_`
/// prefix, keywords become raw identifiers and `self`-like words get a
/// trailing `_`. `fallback` is used for empty names.
pub fn ident(raw: &str, fallback: &str) -> String {
    let mut out: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        return fallback.to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if RESERVED.contains(&out.as_str()) {
        out.push('_');
    } else if KEYWORDS.contains(&out.as_str()) {
        out.insert_str(0, "r#");
    }
    out
}

/// `MyStruct` → `my_struct`, `HTTPServer` → `http_server`.
pub fn snake_case(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower);
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// `on_click` → `OnClick`, `qsort` → `Qsort`. Inner capitals are kept.
pub fn upper_camel_case(raw: &str) -> String {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Module name for a namespace option: `MyLib.Native` → `my_lib_native`.
pub fn module_name(namespace: &str) -> String {
    let snake = snake_case(&namespace.replace("::", "_"));
    ident(&snake, "bindings")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idents() {
        assert_eq!(ident("value", "x"), "value");
        assert_eq!(ident("type", "x"), "r#type");
        assert_eq!(ident("self", "x"), "self_");
        assert_eq!(ident("", "arg0"), "arg0");
        assert_eq!(ident("2d", "x"), "_2d");
        assert_eq!(ident("a-b", "x"), "a_b");
    }

    #[test]
    fn case_conversion() {
        assert_eq!(snake_case("MyStruct"), "my_struct");
        assert_eq!(snake_case("HTTPServer"), "http_server");
        assert_eq!(snake_case("node"), "node");
        assert_eq!(snake_case("Node_t"), "node_t");
        assert_eq!(upper_camel_case("on_click"), "OnClick");
        assert_eq!(upper_camel_case("qsort"), "Qsort");
        assert_eq!(upper_camel_case("MyStruct"), "MyStruct");
        assert_eq!(module_name("MyLib.Native"), "my_lib_native");
        assert_eq!(module_name("NS"), "ns");
        assert_eq!(module_name(""), "bindings");
    }
}
