//! Type mapping engine — foreign type string → [`TypeMapping`].
//!
//! Mapping never fails: anything the tables do not know passes through by
//! name, on the assumption that it refers to a declaration emitted elsewhere
//! in the same run. Pointers to non-primitive types become [`NATIVE_HANDLE`],
//! which is also what breaks self-referential structs (`Node* next`) without
//! any recursive expansion.

use std::collections::HashMap;

use tracing::trace;

use crate::callback;
use crate::model::{MarshalHint, TypeMapping};
use crate::naming;

/// Opaque address-sized handle emitted at the top of the types section.
pub const NATIVE_HANDLE: &str = "NativeHandle";

/// Idiomatic type for NUL-terminated character pointers.
pub const OWNED_STRING: &str = "String";

/// Primitive correspondences, keyed by cleaned C spelling.
const PRIMITIVES: &[(&str, &str)] = &[
    ("void", "()"),
    ("bool", "bool"),
    ("_Bool", "bool"),
    ("char", "::core::ffi::c_char"),
    ("signed char", "i8"),
    ("unsigned char", "u8"),
    ("short", "i16"),
    ("short int", "i16"),
    ("signed short", "i16"),
    ("signed short int", "i16"),
    ("unsigned short", "u16"),
    ("unsigned short int", "u16"),
    ("int", "i32"),
    ("signed", "i32"),
    ("signed int", "i32"),
    ("unsigned", "u32"),
    ("unsigned int", "u32"),
    ("long", "::core::ffi::c_long"),
    ("long int", "::core::ffi::c_long"),
    ("signed long", "::core::ffi::c_long"),
    ("signed long int", "::core::ffi::c_long"),
    ("unsigned long", "::core::ffi::c_ulong"),
    ("unsigned long int", "::core::ffi::c_ulong"),
    ("long long", "i64"),
    ("long long int", "i64"),
    ("signed long long", "i64"),
    ("signed long long int", "i64"),
    ("unsigned long long", "u64"),
    ("unsigned long long int", "u64"),
    ("__int64", "i64"),
    ("unsigned __int64", "u64"),
    ("int8_t", "i8"),
    ("int16_t", "i16"),
    ("int32_t", "i32"),
    ("int64_t", "i64"),
    ("uint8_t", "u8"),
    ("uint16_t", "u16"),
    ("uint32_t", "u32"),
    ("uint64_t", "u64"),
    ("char16_t", "u16"),
    ("char32_t", "u32"),
    ("float", "f32"),
    ("double", "f64"),
    // No stable Rust equivalent; same width as double on the common ABIs.
    ("long double", "f64"),
    ("size_t", "usize"),
    ("ssize_t", "isize"),
    ("ptrdiff_t", "isize"),
    ("intptr_t", "isize"),
    ("uintptr_t", "usize"),
];

/// The two canonical string pointer spellings, keyed by normalized original
/// form. The flag is the constness of the pointee.
const STRING_FORMS: &[(&str, bool)] = &[("char*", false), ("const char*", true)];

const QUALIFIERS: &[&str] = &[
    "volatile",
    "restrict",
    "__restrict",
    "__restrict__",
    "mutable",
];

const TAGS: &[&str] = &["struct", "class", "enum", "union", "typename"];

fn primitive(cleaned: &str) -> Option<&'static str> {
    PRIMITIVES
        .iter()
        .find(|(c, _)| *c == cleaned)
        .map(|(_, rust)| *rust)
}

fn string_form(normalized: &str) -> Option<bool> {
    STRING_FORMS
        .iter()
        .find(|(form, _)| *form == normalized)
        .map(|(_, is_const)| *is_const)
}

/// A type string with decorations separated from the base name.
#[derive(Debug, PartialEq, Eq)]
struct Shape {
    /// Base name with qualifiers, tags and decorations removed.
    cleaned: String,
    /// `const` applies to the pointee (or the value, for non-pointers).
    is_const: bool,
    /// Number of `*` plus one for a C++ reference.
    indirection: usize,
}

impl Shape {
    fn parse(ty: &str) -> Shape {
        let first_decoration = ty.find(['*', '&']).unwrap_or(ty.len());
        let indirection = ty.chars().filter(|c| *c == '*').count()
            + usize::from(ty.contains('&'));

        let mut is_const = false;
        let mut words = Vec::new();
        let mut offset = 0;
        for word in ty.split(|c: char| c.is_whitespace() || c == '*' || c == '&') {
            let start = offset;
            offset += word.len() + 1;
            if word.is_empty() {
                continue;
            }
            if word == "const" {
                if start < first_decoration || indirection == 0 {
                    is_const = true;
                }
                continue;
            }
            if QUALIFIERS.contains(&word) || TAGS.contains(&word) {
                continue;
            }
            words.push(word);
        }

        let joined = words.join(" ");
        // Namespaces are flattened, so qualified names keep their last segment.
        let cleaned = match joined.rsplit_once("::") {
            Some((_, last)) => last.trim().to_string(),
            None => joined,
        };

        Shape {
            cleaned,
            is_const,
            indirection,
        }
    }

    /// Canonical spelling used for the original-form table lookup.
    fn normalized(&self) -> String {
        let constness = if self.is_const { "const " } else { "" };
        format!("{constness}{}{}", self.cleaned, "*".repeat(self.indirection))
    }
}

/// Split `T[2][3]` into `("T", [Some(2), Some(3)])`. Non-numeric or empty
/// extents are `None`.
fn split_array_extents(ty: &str) -> (&str, Vec<Option<usize>>) {
    let Some(open) = ty.find('[') else {
        return (ty, Vec::new());
    };
    let (base, mut rest) = ty.split_at(open);
    let mut extents = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            break;
        };
        extents.push(inner[..close].trim().parse::<usize>().ok());
        rest = inner[close + 1..].trim_start();
    }
    (base.trim_end(), extents)
}

fn render_extents(extents: &[Option<usize>]) -> String {
    extents
        .iter()
        .map(|e| match e {
            Some(n) => format!("[{n}]"),
            None => "[]".to_string(),
        })
        .collect()
}

/// Map a single foreign type string. Pure: the same string always yields the
/// same mapping.
pub fn map_type(ty: &str) -> TypeMapping {
    let original = ty.trim();

    if callback::parse_function_pointer(original).is_some() {
        return opaque_handle(original, false);
    }

    let (base, extents) = split_array_extents(original);
    if let Some((first, rest)) = extents.split_first() {
        let element_str = format!("{base}{}", render_extents(rest));
        return match first {
            Some(len) => fixed_array(original, &element_str, *len),
            // `T[]` decays to `T*`.
            None => TypeMapping {
                original_name: original.to_string(),
                ..map_type(&format!("{element_str}*"))
            },
        };
    }

    let shape = Shape::parse(base);

    if shape.indirection == 1
        && let Some(is_const) = string_form(&shape.normalized())
    {
        return owned_string(original, is_const);
    }

    if let Some(rust) = primitive(&shape.cleaned) {
        return match shape.indirection {
            0 => TypeMapping {
                original_name: original.to_string(),
                target_name: rust.to_string(),
                abi_name: rust.to_string(),
                is_pointer: false,
                is_const: shape.is_const,
                is_primitive: true,
                is_array: false,
                array_length: None,
                marshal_hint: None,
                element: None,
            },
            _ if shape.cleaned == "void" => opaque_handle(original, shape.is_const),
            1 if shape.cleaned == "char" => owned_string(original, shape.is_const),
            depth => typed_pointer(original, rust, shape.is_const, depth),
        };
    }

    if shape.indirection > 0 {
        return opaque_handle(original, shape.is_const);
    }

    if shape.cleaned.is_empty() {
        // Nothing left after stripping qualifiers: treat like `void`.
        return map_type("void");
    }

    let name = naming::ident(&shape.cleaned, "()");
    TypeMapping {
        original_name: original.to_string(),
        target_name: name.clone(),
        abi_name: name,
        is_pointer: false,
        is_const: shape.is_const,
        is_primitive: false,
        is_array: false,
        array_length: None,
        marshal_hint: None,
        element: None,
    }
}

fn opaque_handle(original: &str, is_const: bool) -> TypeMapping {
    TypeMapping {
        original_name: original.to_string(),
        target_name: NATIVE_HANDLE.to_string(),
        abi_name: NATIVE_HANDLE.to_string(),
        is_pointer: true,
        is_const,
        is_primitive: false,
        is_array: false,
        array_length: None,
        marshal_hint: Some(MarshalHint::RawPointer),
        element: None,
    }
}

/// Character pointers. Ownership is a documented contract, not enforced: a
/// returned pointer must be copied before the native side invalidates it, a
/// passed one must stay alive for the duration of the call.
fn owned_string(original: &str, is_const: bool) -> TypeMapping {
    let qualifier = if is_const { "*const" } else { "*mut" };
    TypeMapping {
        original_name: original.to_string(),
        target_name: OWNED_STRING.to_string(),
        abi_name: format!("{qualifier} ::core::ffi::c_char"),
        is_pointer: true,
        is_const,
        is_primitive: false,
        is_array: false,
        array_length: None,
        marshal_hint: Some(MarshalHint::OwnedString),
        element: None,
    }
}

fn typed_pointer(original: &str, pointee: &str, is_const: bool, depth: usize) -> TypeMapping {
    let innermost = if is_const { "*const" } else { "*mut" };
    let mut rendered = format!("{innermost} {pointee}");
    for _ in 1..depth {
        rendered = format!("*mut {rendered}");
    }
    TypeMapping {
        original_name: original.to_string(),
        target_name: rendered.clone(),
        abi_name: rendered,
        is_pointer: true,
        is_const,
        is_primitive: true,
        is_array: false,
        array_length: None,
        marshal_hint: Some(MarshalHint::RawPointer),
        element: None,
    }
}

fn fixed_array(original: &str, element_str: &str, len: usize) -> TypeMapping {
    let element = map_type(element_str);
    TypeMapping {
        original_name: original.to_string(),
        target_name: format!("[{}; {len}]", element.abi_name),
        abi_name: format!("[{}; {len}]", element.abi_name),
        is_pointer: false,
        is_const: element.is_const,
        is_primitive: false,
        is_array: true,
        array_length: Some(len),
        marshal_hint: Some(MarshalHint::FixedArray),
        element: Some(Box::new(element)),
    }
}

/// Memoizing front end for [`map_type`].
///
/// Holds no state besides the cache, so a fresh mapper and a warm one always
/// agree.
#[derive(Debug, Default)]
pub struct TypeMapper {
    cache: HashMap<String, TypeMapping>,
}

impl TypeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&mut self, ty: &str) -> TypeMapping {
        if let Some(hit) = self.cache.get(ty) {
            return hit.clone();
        }
        let mapping = map_type(ty);
        trace!(
            original = ty,
            target = %mapping.target_name,
            hint = ?mapping.marshal_hint,
            "mapped type"
        );
        self.cache.insert(ty.to_string(), mapping.clone());
        mapping
    }

    /// Number of distinct type strings seen so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
