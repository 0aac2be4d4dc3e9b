//! Declaration model — the bridge between the external header parser and the
//! layered emitter.
//!
//! The tree is built once by the parser (or loaded from a TOML document, see
//! [`crate::config::load_declarations`]) and never mutated afterwards. Every
//! later stage reads it through [`DeclarationSet`], a flattened, categorized
//! view that leaves the tree itself untouched.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{trace, warn};

use crate::error::GenerateError;

/// A single foreign declaration. Closed set: every consumer matches it
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind")]
pub enum Declaration {
    Function(FunctionDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Typedef(TypedefDecl),
    Namespace(NamespaceDecl),
    Class(ClassDecl),
}

impl Declaration {
    /// The raw source identifier of this declaration.
    pub fn name(&self) -> &str {
        match self {
            Declaration::Function(f) => &f.name,
            Declaration::Struct(s) => &s.name,
            Declaration::Enum(e) => &e.name,
            Declaration::Typedef(t) => &t.name,
            Declaration::Namespace(n) => &n.name,
            Declaration::Class(c) => &c.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Declaration::Function(_) => "function",
            Declaration::Struct(_) => "struct",
            Declaration::Enum(_) => "enum",
            Declaration::Typedef(_) => "typedef",
            Declaration::Namespace(_) => "namespace",
            Declaration::Class(_) => "class",
        }
    }
}

/// A free function or class method.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default = "void_type")]
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<ParamDecl>,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_static: bool,
}

fn void_type() -> String {
    "void".to_string()
}

/// A function parameter. `name` may be empty for unnamed prototypes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParamDecl {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A C struct.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub documentation: Option<String>,
}

/// A struct or class field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A C/C++ enum. Values keep their unsigned 64-bit bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValue>,
    #[serde(default)]
    pub documentation: Option<String>,
}

/// A single enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(deserialize_with = "deserialize_bit_pattern")]
    pub value: u64,
}

/// A typedef.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypedefDecl {
    pub name: String,
    pub underlying_type: String,
    #[serde(default)]
    pub documentation: Option<String>,
}

/// A namespace. Owns its nested declarations exclusively.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamespaceDecl {
    pub name: String,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

/// A C++ class. `methods` must contain only [`Declaration::Function`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<Declaration>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub is_abstract: bool,
}

// ---------------------------------------------------------------------------
// Enum value decoding
// ---------------------------------------------------------------------------

/// TOML integers are signed 64-bit, so large flag values arrive either as a
/// negative integer (two's complement) or as a hex/decimal string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEnumValue {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

fn deserialize_bit_pattern<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match RawEnumValue::deserialize(deserializer)? {
        RawEnumValue::Unsigned(v) => Ok(v),
        RawEnumValue::Signed(v) => Ok(v as u64),
        RawEnumValue::Text(s) => parse_integer_literal(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid enum value `{s}`"))),
    }
}

/// Parse a C integer literal (`0x1F`, `1U`, `0x10UL`, `017`, `-1`) into its
/// unsigned 64-bit bit pattern. Returns `None` if not parseable.
pub fn parse_integer_literal(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(negated) = s.strip_prefix('-') {
        return parse_integer_literal(negated).map(|v| (v as i64).wrapping_neg() as u64);
    }
    let s = s.trim_end_matches(['u', 'U', 'l', 'L']);

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(octal) = s.strip_prefix('0') {
        if octal.is_empty() {
            Some(0)
        } else if octal.chars().all(|c| c.is_ascii_digit()) {
            u64::from_str_radix(octal, 8).ok()
        } else {
            None
        }
    } else {
        s.parse::<u64>().ok()
    }
}

// ---------------------------------------------------------------------------
// Flattened view
// ---------------------------------------------------------------------------

/// A function together with the class that owns it, if any.
#[derive(Debug, Clone, Copy)]
pub struct BoundFunction<'a> {
    pub owner: Option<&'a ClassDecl>,
    pub decl: &'a FunctionDecl,
}

impl BoundFunction<'_> {
    /// The native symbol: free functions keep their name, methods use the
    /// flat C-shim form `Class_method`.
    pub fn symbol(&self) -> String {
        match self.owner {
            Some(class) => format!("{}_{}", class.name, self.decl.name),
            None => self.decl.name.clone(),
        }
    }

    /// Whether the native call takes the instance handle as first argument.
    pub fn takes_self(&self) -> bool {
        self.owner.is_some() && !self.decl.is_static
    }
}

/// All declarations of a tree, bucketed by kind, in depth-first declaration
/// order. Namespaces are flattened away.
#[derive(Debug, Default)]
pub struct DeclarationSet<'a> {
    pub functions: Vec<BoundFunction<'a>>,
    pub structs: Vec<&'a StructDecl>,
    pub enums: Vec<&'a EnumDecl>,
    pub typedefs: Vec<&'a TypedefDecl>,
    pub classes: Vec<&'a ClassDecl>,
}

impl<'a> DeclarationSet<'a> {
    /// Flatten a declaration tree.
    ///
    /// Fails only on a structural invariant violation: a class method that is
    /// not a function.
    pub fn from_tree(declarations: &'a [Declaration]) -> Result<Self, GenerateError> {
        declarations
            .iter()
            .try_fold(DeclarationSet::default(), |acc, decl| {
                Ok(acc.concat(Self::from_declaration(decl)?))
            })
    }

    fn from_declaration(decl: &'a Declaration) -> Result<Self, GenerateError> {
        let set = match decl {
            Declaration::Function(f) => DeclarationSet {
                functions: vec![BoundFunction {
                    owner: None,
                    decl: f,
                }],
                ..Default::default()
            },
            Declaration::Struct(s) => DeclarationSet {
                structs: vec![s],
                ..Default::default()
            },
            Declaration::Enum(e) => DeclarationSet {
                enums: vec![e],
                ..Default::default()
            },
            Declaration::Typedef(t) => DeclarationSet {
                typedefs: vec![t],
                ..Default::default()
            },
            Declaration::Namespace(ns) => Self::from_tree(&ns.declarations)?,
            Declaration::Class(class) => {
                let functions = class
                    .methods
                    .iter()
                    .map(|method| match method {
                        Declaration::Function(f) => Ok(BoundFunction {
                            owner: Some(class),
                            decl: f,
                        }),
                        other => Err(GenerateError::StructuralInvariant {
                            detail: format!(
                                "class `{}` lists {} `{}` as a method",
                                class.name,
                                other.kind(),
                                other.name()
                            ),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                DeclarationSet {
                    functions,
                    classes: vec![class],
                    ..Default::default()
                }
            }
        };
        Ok(set)
    }

    fn concat(mut self, other: Self) -> Self {
        self.functions.extend(other.functions);
        self.structs.extend(other.structs);
        self.enums.extend(other.enums);
        self.typedefs.extend(other.typedefs);
        self.classes.extend(other.classes);
        self
    }

    /// Drop repeated names, keeping the first occurrence.
    ///
    /// Struct, enum, typedef and class names share one type namespace in the
    /// generated module; function symbols share another. Typedefs that merely
    /// re-name a tag of the same name (`typedef struct Foo Foo;`) are dropped
    /// silently.
    pub fn deduplicated(self) -> Self {
        let mut types: HashSet<&'a str> = HashSet::new();
        let mut claim = |name: &'a str, kind: &str| {
            let fresh = types.insert(name);
            if !fresh {
                warn!(name, kind, "dropping duplicate type (first declaration wins)");
            }
            fresh
        };

        let structs: Vec<_> = self
            .structs
            .into_iter()
            .filter(|s| claim(&s.name, "struct"))
            .collect();
        let enums: Vec<_> = self
            .enums
            .into_iter()
            .filter(|e| claim(&e.name, "enum"))
            .collect();
        let classes: Vec<_> = self
            .classes
            .into_iter()
            .filter(|c| claim(&c.name, "class"))
            .collect();
        let typedefs: Vec<_> = self
            .typedefs
            .into_iter()
            .filter(|t| {
                if is_tag_passthrough(t) {
                    trace!(name = %t.name, "skipping tag passthrough typedef");
                    return false;
                }
                claim(&t.name, "typedef")
            })
            .collect();

        let mut symbols = HashSet::new();
        let functions = self
            .functions
            .into_iter()
            .filter(|f| {
                let fresh = symbols.insert(f.symbol());
                if !fresh {
                    warn!(
                        symbol = %f.symbol(),
                        "dropping duplicate function (first declaration wins)"
                    );
                }
                fresh
            })
            .collect();

        DeclarationSet {
            functions,
            structs,
            enums,
            typedefs,
            classes,
        }
    }

    /// Names of every type this set defines.
    pub fn type_names(&self) -> HashSet<&'a str> {
        self.structs
            .iter()
            .map(|s| s.name.as_str())
            .chain(self.enums.iter().map(|e| e.name.as_str()))
            .chain(self.typedefs.iter().map(|t| t.name.as_str()))
            .chain(self.classes.iter().map(|c| c.name.as_str()))
            .collect()
    }

    /// Struct-like types that get marshaling helpers: structs, plus classes
    /// without methods (plain data).
    pub fn plain_data_types(&self) -> Vec<&'a str> {
        self.structs
            .iter()
            .map(|s| s.name.as_str())
            .chain(
                self.classes
                    .iter()
                    .filter(|c| c.methods.is_empty())
                    .map(|c| c.name.as_str()),
            )
            .collect()
    }

    /// Types that get an owning wrapper: structs and non-abstract classes.
    pub fn owned_types(&self) -> Vec<&'a str> {
        self.structs
            .iter()
            .map(|s| s.name.as_str())
            .chain(
                self.classes
                    .iter()
                    .filter(|c| !c.is_abstract)
                    .map(|c| c.name.as_str()),
            )
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.structs.is_empty()
            && self.enums.is_empty()
            && self.typedefs.is_empty()
            && self.classes.is_empty()
    }
}

/// `typedef struct Foo Foo;` and friends.
fn is_tag_passthrough(td: &TypedefDecl) -> bool {
    let underlying = td.underlying_type.trim();
    ["struct ", "enum ", "union ", "class "].iter().any(|prefix| {
        underlying
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.trim() == td.name)
    }) || underlying == td.name
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// How a value crosses the FFI boundary when it is not a plain scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarshalHint {
    /// A native address: opaque handle or typed raw pointer.
    RawPointer,
    /// A NUL-terminated character pointer surfaced as an owned `String`.
    OwnedString,
    /// A fixed-size inline array.
    FixedArray,
}

/// The result of mapping one foreign type string. Never mutated; memoized by
/// `original_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    pub original_name: String,
    /// The type used on the idiomatic side (`String` for owned strings).
    pub target_name: String,
    /// The type used in `repr(C)` layouts and raw extern signatures.
    pub abi_name: String,
    pub is_pointer: bool,
    pub is_const: bool,
    pub is_primitive: bool,
    pub is_array: bool,
    pub array_length: Option<usize>,
    pub marshal_hint: Option<MarshalHint>,
    /// Element mapping for fixed arrays.
    pub element: Option<Box<TypeMapping>>,
}

impl TypeMapping {
    /// `void` in return position.
    pub fn is_void(&self) -> bool {
        self.target_name == "()"
    }

    /// The type as it appears in a raw parameter list: arrays decay to a
    /// pointer to their element.
    pub fn param_abi(&self) -> String {
        match &self.element {
            Some(element) if self.is_array => {
                let qualifier = if self.is_const { "*const" } else { "*mut" };
                format!("{qualifier} {}", element.abi_name)
            }
            _ => self.abi_name.clone(),
        }
    }

    /// Whether passing this value as a parameter hands the callee a raw
    /// address.
    pub fn param_is_raw(&self) -> bool {
        self.is_array || self.marshal_hint == Some(MarshalHint::RawPointer)
    }

    /// A name passed through unchanged, assumed to be declared elsewhere.
    pub fn passthrough_name(&self) -> Option<&str> {
        if let Some(element) = &self.element {
            return element.passthrough_name();
        }
        if self.is_primitive || self.marshal_hint.is_some() || self.is_void() {
            None
        } else {
            Some(&self.target_name)
        }
    }
}

/// Return and parameter types of a synthesized callback, as foreign type
/// strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateSignature {
    pub return_type: String,
    pub parameter_types: Vec<String>,
}

/// A named callback type synthesized from a function-pointer type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateTypeDefinition {
    pub name: String,
    pub signature: DelegateSignature,
    pub documentation: Option<String>,
}

/// Calling convention written into every raw binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallConv {
    /// Platform default (cdecl on most platforms).
    #[default]
    Cdecl,
    /// stdcall (Windows x86).
    Stdcall,
    /// Fastcall.
    Fastcall,
}

impl CallConv {
    /// The ABI string used in `extern "..."`.
    pub fn abi(self) -> &'static str {
        match self {
            CallConv::Cdecl => "C",
            CallConv::Stdcall => "stdcall",
            CallConv::Fastcall => "fastcall",
        }
    }
}

/// Options every section is a pure function of (besides the tree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Governs the generated module name.
    pub namespace: String,
    /// Embedded verbatim into every raw binding's `#[link]` attribute.
    pub library: String,
    pub calling_convention: CallConv,
}

impl GeneratorOptions {
    pub fn new(namespace: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            library: library.into(),
            calling_convention: CallConv::default(),
        }
    }
}

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub file_name: String,
    pub content: String,
    pub order: u32,
}

/// All output sections, sorted by `order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub sections: Vec<Section>,
}

impl GeneratedCode {
    /// Look up a section by file name suffix (e.g. `"types.rs"`).
    pub fn section(&self, file_suffix: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.file_name.ends_with(file_suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literals() {
        assert_eq!(parse_integer_literal("0x1F"), Some(31));
        assert_eq!(parse_integer_literal("0x10UL"), Some(16));
        assert_eq!(parse_integer_literal("017"), Some(15));
        assert_eq!(parse_integer_literal("0"), Some(0));
        assert_eq!(parse_integer_literal("-1"), Some(u64::MAX));
        assert_eq!(
            parse_integer_literal("0xFFFFFFFFFFFFFFFF"),
            Some(u64::MAX)
        );
        assert_eq!(parse_integer_literal("abc"), None);
    }

    #[test]
    fn class_with_non_function_method_is_rejected() {
        let tree = vec![Declaration::Class(ClassDecl {
            name: "Widget".into(),
            methods: vec![Declaration::Enum(EnumDecl {
                name: "Mode".into(),
                values: vec![],
                documentation: None,
            })],
            fields: vec![],
            documentation: None,
            is_abstract: false,
        })];
        let err = DeclarationSet::from_tree(&tree).unwrap_err();
        assert!(err.to_string().contains("Widget"), "{err}");
    }

    #[test]
    fn empty_namespaces_flatten_to_an_empty_set() {
        assert!(DeclarationSet::from_tree(&[]).unwrap().is_empty());

        let tree = vec![Declaration::Namespace(NamespaceDecl {
            name: "outer".into(),
            declarations: vec![Declaration::Namespace(NamespaceDecl {
                name: "inner".into(),
                declarations: vec![],
            })],
        })];
        assert!(DeclarationSet::from_tree(&tree).unwrap().is_empty());

        let tree = vec![Declaration::Namespace(NamespaceDecl {
            name: "outer".into(),
            declarations: vec![Declaration::Typedef(TypedefDecl {
                name: "Id".into(),
                underlying_type: "int".into(),
                documentation: None,
            })],
        })];
        assert!(!DeclarationSet::from_tree(&tree).unwrap().is_empty());
    }

    #[test]
    fn tag_passthrough_typedef_is_dropped() {
        let tree = vec![
            Declaration::Struct(StructDecl {
                name: "Foo".into(),
                fields: vec![],
                documentation: None,
            }),
            Declaration::Typedef(TypedefDecl {
                name: "Foo".into(),
                underlying_type: "struct Foo".into(),
                documentation: None,
            }),
        ];
        let set = DeclarationSet::from_tree(&tree).unwrap().deduplicated();
        assert_eq!(set.structs.len(), 1);
        assert!(set.typedefs.is_empty());
    }
}
