//! Layered emitter — declaration tree → ordered Rust source sections.
//!
//! Section order is fixed so that each file only refers to names defined by
//! earlier ones: types → raw bindings → memory helpers → callback types →
//! wrappers → extensions. Every section except the last is a pure function of
//! (tree, namespace, library, calling convention).

use std::collections::HashSet;
use std::fmt::Write;

use tracing::{debug, info, warn};

use crate::callback::{self, DelegateSet};
use crate::error::GenerateError;
use crate::memory;
use crate::model::*;
use crate::naming;
use crate::typemap::{NATIVE_HANDLE, TypeMapper};

/// Suffix of the destructor-like native function an owning wrapper releases
/// through: `<lowercased type name>_destroy`.
pub const DESTROY_SUFFIX: &str = "_destroy";

/// Prefix of owning wrapper types.
pub const OWNED_PREFIX: &str = "Owned";

/// The six output sections, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Types,
    Bindings,
    Memory,
    Callbacks,
    Wrappers,
    Extensions,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Types,
        SectionKind::Bindings,
        SectionKind::Memory,
        SectionKind::Callbacks,
        SectionKind::Wrappers,
        SectionKind::Extensions,
    ];

    /// File stem, also the module name other sections `use`.
    pub fn stem(self) -> &'static str {
        match self {
            SectionKind::Types => "types",
            SectionKind::Bindings => "bindings",
            SectionKind::Memory => "memory",
            SectionKind::Callbacks => "callbacks",
            SectionKind::Wrappers => "wrappers",
            SectionKind::Extensions => "extensions",
        }
    }

    pub fn order(self) -> u32 {
        self as u32
    }

    fn title(self) -> &'static str {
        match self {
            SectionKind::Types => "Native types",
            SectionKind::Bindings => "Raw FFI bindings",
            SectionKind::Memory => "Marshaling helpers",
            SectionKind::Callbacks => "Callback types",
            SectionKind::Wrappers => "Safe wrappers",
            SectionKind::Extensions => "Extensions",
        }
    }
}

/// Generate every section for a declaration tree.
///
/// Fails only when the tree violates a structural invariant; every other
/// anomaly is logged and degraded.
pub fn generate(
    declarations: &[Declaration],
    options: &GeneratorOptions,
) -> Result<GeneratedCode, GenerateError> {
    let decls = DeclarationSet::from_tree(declarations)?.deduplicated();
    if decls.is_empty() {
        debug!(
            namespace = %options.namespace,
            "empty declaration tree; emitting section scaffolding only"
        );
    }
    let mut mapper = TypeMapper::new();

    let mut delegates = DelegateSet::default();
    callback::collect_delegates(&decls, &mut delegates);
    let delegates = delegates.into_definitions();

    report_unresolved(&decls, &mut mapper);

    let module = naming::module_name(&options.namespace);
    let sections = SectionKind::ALL
        .iter()
        .map(|&kind| {
            let body = match kind {
                SectionKind::Types => emit_types(&decls, &mut mapper),
                SectionKind::Bindings => emit_bindings(&decls, &mut mapper, options),
                SectionKind::Memory => memory::render_section(&decls.plain_data_types()),
                SectionKind::Callbacks => {
                    emit_callbacks(&delegates, &mut mapper, options.calling_convention)
                }
                SectionKind::Wrappers => emit_wrappers(&decls, &mut mapper, options),
                SectionKind::Extensions => {
                    return Section {
                        file_name: format!("{module}/{}.rs", kind.stem()),
                        content: EXTENSIONS.to_string(),
                        order: kind.order(),
                    };
                }
            };
            Section {
                file_name: format!("{module}/{}.rs", kind.stem()),
                content: format!("{}{body}", header(kind, options)),
                order: kind.order(),
            }
        })
        .collect();

    info!(
        namespace = %options.namespace,
        functions = decls.functions.len(),
        structs = decls.structs.len(),
        enums = decls.enums.len(),
        typedefs = decls.typedefs.len(),
        classes = decls.classes.len(),
        callbacks = delegates.len(),
        mapped_types = mapper.cached(),
        "generated sections"
    );

    Ok(GeneratedCode { sections })
}

fn header(kind: SectionKind, options: &GeneratorOptions) -> String {
    format!(
        "//! {} for namespace `{}` (native library `{}`).\n\
         //!\n\
         //! Generated by bnd-layered. Do not edit.\n\
         \n\
         #![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]\n\
         #![allow(dead_code, unused_imports, clippy::all)]\n\
         \n",
        kind.title(),
        options.namespace,
        options.library
    )
}

/// Write `doc` as `///` lines, one per source line.
fn write_doc(out: &mut String, doc: Option<&str>) {
    if let Some(doc) = doc {
        for line in doc.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                let _ = writeln!(out, "///");
            } else {
                let _ = writeln!(out, "/// {line}");
            }
        }
    }
}

/// Warn about pass-through names no declaration in this run defines. They
/// are emitted unchanged regardless.
fn report_unresolved(decls: &DeclarationSet<'_>, mapper: &mut TypeMapper) {
    let known = decls.type_names();
    let mut reported = HashSet::new();
    let mut check = |ty: &str, context: String| {
        let mapping = mapper.map(ty);
        if let Some(name) = mapping.passthrough_name()
            && !known.contains(name)
            && reported.insert(name.to_string())
        {
            warn!(
                name,
                context = %context,
                "type is not declared in this run; passing it through unchanged"
            );
        }
    };

    for f in &decls.functions {
        check(&f.decl.return_type, format!("return type of `{}`", f.symbol()));
        for p in &f.decl.parameters {
            check(&p.ty, format!("param `{}` of `{}`", p.name, f.symbol()));
        }
    }
    for s in &decls.structs {
        for field in &s.fields {
            check(&field.ty, format!("field `{}` of `{}`", field.name, s.name));
        }
    }
    for c in &decls.classes {
        for field in &c.fields {
            check(&field.ty, format!("field `{}` of `{}`", field.name, c.name));
        }
    }
    for td in &decls.typedefs {
        check(&td.underlying_type, format!("typedef `{}`", td.name));
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

const NATIVE_HANDLE_DEF: &str = r#"use ::core::ops::{BitAnd, BitOr, BitOrAssign};

/// Opaque native pointer: an address with no structural access.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub usize);

impl NativeHandle {
    pub const NULL: Self = Self(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr as usize)
    }

    pub fn as_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}
"#;

fn emit_types(decls: &DeclarationSet<'_>, mapper: &mut TypeMapper) -> String {
    let mut out = String::from(NATIVE_HANDLE_DEF);

    for en in &decls.enums {
        out.push('\n');
        emit_enum(&mut out, en);
    }
    for s in &decls.structs {
        out.push('\n');
        emit_record(&mut out, &s.name, &s.fields, s.documentation.as_deref(), mapper);
        debug!(name = %s.name, fields = s.fields.len(), "emitted struct");
    }
    for td in &decls.typedefs {
        out.push('\n');
        emit_typedef(&mut out, td, mapper);
    }
    for c in &decls.classes {
        out.push('\n');
        let mut doc = c.documentation.clone().unwrap_or_default();
        if c.is_abstract {
            if !doc.is_empty() {
                doc.push_str("\n\n");
            }
            doc.push_str("Abstract native class: only reachable through handles.");
        }
        let doc = (!doc.is_empty()).then_some(doc);
        emit_record(&mut out, &c.name, &c.fields, doc.as_deref(), mapper);
        debug!(name = %c.name, fields = c.fields.len(), methods = c.methods.len(), "emitted class");
    }
    out
}

/// Whether a 64-bit enumerator bit pattern fits a C `int`-sized enum: either
/// as an unsigned 32-bit value or as a sign-extended negative `i32`.
fn fits_32_bits(value: u64) -> bool {
    value <= u64::from(u32::MAX) || value >= i32::MIN as i64 as u64
}

/// Enums become a transparent newtype so flag values combine with `|`.
///
/// The storage is `u32` when every value fits in 32 bits, `u64` otherwise.
/// Negative enumerators in a 32-bit enum are stored as their 32-bit two's
/// complement (`-1` becomes `0xFFFF_FFFF`), so the type has the same size as
/// the C enum when embedded in a `repr(C)` struct.
fn emit_enum(out: &mut String, en: &EnumDecl) {
    let name = naming::ident(&en.name, "UnnamedEnum");
    let narrow = en.values.iter().all(|v| fits_32_bits(v.value));
    let repr = if narrow { "u32" } else { "u64" };

    write_doc(out, en.documentation.as_deref());
    let _ = writeln!(out, "#[repr(transparent)]");
    let _ = writeln!(
        out,
        "#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]"
    );
    let _ = writeln!(out, "pub struct {name}(pub {repr});");
    let _ = writeln!(out);
    let _ = writeln!(out, "impl {name} {{");
    let mut seen = HashSet::new();
    for (i, v) in en.values.iter().enumerate() {
        let variant = naming::ident(&v.name, &format!("VALUE_{i}"));
        if !seen.insert(variant.clone()) {
            warn!(enum_name = %en.name, variant = %v.name, "dropping duplicate enum value");
            continue;
        }
        let bits = if narrow {
            u64::from(v.value as u32)
        } else {
            v.value
        };
        let _ = writeln!(out, "    pub const {variant}: Self = Self({bits});");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "    pub const fn bits(self) -> {repr} {{");
    let _ = writeln!(out, "        self.0");
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "}}");
    let _ = write!(
        out,
        r#"
impl BitOr for {name} {{
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {{
        Self(self.0 | rhs.0)
    }}
}}

impl BitAnd for {name} {{
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {{
        Self(self.0 & rhs.0)
    }}
}}

impl BitOrAssign for {name} {{
    fn bitor_assign(&mut self, rhs: Self) {{
        self.0 |= rhs.0;
    }}
}}
"#
    );
    debug!(name = %en.name, values = en.values.len(), repr, "emitted enum");
}

/// A `repr(C)` struct for a struct or class. Fields use their ABI types;
/// pointer fields are documented with the native spelling.
fn emit_record(
    out: &mut String,
    raw_name: &str,
    fields: &[FieldDecl],
    doc: Option<&str>,
    mapper: &mut TypeMapper,
) {
    let name = naming::ident(raw_name, "Unnamed");
    write_doc(out, doc);
    let _ = writeln!(out, "#[repr(C)]");
    let _ = writeln!(out, "#[derive(Debug, Clone, Copy)]");
    let _ = writeln!(out, "pub struct {name} {{");
    for (i, field) in fields.iter().enumerate() {
        let mapping = mapper.map(&field.ty);
        if mapping.is_pointer {
            let _ = writeln!(out, "    /// Native type `{}`.", mapping.original_name);
        }
        let field_name = naming::ident(&field.name, &format!("field{i}"));
        let _ = writeln!(out, "    pub {field_name}: {},", mapping.abi_name);
    }
    let _ = writeln!(out, "}}");
}

fn emit_typedef(out: &mut String, td: &TypedefDecl, mapper: &mut TypeMapper) {
    let mapping = mapper.map(&td.underlying_type);
    let name = naming::ident(&td.name, "Unnamed");
    write_doc(out, td.documentation.as_deref());
    if callback::parse_function_pointer(&td.underlying_type).is_some() {
        let _ = writeln!(
            out,
            "/// Native function pointer `{}`; see [`super::callbacks::{}`].",
            mapping.original_name,
            callback::delegate_name(&td.name, "")
        );
    }
    let _ = writeln!(out, "pub type {name} = {};", mapping.abi_name);
    debug!(name = %td.name, target = %mapping.abi_name, "emitted typedef");
}

// ---------------------------------------------------------------------------
// Raw bindings
// ---------------------------------------------------------------------------

/// Native parameter list `(name, abi type)` for a function, including the
/// leading instance handle of non-static methods.
fn raw_params(f: &BoundFunction<'_>, mapper: &mut TypeMapper) -> Vec<(String, TypeMapping)> {
    let mut params = Vec::new();
    if f.takes_self() {
        params.push(("self_".to_string(), mapper.map("void*")));
    }
    for (i, p) in f.decl.parameters.iter().enumerate() {
        params.push((naming::ident(&p.name, &format!("arg{i}")), mapper.map(&p.ty)));
    }
    params
}

fn return_suffix(ret: &TypeMapping) -> String {
    if ret.is_void() {
        String::new()
    } else {
        format!(" -> {}", ret.abi_name)
    }
}

fn emit_bindings(
    decls: &DeclarationSet<'_>,
    mapper: &mut TypeMapper,
    options: &GeneratorOptions,
) -> String {
    let mut out = String::from("use super::types::*;\n");

    for f in &decls.functions {
        out.push('\n');
        let params = raw_params(f, mapper);
        let ret = mapper.map(&f.decl.return_type);

        let mut doc = String::new();
        write_doc(&mut doc, f.decl.documentation.as_deref());
        if f.decl.documentation.is_some() {
            let _ = writeln!(doc, "///");
        }
        let _ = writeln!(doc, "/// Native signature: `{}`.", native_signature(f));
        if let Some(class) = f.owner {
            let qualifiers = match (f.decl.is_static, f.decl.is_virtual) {
                (true, _) => " (static)",
                (false, true) => " (virtual)",
                (false, false) => "",
            };
            let _ = writeln!(
                doc,
                "/// Method `{}::{}`{qualifiers}.",
                class.name, f.decl.name
            );
        }
        write_string_contract(&mut doc, f, mapper);

        let symbol = naming::ident(&f.symbol(), "unnamed");
        let rendered: Vec<String> = params
            .iter()
            .map(|(name, ty)| format!("{name}: {}", ty.param_abi()))
            .collect();
        let _ = writeln!(out, "#[link(name = \"{}\")]", options.library);
        let _ = writeln!(
            out,
            "unsafe extern \"{}\" {{",
            options.calling_convention.abi()
        );
        // Docs go on the item; on the block rustc drops them.
        for line in doc.lines() {
            let _ = writeln!(out, "    {line}");
        }
        let _ = writeln!(
            out,
            "    pub fn {symbol}({}){};",
            rendered.join(", "),
            return_suffix(&ret)
        );
        let _ = writeln!(out, "}}");
        debug!(symbol = %symbol, params = params.len(), "emitted binding");
    }
    out
}

/// `int add(int a, int b)` — the declaration as the parser handed it over.
fn native_signature(f: &BoundFunction<'_>) -> String {
    let params: Vec<String> = f
        .decl
        .parameters
        .iter()
        .map(|p| {
            if p.name.is_empty() {
                p.ty.clone()
            } else {
                format!("{} {}", p.ty, p.name)
            }
        })
        .collect();
    format!(
        "{} {}({})",
        f.decl.return_type.trim(),
        f.decl.name,
        params.join(", ")
    )
}

/// Document the ownership contract of every character-pointer crossing.
fn write_string_contract(out: &mut String, f: &BoundFunction<'_>, mapper: &mut TypeMapper) {
    let mut lines = Vec::new();
    for (i, p) in f.decl.parameters.iter().enumerate() {
        let mapping = mapper.map(&p.ty);
        if mapping.marshal_hint != Some(MarshalHint::OwnedString) {
            continue;
        }
        let name = naming::ident(&p.name, &format!("arg{i}"));
        if mapping.is_const {
            lines.push(format!(
                "`{name}` must stay alive and NUL-terminated for the duration of the call."
            ));
        } else {
            lines.push(format!(
                "`{name}` may be written by the callee; the buffer must stay valid for the \
                 duration of the call."
            ));
        }
    }
    if mapper.map(&f.decl.return_type).marshal_hint == Some(MarshalHint::OwnedString) {
        lines.push(
            "The returned string belongs to the native side; copy it before the native side \
             invalidates it."
                .to_string(),
        );
    }
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "///");
    let _ = writeln!(out, "/// # Ownership");
    for line in lines {
        let _ = writeln!(out, "/// {line}");
    }
}

// ---------------------------------------------------------------------------
// Callback types
// ---------------------------------------------------------------------------

fn emit_callbacks(
    delegates: &[DelegateTypeDefinition],
    mapper: &mut TypeMapper,
    conv: CallConv,
) -> String {
    let mut out = String::from("use super::types::*;\n");
    for def in delegates {
        out.push('\n');
        out.push_str(&callback::render_type(def, mapper, conv));
        out.push('\n');
        out.push_str(&callback::render_wrap(def));
        out.push('\n');
        out.push_str(&callback::render_unwrap(def));
        debug!(name = %def.name, "emitted callback type");
    }
    out
}

// ---------------------------------------------------------------------------
// Wrappers
// ---------------------------------------------------------------------------

const WRAPPER_PREAMBLE: &str = r#"use ::std::ffi::{CStr, CString};

use super::bindings;
use super::types::*;

/// Copies `value` into a NUL-terminated buffer, truncating at the first
/// interior NUL.
fn to_native_string(value: &str) -> CString {
    let end = value.find('\0').unwrap_or(value.len());
    CString::new(&value[..end]).unwrap_or_default()
}

/// Copies a native string into an owned `String`; null becomes empty.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated buffer.
unsafe fn from_native_string(ptr: *const ::core::ffi::c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}
"#;

fn emit_wrappers(
    decls: &DeclarationSet<'_>,
    mapper: &mut TypeMapper,
    options: &GeneratorOptions,
) -> String {
    let mut out = String::from(WRAPPER_PREAMBLE);

    for f in &decls.functions {
        out.push('\n');
        emit_call_through(&mut out, f, mapper);
    }

    let symbols: HashSet<String> = decls.functions.iter().map(|f| f.symbol()).collect();
    let mut local_externs = HashSet::new();
    for name in decls.owned_types() {
        out.push('\n');
        emit_owned_type(&mut out, name, &symbols, &mut local_externs, options);
    }
    out
}

/// A call-through with the binding's name. `const char*` parameters and
/// string returns are marshaled; anything that still exposes a raw address
/// (including a mutable `char*` buffer) makes the wrapper `unsafe`.
fn emit_call_through(out: &mut String, f: &BoundFunction<'_>, mapper: &mut TypeMapper) {
    let params = raw_params(f, mapper);
    let ret = mapper.map(&f.decl.return_type);
    let symbol = naming::ident(&f.symbol(), "unnamed");

    let mut signature = Vec::new();
    let mut setup = Vec::new();
    let mut args = Vec::new();
    let mut is_unsafe = false;
    for (name, ty) in &params {
        match ty.marshal_hint {
            // Only read-only strings are copied; a mutable `char*` may be
            // written by the callee and stays a raw pointer.
            Some(MarshalHint::OwnedString) if ty.is_const => {
                signature.push(format!("{name}: &str"));
                setup.push(format!("let {name} = to_native_string({name});"));
                args.push(format!("{name}.as_ptr()"));
            }
            Some(MarshalHint::OwnedString) => {
                is_unsafe = true;
                signature.push(format!("{name}: {}", ty.param_abi()));
                args.push(name.clone());
            }
            _ => {
                is_unsafe |= ty.param_is_raw();
                signature.push(format!("{name}: {}", ty.param_abi()));
                args.push(name.clone());
            }
        }
    }
    let returns_string = ret.marshal_hint == Some(MarshalHint::OwnedString);
    let ret_suffix = if returns_string {
        " -> String".to_string()
    } else {
        return_suffix(&ret)
    };

    write_doc(out, f.decl.documentation.as_deref());
    if f.decl.documentation.is_none() {
        let _ = writeln!(out, "/// Calls [`bindings::{symbol}`].");
    }
    if is_unsafe {
        let _ = writeln!(out, "///");
        let _ = writeln!(out, "/// # Safety");
        let _ = writeln!(
            out,
            "/// Pointer and handle arguments must satisfy the native function's contract."
        );
    }
    let unsafety = if is_unsafe { "unsafe " } else { "" };
    let _ = writeln!(
        out,
        "pub {unsafety}fn {symbol}({}){ret_suffix} {{",
        signature.join(", ")
    );
    for line in &setup {
        let _ = writeln!(out, "    {line}");
    }
    let call = format!("bindings::{symbol}({})", args.join(", "));
    if returns_string {
        let _ = writeln!(out, "    unsafe {{ from_native_string({call}) }}");
    } else {
        let _ = writeln!(out, "    unsafe {{ {call} }}");
    }
    let _ = writeln!(out, "}}");
    debug!(symbol = %symbol, is_unsafe, "emitted wrapper");
}

/// The destructor-like native function an owning wrapper releases through.
pub fn destroy_symbol(type_name: &str) -> String {
    format!("{}{DESTROY_SUFFIX}", type_name.to_lowercase())
}

/// `Owned<Name>`: holds a native handle and releases it on drop.
fn emit_owned_type(
    out: &mut String,
    raw_name: &str,
    declared: &HashSet<String>,
    local_externs: &mut HashSet<String>,
    options: &GeneratorOptions,
) {
    let name = naming::ident(raw_name, "Unnamed");
    let owned = format!("{OWNED_PREFIX}{}", name.trim_start_matches("r#"));
    let destroy = destroy_symbol(raw_name);
    let destroy_ident = naming::ident(&destroy, "destroy");
    let h = NATIVE_HANDLE;

    // Reuse the raw binding when the tree declares the destructor itself.
    let release_call = if declared.contains(&destroy) {
        format!("bindings::{destroy_ident}")
    } else if !local_externs.insert(destroy.clone()) {
        destroy_ident.clone()
    } else {
        let _ = writeln!(out, "#[link(name = \"{}\")]", options.library);
        let _ = writeln!(
            out,
            "unsafe extern \"{}\" {{",
            options.calling_convention.abi()
        );
        let _ = writeln!(out, "    fn {destroy_ident}(handle: {h});");
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);
        destroy_ident.clone()
    };

    let _ = write!(
        out,
        r#"/// Owning handle to a native [`{name}`], released through `{destroy}`.
#[derive(Debug)]
pub struct {owned} {{
    raw: {h},
}}

impl {owned} {{
    /// Takes ownership of `raw`.
    ///
    /// # Safety
    /// `raw` must be null or a live native `{raw_name}` that nothing else
    /// releases.
    pub unsafe fn from_raw(raw: {h}) -> Self {{
        Self {{ raw }}
    }}

    pub fn as_raw(&self) -> {h} {{
        self.raw
    }}

    /// Gives up ownership without releasing.
    pub fn into_raw(self) -> {h} {{
        let raw = self.raw;
        ::core::mem::forget(self);
        raw
    }}

    /// Releases the native object now. Idempotent.
    pub fn release(&mut self) {{
        if !self.raw.is_null() {{
            unsafe {{ {release_call}(self.raw) }};
            self.raw = {h}::NULL;
        }}
    }}
}}

impl Drop for {owned} {{
    fn drop(&mut self) {{
        self.release();
    }}
}}
"#
    );
    debug!(name = raw_name, owned = %owned, destroy = %destroy, "emitted owning wrapper");
}

// ---------------------------------------------------------------------------
// Extensions
// ---------------------------------------------------------------------------

/// Static starting point for hand-written helpers; independent of the tree.
pub const EXTENSIONS: &str = r#"//! Hand-written convenience helpers.
//!
//! Generated once as a starting point; nothing here is derived from the
//! declaration tree.

#![allow(dead_code)]

use super::types::NativeHandle;

/// `None` for a null handle.
pub fn non_null(handle: NativeHandle) -> Option<NativeHandle> {
    if handle.is_null() { None } else { Some(handle) }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_width_accounts_for_sign_extension() {
        assert!(fits_32_bits(0));
        assert!(fits_32_bits(u64::from(u32::MAX)));
        assert!(fits_32_bits(-1i64 as u64));
        assert!(fits_32_bits(i64::from(i32::MIN) as u64));
        assert!(!fits_32_bits(i64::from(i32::MIN) as u64 - 1));
        assert!(!fits_32_bits(1 << 32));
    }
}
