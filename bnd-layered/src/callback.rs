//! Callback signature synthesizer.
//!
//! Finds function-pointer-shaped type strings (`ret (*)(a, b)`) in function
//! signatures, struct/class fields and typedefs, and turns each into a named
//! [`DelegateTypeDefinition`]. Names are derived from the owning declaration
//! and member, so the same occurrence always gets the same name.

use std::collections::HashMap;
use std::fmt::Write;

use tracing::{debug, warn};

use crate::error::GenerateError;
use crate::model::{
    CallConv, Declaration, DeclarationSet, DelegateSignature, DelegateTypeDefinition, FieldDecl,
};
use crate::naming;
use crate::typemap::{NATIVE_HANDLE, TypeMapper};

/// Suffix appended to every synthesized callback name.
pub const CALLBACK_SUFFIX: &str = "Callback";

/// The pieces of a `ret (*)(params)` type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionPointerShape<'a> {
    pub return_type: &'a str,
    pub parameter_types: Vec<&'a str>,
}

/// Locate the `(*)` marker, tolerating whitespace inside the parentheses.
/// Returns the byte range of the whole marker.
fn find_pointer_marker(ty: &str) -> Option<(usize, usize)> {
    let bytes = ty.as_bytes();
    let mut search = 0;
    while let Some(rel) = ty[search..].find('(') {
        let open = search + rel;
        let mut i = open + 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'*' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b')' {
                return Some((open, i + 1));
            }
        }
        search = open + 1;
    }
    None
}

/// Match a type string against the function-pointer shape.
///
/// Pattern-based, not a grammar: nested parentheses (function pointers
/// taking function pointers), a missing return type or an empty parameter
/// slot all mean "not a function pointer".
pub fn parse_function_pointer(ty: &str) -> Option<FunctionPointerShape<'_>> {
    let ty = ty.trim();
    let (start, end) = find_pointer_marker(ty)?;

    let return_type = ty[..start].trim();
    if return_type.is_empty() || return_type.contains(['(', ')']) {
        return None;
    }

    let params = ty[end..].trim().strip_prefix('(')?.strip_suffix(')')?;
    if params.contains(['(', ')']) {
        return None;
    }

    let params = params.trim();
    let parameter_types = if params.is_empty() || params == "void" {
        Vec::new()
    } else {
        let parts: Vec<&str> = params.split(',').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        parts
    };

    Some(FunctionPointerShape {
        return_type,
        parameter_types,
    })
}

/// Deduplication table threaded through one synthesis run.
///
/// Merges by name only: a second occurrence with a different signature is
/// dropped with a warning, not disambiguated.
#[derive(Debug, Default)]
pub struct DelegateSet {
    index: HashMap<String, usize>,
    definitions: Vec<DelegateTypeDefinition>,
}

impl DelegateSet {
    /// Add a definition unless one with the same name exists. Returns whether
    /// it was added.
    pub fn insert(&mut self, def: DelegateTypeDefinition) -> bool {
        if let Some(&existing) = self.index.get(&def.name) {
            let kept = &self.definitions[existing];
            if kept.signature != def.signature {
                warn!(
                    name = %def.name,
                    kept = ?kept.signature,
                    dropped = ?def.signature,
                    "callback name collision with a different signature; keeping the first"
                );
            }
            return false;
        }
        self.index.insert(def.name.clone(), self.definitions.len());
        self.definitions.push(def);
        true
    }

    pub fn into_definitions(self) -> Vec<DelegateTypeDefinition> {
        self.definitions
    }
}

/// Synthesized name for a member of `owner`. An empty member names the
/// owner's return-type callback.
pub fn delegate_name(owner: &str, member: &str) -> String {
    format!(
        "{}{}{CALLBACK_SUFFIX}",
        naming::upper_camel_case(owner),
        naming::upper_camel_case(member)
    )
}

/// Record `ty` under `name` if it is function-pointer shaped.
fn consider(set: &mut DelegateSet, ty: &str, name: String, context: String) {
    let Some(shape) = parse_function_pointer(ty) else {
        if ty.contains("(*") || ty.contains("( *") {
            debug!(ty, context = %context, "function-pointer-like type did not match; skipped");
        }
        return;
    };
    let def = DelegateTypeDefinition {
        name,
        signature: DelegateSignature {
            return_type: shape.return_type.to_string(),
            parameter_types: shape
                .parameter_types
                .iter()
                .map(|p| p.to_string())
                .collect(),
        },
        documentation: Some(format!("Native callback `{}` used by {context}.", ty.trim())),
    };
    if set.insert(def) {
        debug!(ty, context = %context, "synthesized callback type");
    }
}

fn consider_fields(set: &mut DelegateSet, owner: &str, kind: &str, fields: &[FieldDecl]) {
    for field in fields {
        consider(
            set,
            &field.ty,
            delegate_name(owner, &field.name),
            format!("field `{}` of {kind} `{owner}`", field.name),
        );
    }
}

/// Scan a flattened declaration set in declaration order, threading `set`.
pub fn collect_delegates(decls: &DeclarationSet<'_>, set: &mut DelegateSet) {
    for f in &decls.functions {
        let owner = match f.owner {
            Some(class) => format!("{}_{}", class.name, f.decl.name),
            None => f.decl.name.clone(),
        };
        consider(
            set,
            &f.decl.return_type,
            delegate_name(&owner, ""),
            format!("the return type of `{}`", f.symbol()),
        );
        for (i, p) in f.decl.parameters.iter().enumerate() {
            let member = if p.name.is_empty() {
                format!("arg{i}")
            } else {
                p.name.clone()
            };
            consider(
                set,
                &p.ty,
                delegate_name(&owner, &member),
                format!("parameter `{member}` of `{}`", f.symbol()),
            );
        }
    }
    for s in &decls.structs {
        consider_fields(set, &s.name, "struct", &s.fields);
    }
    for c in &decls.classes {
        consider_fields(set, &c.name, "class", &c.fields);
    }
    for td in &decls.typedefs {
        consider(
            set,
            &td.underlying_type,
            delegate_name(&td.name, ""),
            format!("typedef `{}`", td.name),
        );
    }
}

/// Synthesize the deduplicated callback list for a whole tree.
pub fn synthesize(
    declarations: &[Declaration],
) -> Result<Vec<DelegateTypeDefinition>, GenerateError> {
    let decls = DeclarationSet::from_tree(declarations)?.deduplicated();
    let mut set = DelegateSet::default();
    collect_delegates(&decls, &mut set);
    Ok(set.into_definitions())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn wrap_fn_name(def: &DelegateTypeDefinition) -> String {
    format!("wrap_{}", naming::snake_case(&def.name))
}

fn unwrap_fn_name(def: &DelegateTypeDefinition) -> String {
    format!("unwrap_{}", naming::snake_case(&def.name))
}

/// `pub type Name = unsafe extern "C" fn(..) -> ..;`
pub fn render_type(
    def: &DelegateTypeDefinition,
    mapper: &mut TypeMapper,
    conv: CallConv,
) -> String {
    let params: Vec<String> = def
        .signature
        .parameter_types
        .iter()
        .map(|p| mapper.map(p).param_abi())
        .collect();
    let ret = mapper.map(&def.signature.return_type);
    let ret = if ret.is_void() {
        String::new()
    } else {
        format!(" -> {}", ret.abi_name)
    };

    let mut out = String::new();
    if let Some(doc) = &def.documentation {
        for line in doc.lines() {
            let _ = writeln!(out, "/// {line}");
        }
    }
    let _ = writeln!(
        out,
        "pub type {} = unsafe extern \"{}\" fn({}){ret};",
        naming::ident(&def.name, "Callback"),
        conv.abi(),
        params.join(", ")
    );
    out
}

/// Callable value → native function pointer.
pub fn render_wrap(def: &DelegateTypeDefinition) -> String {
    let ty = naming::ident(&def.name, "Callback");
    let mut out = String::new();
    let _ = writeln!(
        out,
        "/// Turns a [`{ty}`] into the function pointer handle the native side expects."
    );
    let _ = writeln!(
        out,
        "pub fn {}(callback: {ty}) -> {NATIVE_HANDLE} {{",
        wrap_fn_name(def)
    );
    let _ = writeln!(out, "    {NATIVE_HANDLE}(callback as *const () as usize)");
    let _ = writeln!(out, "}}");
    out
}

/// Native function pointer → callable value.
pub fn render_unwrap(def: &DelegateTypeDefinition) -> String {
    let ty = naming::ident(&def.name, "Callback");
    let mut out = String::new();
    let _ = writeln!(
        out,
        "/// Recovers a [`{ty}`] from a native function pointer; `None` for null."
    );
    let _ = writeln!(out, "///");
    let _ = writeln!(out, "/// # Safety");
    let _ = writeln!(
        out,
        "/// `handle` must be null or a function pointer with exactly this signature."
    );
    let _ = writeln!(
        out,
        "pub unsafe fn {}(handle: {NATIVE_HANDLE}) -> Option<{ty}> {{",
        unwrap_fn_name(def)
    );
    let _ = writeln!(out, "    if handle.is_null() {{");
    let _ = writeln!(out, "        None");
    let _ = writeln!(out, "    }} else {{");
    let _ = writeln!(
        out,
        "        Some(unsafe {{ ::core::mem::transmute::<usize, {ty}>(handle.0) }})"
    );
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "}}");
    out
}
