//! Memory/marshaling helper generator.
//!
//! For every plain-data type `T` the section gets one group of functions:
//! `alloc_t`, `free_t`, `t_to_native`, `t_from_native`, `t_array_to_native`
//! and `free_t_array`. Sizes come from the generated `repr(C)` type itself
//! (`Layout::new::<T>()`); field contents are never inspected here.
//!
//! Ownership is documented on each helper, not enforced: a handle returned
//! by a `*_to_native` call belongs to the caller and goes back through the
//! paired `free_*` exactly once; `*_from_native` neither takes nor releases
//! the pointer it reads.

use std::collections::HashSet;
use std::fmt::Write;

use tracing::{debug, warn};

use crate::naming;
use crate::typemap::NATIVE_HANDLE;

/// Private allocation helpers shared by every group.
pub fn render_preamble() -> String {
    format!(
        r#"use ::std::alloc::{{Layout, alloc_zeroed, dealloc, handle_alloc_error}};

use super::types::*;

/// Zero-sized layouts get a dangling, aligned, non-null handle.
fn allocate(layout: Layout) -> {h} {{
    if layout.size() == 0 {{
        return {h}(layout.align());
    }}
    let ptr = unsafe {{ alloc_zeroed(layout) }};
    if ptr.is_null() {{
        handle_alloc_error(layout);
    }}
    {h}::from_ptr(ptr)
}}

/// # Safety
/// `handle` must come from [`allocate`] with the same `layout`.
unsafe fn release(handle: {h}, layout: Layout) {{
    if layout.size() != 0 && !handle.is_null() {{
        unsafe {{ dealloc(handle.as_ptr::<u8>(), layout) }};
    }}
}}
"#,
        h = NATIVE_HANDLE
    )
}

/// The helper group for one type.
pub fn render_helpers(type_name: &str) -> String {
    let ty = naming::ident(type_name, "Unnamed");
    let snake = naming::snake_case(type_name);
    let h = NATIVE_HANDLE;

    let mut out = String::new();
    let _ = writeln!(out, "// ---- {ty} ----");
    let _ = writeln!(out);
    let _ = write!(
        out,
        r#"/// Allocates a zeroed native buffer sized for one [`{ty}`].
///
/// The caller owns the returned handle and releases it with [`free_{snake}`]
/// exactly once.
pub fn alloc_{snake}() -> {h} {{
    allocate(Layout::new::<{ty}>())
}}

/// Releases a buffer obtained from [`alloc_{snake}`] or [`{snake}_to_native`].
///
/// # Safety
/// `handle` must come from one of those functions and must not be used
/// afterwards.
pub unsafe fn free_{snake}(handle: {h}) {{
    unsafe {{ release(handle, Layout::new::<{ty}>()) }}
}}

/// Copies `value` into freshly allocated native memory.
///
/// Ownership of the returned handle passes to the caller, who releases it
/// with [`free_{snake}`] exactly once.
pub fn {snake}_to_native(value: &{ty}) -> {h} {{
    let handle = alloc_{snake}();
    unsafe {{ handle.as_ptr::<{ty}>().write(*value) }};
    handle
}}

/// Copies a [`{ty}`] out of native memory. The pointer is neither taken over
/// nor released.
///
/// # Safety
/// `handle` must point to a valid, aligned `{ty}`.
pub unsafe fn {snake}_from_native(handle: {h}) -> {ty} {{
    unsafe {{ handle.as_ptr::<{ty}>().read() }}
}}

/// Copies `values` into one contiguous native array.
///
/// Ownership of the returned handle passes to the caller, who releases it
/// with [`free_{snake}_array`] passing the same length. Returns
/// [`{h}::NULL`] if the array size overflows.
pub fn {snake}_array_to_native(values: &[{ty}]) -> {h} {{
    let Ok(layout) = Layout::array::<{ty}>(values.len()) else {{
        return {h}::NULL;
    }};
    let handle = allocate(layout);
    unsafe {{
        ::core::ptr::copy_nonoverlapping(values.as_ptr(), handle.as_ptr::<{ty}>(), values.len())
    }};
    handle
}}

/// Releases an array obtained from [`{snake}_array_to_native`].
///
/// # Safety
/// `handle` and `len` must match a previous [`{snake}_array_to_native`] call.
pub unsafe fn free_{snake}_array(handle: {h}, len: usize) {{
    if let Ok(layout) = Layout::array::<{ty}>(len) {{
        unsafe {{ release(handle, layout) }}
    }}
}}
"#
    );
    out
}

/// Render the whole memory section body for `types`, in order, one group
/// per distinct helper name.
pub fn render_section(types: &[&str]) -> String {
    let mut out = render_preamble();
    let mut seen = HashSet::new();
    for name in types {
        let snake = naming::snake_case(name);
        if !seen.insert(snake.clone()) {
            warn!(name, helper = %snake, "marshaling helpers already emitted under this name; skipping");
            continue;
        }
        out.push('\n');
        out.push_str(&render_helpers(name));
        debug!(name, "emitted marshaling helpers");
    }
    out
}
