//! Integration test: load the widgets fixture config → generate every section
//! → check the emitted Rust source.

use std::path::Path;
use std::sync::LazyLock;

use bnd_layered::GeneratedCode;

static WIDGETS: LazyLock<GeneratedCode> = LazyLock::new(|| {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let cfg = bnd_layered::config::load_config(&fixtures.join("widgets.toml"))
        .expect("load widgets config");
    bnd_layered::generate_from_config(&cfg, &fixtures).expect("generate widgets bindings")
});

fn section(suffix: &str) -> &'static str {
    &WIDGETS
        .section(suffix)
        .unwrap_or_else(|| panic!("{suffix} section missing"))
        .content
}

#[test]
fn six_sections_in_order() {
    let names: Vec<&str> = WIDGETS
        .sections
        .iter()
        .map(|s| s.file_name.as_str())
        .collect();
    assert_eq!(
        names,
        [
            "widgets_native/types.rs",
            "widgets_native/bindings.rs",
            "widgets_native/memory.rs",
            "widgets_native/callbacks.rs",
            "widgets_native/wrappers.rs",
            "widgets_native/extensions.rs",
        ]
    );
    let orders: Vec<u32> = WIDGETS.sections.iter().map(|s| s.order).collect();
    assert_eq!(orders, [0, 1, 2, 3, 4, 5]);
}

#[test]
fn headers_name_namespace_and_library() {
    for suffix in ["types.rs", "bindings.rs", "memory.rs", "callbacks.rs", "wrappers.rs"] {
        let content = section(suffix);
        assert!(
            content.contains("for namespace `Widgets.Native` (native library `widgets`)"),
            "{suffix} header missing: {content}"
        );
    }
}

#[test]
fn types_from_nested_namespace_are_flattened() {
    let types = section("types.rs");
    assert!(types.contains("pub struct NativeHandle(pub usize);"));
    assert!(types.contains("pub struct Point {"), "{types}");
    assert!(types.contains("    pub x: i32,"));
    assert!(types.contains("/// Singly linked list node."));
    assert!(types.contains("pub struct Node {"));
    assert!(types.contains("    pub next: NativeHandle,"));
    assert!(types.contains("    pub value: f64,"));
}

#[test]
fn struct_fields_use_abi_types() {
    let types = section("types.rs");
    assert!(types.contains("pub struct Widget {"));
    assert!(types.contains("    pub id: u32,"));
    assert!(types.contains("    pub flags: Flags,"));
    assert!(types.contains("    pub on_click: NativeHandle,"));
    assert!(types.contains("    pub name: [::core::ffi::c_char; 16],"));
}

#[test]
fn tag_passthrough_typedef_is_not_emitted() {
    let types = section("types.rs");
    assert!(!types.contains("pub type Widget ="), "{types}");
    assert_eq!(types.matches("pub struct Widget {").count(), 1);
}

#[test]
fn enums_keep_exact_values() {
    let types = section("types.rs");
    assert!(types.contains("pub struct Flags(pub u32);"));
    assert!(types.contains("pub const A: Self = Self(1);"));
    assert!(types.contains("pub const B: Self = Self(2);"));
    assert!(types.contains("pub const C: Self = Self(4);"));
    assert!(types.contains("impl BitOr for Flags {"));

    assert!(types.contains("pub struct Wide(pub u64);"));
    assert!(types.contains("pub const Top: Self = Self(9223372036854775808);"));
    assert!(types.contains("pub const All: Self = Self(18446744073709551615);"));
}

#[test]
fn function_pointer_typedef_points_at_callback() {
    let types = section("types.rs");
    assert!(types.contains("pub type LogFn = NativeHandle;"), "{types}");
    assert!(types.contains("super::callbacks::LogFnCallback"));
}

#[test]
fn bindings_link_every_function() {
    let bindings = section("bindings.rs");
    assert!(bindings.contains("#[link(name = \"widgets\")]"));
    assert!(bindings.contains("unsafe extern \"C\" {"));
    assert!(bindings.contains("/// Adds two integers."));
    assert!(bindings.contains("/// Native signature: `int add(int a, int b)`."));
    assert!(bindings.contains("    pub fn add(a: i32, b: i32) -> i32;"));
    assert!(bindings.contains("    pub fn widget_version() -> *const ::core::ffi::c_char;"));
    assert!(bindings.contains(
        "    pub fn sort_items(items: *mut i32, count: usize, compar: NativeHandle);"
    ));
    assert_eq!(
        bindings.matches("#[link(name = \"widgets\")]").count(),
        bindings.matches("    pub fn ").count()
    );
}

#[test]
fn binding_docs_attach_to_the_function() {
    let bindings = section("bindings.rs");
    assert!(
        bindings.contains(
            "unsafe extern \"C\" {\n    /// Adds two integers.\n    ///\n    /// Native signature: `int add(int a, int b)`.\n    pub fn add("
        ),
        "{bindings}"
    );
    for (i, line) in bindings.lines().enumerate() {
        if line.starts_with("unsafe extern") {
            let previous = bindings.lines().nth(i - 1).unwrap_or_default();
            assert!(!previous.starts_with("///"), "doc before extern block: {previous}");
        }
    }
}

#[test]
fn class_methods_become_flat_symbols() {
    let bindings = section("bindings.rs");
    assert!(bindings.contains("/// Method `Canvas::draw` (virtual)."));
    assert!(bindings.contains("    pub fn Canvas_draw(self_: NativeHandle, at: Point) -> bool;"));
    assert!(bindings.contains("/// Method `Canvas::create` (static)."));
    assert!(bindings.contains("    pub fn Canvas_create() -> NativeHandle;"));
}

#[test]
fn string_crossings_document_ownership() {
    let bindings = section("bindings.rs");
    assert!(bindings.contains("/// # Ownership"));
    assert!(bindings.contains("`title` must stay alive and NUL-terminated"));
    assert!(bindings.contains("The returned string belongs to the native side"));
}

#[test]
fn negative_enumerators_keep_c_int_width() {
    let types = section("types.rs");
    assert!(types.contains("pub struct Status(pub u32);"), "{types}");
    assert!(types.contains("pub const OK: Self = Self(0);"));
    assert!(types.contains("pub const ERR: Self = Self(4294967295);"));
    assert!(types.contains("pub struct Reply {\n    pub status: Status,\n    pub code: i32,\n}"));
}

#[test]
fn memory_helpers_for_plain_data() {
    let memory = section("memory.rs");
    for ty in ["point", "node", "widget"] {
        assert_eq!(
            memory.matches(&format!("pub fn alloc_{ty}()")).count(),
            1,
            "{ty}: {memory}"
        );
        assert!(memory.contains(&format!("pub unsafe fn free_{ty}(")));
        assert!(memory.contains(&format!("pub fn {ty}_to_native(")));
        assert!(memory.contains(&format!("pub unsafe fn {ty}_from_native(")));
    }
    // Classes with methods are reached through handles only.
    assert!(!memory.contains("alloc_canvas"));
}

/// Callbacks are collected per bucket: function signatures first, then
/// struct and class fields, then typedefs; declaration order within each.
#[test]
fn callbacks_follow_bucket_order() {
    let callbacks = section("callbacks.rs");
    let order: Vec<usize> = [
        "pub type SortItemsComparCallback =",
        "pub type WidgetOnClickCallback =",
        "pub type LogFnCallback =",
    ]
    .iter()
    .map(|needle| {
        callbacks
            .find(needle)
            .unwrap_or_else(|| panic!("{needle} missing: {callbacks}"))
    })
    .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{order:?}");

    assert!(callbacks.contains(
        "pub type SortItemsComparCallback = unsafe extern \"C\" fn(NativeHandle, NativeHandle) -> i32;"
    ));
    assert!(callbacks.contains(
        "pub type LogFnCallback = unsafe extern \"C\" fn(i32, *const ::core::ffi::c_char);"
    ));
    assert!(callbacks.contains("pub fn wrap_log_fn_callback(callback: LogFnCallback) -> NativeHandle"));
    assert!(callbacks.contains(
        "pub unsafe fn unwrap_log_fn_callback(handle: NativeHandle) -> Option<LogFnCallback>"
    ));
}

#[test]
fn wrappers_marshal_strings_and_flag_raw_pointers() {
    let wrappers = section("wrappers.rs");
    assert!(wrappers.contains("pub fn add(a: i32, b: i32) -> i32 {"));
    assert!(wrappers.contains("    unsafe { bindings::add(a, b) }"));
    assert!(wrappers.contains("pub fn widget_version() -> String {"));
    assert!(wrappers.contains("    unsafe { from_native_string(bindings::widget_version()) }"));
    assert!(wrappers.contains("pub unsafe fn widget_set_title(w: NativeHandle, title: &str) {"));
    assert!(wrappers.contains("    let title = to_native_string(title);"));
    assert!(wrappers.contains("bindings::widget_set_title(w, title.as_ptr())"));
    assert!(wrappers.contains("pub unsafe fn sort_items("));
}

#[test]
fn mutable_char_buffers_stay_raw() {
    let wrappers = section("wrappers.rs");
    assert!(
        wrappers.contains(
            "pub unsafe fn widget_get_name(w: NativeHandle, buf: *mut ::core::ffi::c_char, len: usize) {"
        ),
        "{wrappers}"
    );
    assert!(wrappers.contains("    unsafe { bindings::widget_get_name(w, buf, len) }"));
    assert!(!wrappers.contains("cast_mut()"));

    let bindings = section("bindings.rs");
    assert!(bindings.contains("`buf` may be written by the callee"));
}

#[test]
fn owning_wrappers_release_through_destroy() {
    let wrappers = section("wrappers.rs");
    for (owned, destroy) in [
        ("OwnedPoint", "point_destroy"),
        ("OwnedNode", "node_destroy"),
        ("OwnedWidget", "widget_destroy"),
        ("OwnedCanvas", "canvas_destroy"),
    ] {
        assert!(wrappers.contains(&format!("pub struct {owned} {{")), "{owned}");
        assert!(wrappers.contains(&format!("impl Drop for {owned} {{")));
        assert!(wrappers.contains(&format!("    fn {destroy}(handle: NativeHandle);")));
    }
}

#[test]
fn extensions_are_static() {
    assert_eq!(section("extensions.rs"), bnd_layered::emit::EXTENSIONS);
}

/// Writes the sections next to a crate root and type-checks them with the
/// same compiler that builds this test. Skipped when no compiler is on hand.
#[test]
fn generated_sections_compile_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    WIDGETS.write_to(tmp.path()).unwrap();
    let root = tmp.path().join("lib.rs");
    std::fs::write(
        &root,
        "pub mod widgets_native {\n    pub mod types;\n    pub mod bindings;\n    \
         pub mod memory;\n    pub mod callbacks;\n    pub mod wrappers;\n    \
         pub mod extensions;\n}\n",
    )
    .unwrap();

    let rustc = std::env::var_os("RUSTC").unwrap_or_else(|| "rustc".into());
    let output = match std::process::Command::new(rustc)
        .args(["--edition", "2024", "--crate-type", "lib", "--crate-name", "widgets_check"])
        .args(["--emit", "metadata", "-D", "unused_doc_comments", "--out-dir"])
        .arg(tmp.path())
        .arg(&root)
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            eprintln!("skipping: no rustc available ({e})");
            return;
        }
    };
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "generated sections failed to compile:\n{stderr}");
}
