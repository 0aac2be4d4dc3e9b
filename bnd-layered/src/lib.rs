//! bnd-layered — declaration tree → layered Rust FFI bindings.
//!
//! Takes the declaration tree produced by an external header parser and
//! emits six ordered source sections: native types, raw `extern` bindings,
//! marshaling helpers, callback types, safe wrappers and a static extensions
//! file.
//!
//! # Quick start
//!
//! Generate from a config (suitable for `build.rs`):
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads the config TOML and the declaration tree, writes the sections.
//! bnd_layered::run(Path::new("bnd-layered.toml"), None).unwrap();
//! ```
//!
//! Or drive the core directly with an in-memory tree:
//!
//! ```
//! use bnd_layered::model::{Declaration, FunctionDecl, GeneratorOptions, ParamDecl};
//!
//! let tree = vec![Declaration::Function(FunctionDecl {
//!     name: "add".into(),
//!     return_type: "int".into(),
//!     parameters: vec![
//!         ParamDecl { name: "a".into(), ty: "int".into() },
//!         ParamDecl { name: "b".into(), ty: "int".into() },
//!     ],
//!     documentation: None,
//!     is_virtual: false,
//!     is_static: false,
//! })];
//! let code = bnd_layered::generate(&tree, &GeneratorOptions::new("Math", "m")).unwrap();
//! assert!(code.section("bindings.rs").unwrap().content.contains("pub fn add(a: i32, b: i32) -> i32;"));
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

pub mod callback;
pub mod config;
pub mod emit;
pub mod error;
pub mod memory;
pub mod model;
pub mod naming;
pub mod typemap;

pub use emit::generate;
pub use error::GenerateError;
pub use model::{Declaration, GeneratedCode, GeneratorOptions};

/// Run the full pipeline: load config, load the declaration tree, generate
/// every section and write them under the output directory.
///
/// `config_path` is the path to a `bnd-layered.toml` configuration file.
/// `output` optionally overrides the output directory from the config.
///
/// Returns the directory the sections were written to.
pub fn run(config_path: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let code = generate_from_config(&cfg, base_dir)?;

    let output_dir = match output {
        Some(p) => p.to_path_buf(),
        None => base_dir.join(&cfg.output_dir),
    };
    let written = code
        .write_to(&output_dir)
        .with_context(|| format!("writing sections to {}", output_dir.display()))?;

    info!(
        dir = %output_dir.display(),
        files = written.len(),
        "wrote generated sections"
    );

    Ok(output_dir)
}

/// Generate all sections from an already-loaded [`config::Config`].
///
/// `base_dir` is the directory relative to which the declaration file path
/// in the config is resolved (typically the parent directory of the TOML
/// file).
pub fn generate_from_config(cfg: &config::Config, base_dir: &Path) -> Result<GeneratedCode> {
    info!(
        namespace = %cfg.namespace,
        library = %cfg.library,
        "loaded configuration"
    );

    let decl_path = config::resolve_path(&cfg.declarations, base_dir);
    let declarations = config::load_declarations(&decl_path)
        .with_context(|| format!("loading declarations from {}", decl_path.display()))?;

    let code = generate(&declarations, &cfg.options())?;

    info!(
        sections = code.sections.len(),
        bytes = code.sections.iter().map(|s| s.content.len()).sum::<usize>(),
        "generated bindings"
    );

    Ok(code)
}

impl GeneratedCode {
    /// Write every section under `dir` in `order`, creating directories as
    /// needed. Returns the written paths.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut sections: Vec<_> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);

        let mut written = Vec::with_capacity(sections.len());
        for section in sections {
            let path = dir.join(&section.file_name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(&path, &section.content)
                .with_context(|| format!("writing {}", path.display()))?;
            debug!(path = %path.display(), order = section.order, "wrote section");
            written.push(path);
        }
        Ok(written)
    }
}
