//! Configuration types for `bnd-layered.toml` and the declaration-tree file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::{CallConv, Declaration, GeneratorOptions};

/// Root configuration.
///
/// ```toml
/// namespace = "MyLib.Native"
/// library = "mylib"
/// calling_convention = "cdecl"
/// declarations = "mylib.decls.toml"
/// output_dir = "src/generated"
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Namespace the generated module is named after.
    pub namespace: String,
    /// Native library name for every `#[link(name = ...)]` attribute.
    pub library: String,
    #[serde(default)]
    pub calling_convention: CallConv,
    /// Declaration tree produced by the header parser, resolved relative to
    /// the config file's directory.
    pub declarations: PathBuf,
    /// Where sections are written (relative to the config file's directory).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

impl Config {
    pub fn options(&self) -> GeneratorOptions {
        GeneratorOptions {
            namespace: self.namespace.clone(),
            library: self.library.clone(),
            calling_convention: self.calling_convention,
        }
    }
}

/// On-disk form of a declaration tree: a top-level `[[declarations]]` array.
///
/// ```toml
/// [[declarations]]
/// kind = "Function"
/// name = "add"
/// return_type = "int"
/// parameters = [{ name = "a", type = "int" }, { name = "b", type = "int" }]
/// ```
#[derive(Debug, Deserialize)]
pub struct DeclarationFile {
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

/// Absolute paths are returned as-is; relative ones are joined to
/// `base_dir`.
pub fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Load and parse a `bnd-layered.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))?;
    Ok(config)
}

/// Parse a declaration tree from TOML text.
pub fn parse_declarations(text: &str) -> anyhow::Result<Vec<Declaration>> {
    let file: DeclarationFile = toml::from_str(text)
        .map_err(|e| anyhow::anyhow!("failed to parse declaration tree: {e}"))?;
    Ok(file.declarations)
}

/// Load a declaration tree file.
pub fn load_declarations(path: &Path) -> anyhow::Result<Vec<Declaration>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        anyhow::anyhow!("failed to read declaration file {}: {}", path.display(), e)
    })?;
    parse_declarations(&content)
        .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
}
