/* Loading helpers shared between the render and layout commands */

use crate::codegen::RenderConfig;
use crate::model::MappingSpec;
use anyhow::Context;
use bind_types::Declarations;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/* Directory a relative path inside `file` is resolved against */
fn base_dir(file: &Path) -> PathBuf {
    let parent = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::canonicalize(&parent).unwrap_or(parent)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// Load one declarations file.
///
/// A relative `header` is resolved against the file's directory. When the
/// header is readable and no digest was supplied, its SHA-256 becomes the
/// `header-digest`.
pub fn load_declarations(path: &Path) -> anyhow::Result<Declarations> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read declarations file {}", path.display()))?;
    let mut decls: Declarations = serde_yml::from_str(&text)
        .with_context(|| format!("Failed to parse declarations file {}", path.display()))?;

    if decls.header.is_relative() {
        decls.header = base_dir(path).join(&decls.header);
    }
    if decls.header_digest.is_none() {
        decls.header_digest = fs::read(&decls.header).ok().map(|bytes| sha256_hex(&bytes));
    }
    Ok(decls)
}

pub fn load_mapping(path: &Path) -> anyhow::Result<MappingSpec> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping file {}", path.display()))?;
    let mut spec: MappingSpec = serde_yml::from_str(&text)
        .with_context(|| format!("Failed to parse mapping file {}", path.display()))?;
    spec.rebase_headers(&base_dir(path));
    Ok(spec)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<RenderConfig> {
    let Some(path) = path else {
        return Ok(RenderConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_yml::from_str(&text).with_context(|| format!("Failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex() {
        let digest = sha256_hex(b"abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn header_is_resolved_next_to_the_declarations() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("operator.h"), "struct Foo { int x; };\n").unwrap();
        let decl_path = dir.path().join("ops.yaml");
        fs::write(&decl_path, "header: operator.h\nstructs:\n  - name: Foo\n    fields:\n      - { name: x, field-type: int }\n").unwrap();

        let decls = load_declarations(&decl_path).unwrap();
        assert!(decls.header.is_absolute());
        assert!(decls.header.ends_with("operator.h"));
        assert_eq!(
            decls.header_digest.as_deref(),
            Some(sha256_hex(b"struct Foo { int x; };\n").as_str())
        );
    }

    #[test]
    fn missing_header_leaves_digest_empty() {
        let dir = tempfile::tempdir().unwrap();
        let decl_path = dir.path().join("ops.yaml");
        fs::write(&decl_path, "header: missing.h\n").unwrap();
        let decls = load_declarations(&decl_path).unwrap();
        assert!(decls.header_digest.is_none());
    }
}
