/* Render command - generate the binding module and its shim source */

use super::common::{load_config, load_declarations, load_mapping};
use crate::codegen::{FunctionRenderer, Session, StructRenderer};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct RenderOptions {
    pub decl_files: Vec<PathBuf>,
    pub mapping_file: PathBuf,
    pub config_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub module_name: String,
    pub verbose: bool,
}

/// Paths of the two files a render writes.
#[derive(Debug)]
pub struct RenderOutput {
    pub module_path: PathBuf,
    pub shim_path: PathBuf,
}

pub fn run(options: RenderOptions) -> anyhow::Result<RenderOutput> {
    let verbose = options.verbose;
    if verbose {
        println!("bind-gen - Binding Renderer");
        println!("===========================\n");
        println!("[~] Configuration:");
        println!("  Mapping: {}", options.mapping_file.display());
        println!("  Output directory: {}", options.output_dir.display());
        println!("  Module: {}", options.module_name);
        println!("  Declaration files: {}", options.decl_files.len());
        for file in &options.decl_files {
            println!("    - {}", file.display());
        }
        println!();
    }

    let config = load_config(options.config_file.as_deref())?;
    let mapping = load_mapping(&options.mapping_file)?;
    let mut decl_sets = Vec::with_capacity(options.decl_files.len());
    for file in &options.decl_files {
        decl_sets.push((file.as_path(), load_declarations(file)?));
    }

    let mut session = Session::new(config);

    /* Every struct first, so functions may use proxies from any file */
    for (file, decls) in &decl_sets {
        if verbose {
            println!("[~] Rendering {} struct(s) from {}", decls.structs.len(), file.display());
        }
        StructRenderer::new(&decls.structs, &mapping)
            .with_header_digest(decls.header_digest.as_deref())
            .render(&mut session)
            .with_context(|| format!("Failed to render structs from {}", file.display()))?;
    }
    for (file, decls) in &decl_sets {
        if verbose {
            println!("[~] Rendering {} function(s) from {}", decls.functions.len(), file.display());
        }
        FunctionRenderer::new(&decls.functions, &decls.header)
            .with_header_digest(decls.header_digest.as_deref())
            .render(&mut session)
            .with_context(|| format!("Failed to render functions from {}", file.display()))?;
    }

    let module = session.assemble();
    let output = write_module(&options.output_dir, &options.module_name, &module.render(), &module.shim_source())?;
    info!(
        module = %output.module_path.display(),
        shim = %output.shim_path.display(),
        declarations = session.cache_len(),
        "wrote bindings"
    );
    if verbose {
        println!("[✓] Generated {}", output.module_path.display());
        println!("[✓] Generated {}", output.shim_path.display());
    }
    Ok(output)
}

fn write_module(output_dir: &Path, module_name: &str, host: &str, shim: &str) -> anyhow::Result<RenderOutput> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    let module_path = output_dir.join(format!("{}.rs", module_name));
    let shim_path = output_dir.join(format!("{}_shim.cpp", module_name));
    fs::write(&module_path, host).with_context(|| format!("Failed to write {}", module_path.display()))?;
    fs::write(&shim_path, shim).with_context(|| format!("Failed to write {}", shim_path.display()))?;
    Ok(RenderOutput { module_path, shim_path })
}
