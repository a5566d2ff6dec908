/* Layout command - print the native layouts of declared structs */

use super::common::{load_declarations, load_mapping};
use crate::codegen::RenderConfig;
use crate::model::{DataModel, LayoutResolver, StructLayout};
use anyhow::Context;
use clap::ValueEnum;
use serde_derive::Serialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LayoutFormat {
    Json,
    Yaml,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutReport {
    #[serde(flatten)]
    pub layout: StructLayout,
    /// Proxy name and model when the struct is mapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<DataModel>,
}

pub fn collect(decl_files: &[PathBuf], mapping_file: &Path, pointer_width: u64) -> anyhow::Result<Vec<LayoutReport>> {
    let mapping = load_mapping(mapping_file)?;
    let mut reports: Vec<LayoutReport> = Vec::new();

    for file in decl_files {
        let decls = load_declarations(file)?;
        let mut resolver = LayoutResolver::new(&decls.structs, pointer_width);
        /* Structs from earlier files are visible to later ones */
        for report in &reports {
            resolver.add_known(report.layout.name.clone(), report.layout.size, report.layout.alignment);
        }
        for decl in &decls.structs {
            let layout = resolver
                .resolve(&decl.name)
                .with_context(|| format!("Failed to lay out '{}' from {}", decl.name, file.display()))?;
            let entry = mapping.get(&decl.name);
            reports.push(LayoutReport {
                layout,
                host_name: entry.map(|entry| entry.host_name_for(&decl.name)),
                model: entry.map(|entry| entry.model),
            });
        }
    }
    Ok(reports)
}

pub fn run(decl_files: Vec<PathBuf>, mapping_file: PathBuf, format: LayoutFormat) -> anyhow::Result<()> {
    let reports = collect(&decl_files, &mapping_file, RenderConfig::default().pointer_width)?;
    let text = match format {
        LayoutFormat::Json => serde_json::to_string_pretty(&reports)?,
        LayoutFormat::Yaml => serde_yml::to_string(&reports)?,
    };
    println!("{}", text);
    Ok(())
}
