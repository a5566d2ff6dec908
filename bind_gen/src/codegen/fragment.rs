//! Typed intermediate representation of generated output.
//!
//! Renderers never concatenate text across kinds. They produce [`Fragment`]s
//! and a [`GeneratedModule`] places each one in the section for its kind.
//! Sections always render in [`FragmentKind`] order (prefix, imports, struct
//! bindings, function bindings, shim), which is what lets function bindings
//! name proxy types and the prefix carry crate-level attributes.

use serde_derive::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a generated unit. Declaration order is output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Prefix,
    Import,
    StructBinding,
    FunctionBinding,
    Shim,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 5] = [
        FragmentKind::Prefix,
        FragmentKind::Import,
        FragmentKind::StructBinding,
        FragmentKind::FunctionBinding,
        FragmentKind::Shim,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Prefix => "prefix",
            FragmentKind::Import => "import",
            FragmentKind::StructBinding => "struct_binding",
            FragmentKind::FunctionBinding => "function_binding",
            FragmentKind::Shim => "shim",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named unit of generated text.
///
/// Host fragments hold Rust source; `Shim` fragments hold native C++ source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    /// Identity inside a session: proxy/shim name, impl header or import line.
    pub name: String,
    pub text: String,
}

impl Fragment {
    pub fn new(kind: FragmentKind, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            text: text.into(),
        }
    }

    /// Identity used for de-duplication and collision checks.
    pub fn id(&self) -> FragmentId {
        FragmentId {
            kind: self.kind,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId {
    pub kind: FragmentKind,
    pub name: String,
}

/// Which shared segments a renderer call includes in its returned text.
///
/// Segments left out are still recorded in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFlags {
    pub with_prefix: bool,
    pub with_imports: bool,
    pub with_shim_functions: bool,
}

impl RenderFlags {
    pub fn all() -> Self {
        Self {
            with_prefix: true,
            with_imports: true,
            with_shim_functions: true,
        }
    }

    /// Only this call's struct/function bindings.
    pub fn bindings_only() -> Self {
        Self {
            with_prefix: false,
            with_imports: false,
            with_shim_functions: false,
        }
    }
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self::all()
    }
}

pub const GENERATED_BANNER: &str = "// Generated by bind-gen. Do not edit.";

/// Ordered collection of fragments plus what the shim blob needs to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    sections: BTreeMap<FragmentKind, Vec<Fragment>>,
    includes: Vec<String>,
    shim_source_ident: String,
}

impl GeneratedModule {
    pub fn new(shim_source_ident: impl Into<String>) -> Self {
        Self {
            sections: BTreeMap::new(),
            includes: Vec::new(),
            shim_source_ident: shim_source_ident.into(),
        }
    }

    pub fn push(&mut self, fragment: Fragment) {
        let section = self.sections.entry(fragment.kind).or_default();
        /* Imports are shared; the first occurrence keeps its position */
        if fragment.kind == FragmentKind::Import
            && section.iter().any(|existing| existing.name == fragment.name)
        {
            return;
        }
        section.push(fragment);
    }

    pub fn extend(&mut self, fragments: impl IntoIterator<Item = Fragment>) {
        for fragment in fragments {
            self.push(fragment);
        }
    }

    pub fn add_include(&mut self, header: impl Into<String>) {
        let header = header.into();
        if !self.includes.contains(&header) {
            self.includes.push(header);
        }
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn fragments(&self, kind: FragmentKind) -> &[Fragment] {
        self.sections.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every fragment, in output order.
    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.sections.values().flatten()
    }

    /// True when nothing but boilerplate was recorded.
    pub fn is_empty(&self) -> bool {
        self.sections
            .iter()
            .all(|(kind, fragments)| *kind == FragmentKind::Prefix || fragments.is_empty())
    }

    pub fn section_text(&self, kind: FragmentKind) -> String {
        let separator = match kind {
            FragmentKind::Import => "",
            _ => "\n",
        };
        self.fragments(kind)
            .iter()
            .map(|fragment| fragment.text.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Native source blob: includes followed by every shim in emission order.
    pub fn shim_source(&self) -> String {
        let mut output = String::new();
        output.push_str(GENERATED_BANNER);
        output.push('\n');
        output.push_str("#include <cstddef>\n");
        output.push_str("#include <cstdint>\n");
        for header in &self.includes {
            output.push_str(&format!("#include \"{}\"\n", header));
        }
        let shims = self.section_text(FragmentKind::Shim);
        if !shims.is_empty() {
            output.push('\n');
            output.push_str(&shims);
        }
        output
    }

    /// Host constant embedding [`GeneratedModule::shim_source`].
    pub fn shim_constant(&self) -> String {
        format!(
            "/// Native shim source; compile it and link the object with this module.\npub const {}: &str = {};\n",
            self.shim_source_ident,
            raw_string_literal(&self.shim_source())
        )
    }

    pub fn to_text(&self, flags: RenderFlags) -> String {
        let mut parts: Vec<String> = Vec::new();
        for kind in FragmentKind::ALL {
            let enabled = match kind {
                FragmentKind::Prefix => flags.with_prefix,
                FragmentKind::Import => flags.with_imports,
                FragmentKind::StructBinding | FragmentKind::FunctionBinding => true,
                FragmentKind::Shim => flags.with_shim_functions,
            };
            if !enabled || self.fragments(kind).is_empty() {
                continue;
            }
            let text = match kind {
                FragmentKind::Shim => self.shim_constant(),
                _ => self.section_text(kind),
            };
            parts.push(text);
        }
        parts.join("\n")
    }

    pub fn render(&self) -> String {
        self.to_text(RenderFlags::all())
    }
}

/// Wrap `text` in a raw string literal whose delimiter it cannot close.
pub fn raw_string_literal(text: &str) -> String {
    let mut longest = 0usize;
    let mut current: Option<usize> = None;
    for c in text.chars() {
        match (c, current) {
            ('"', _) => current = Some(0),
            ('#', Some(run)) => {
                current = Some(run + 1);
                longest = longest.max(run + 1);
            }
            _ => current = None,
        }
    }
    let hashes = "#".repeat(longest + 1);
    format!("r{hashes}\"{text}\"{hashes}")
}
