/* Module assembly over everything a session has recorded */

use super::fragment::{Fragment, FragmentKind, GeneratedModule, GENERATED_BANNER};
use super::session::Session;

const ALLOW_ATTRIBUTE: &str = "#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals, dead_code, unused_imports, clippy::all)]";

pub(crate) fn prefix_fragment() -> Fragment {
    Fragment::new(
        FragmentKind::Prefix,
        "prefix",
        format!("{}\n{}\n", GENERATED_BANNER, ALLOW_ATTRIBUTE),
    )
}

impl Session {
    /// Fixed boilerplate opening every generated module.
    pub fn prefix(&self) -> String {
        prefix_fragment().text
    }

    /// Imports recorded so far, de-duplicated, in first-seen order.
    pub fn rendered_imports(&self) -> String {
        self.assemble().section_text(FragmentKind::Import)
    }

    /// Host constant embedding the shim blob.
    pub fn rendered_shims(&self) -> String {
        self.assemble().shim_constant()
    }

    /// Native shim blob: includes plus every shim in emission order.
    pub fn shim_source(&self) -> String {
        self.assemble().shim_source()
    }

    /// Everything recorded in this session as one module.
    pub fn assemble(&self) -> GeneratedModule {
        let mut module = self.empty_module();
        module.extend(self.fragments().cloned());
        for header in self.includes() {
            module.add_include(header);
        }
        module
    }

    /// Module carrying only the prefix; renderers fill in their own output.
    pub(crate) fn empty_module(&self) -> GeneratedModule {
        let mut module = GeneratedModule::new(self.config().shim_source_ident.clone());
        module.push(prefix_fragment());
        module
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::config::RenderConfig;

    #[test]
    fn empty_session_assembles_to_boilerplate() {
        let session = Session::new(RenderConfig::default());
        let module = session.assemble();
        assert!(module.is_empty());
        assert!(session.prefix().starts_with(GENERATED_BANNER));
        assert!(session.prefix().contains("#![allow("));
        assert_eq!(session.rendered_imports(), "");
        assert!(session.shim_source().contains("#include <cstdint>"));
    }

    #[test]
    fn shim_constant_uses_configured_ident() {
        let config = RenderConfig {
            shim_source_ident: "NATIVE_SHIMS".to_string(),
            ..Default::default()
        };
        let session = Session::new(config);
        assert!(session.rendered_shims().contains("pub const NATIVE_SHIMS: &str = r#\""));
    }
}
