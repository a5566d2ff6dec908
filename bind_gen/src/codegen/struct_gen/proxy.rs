/* Host-side proxy type emission */

use crate::model::StructLayout;

/// One public field of a `struct`-model proxy.
pub(super) struct ProxyField {
    /// Native field name, used in the offsets table.
    pub native_name: String,
    /// Escaped host identifier.
    pub ident: String,
    pub host_type: String,
    pub offset: u64,
}

const EMPTY_FIELD: &str = "_reserved";

fn doc_lines(native_name: &str, header: &str, comment: Option<&str>, opaque: bool) -> String {
    let mut output = String::new();
    let what = if opaque { "Opaque proxy" } else { "Proxy" };
    output.push_str(&format!("/// {} for native `{}` (`{}`).\n", what, native_name, header));
    if let Some(comment) = comment {
        output.push_str("///\n");
        for line in comment.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                output.push_str("///\n");
            } else {
                output.push_str(&format!("/// {}\n", line));
            }
        }
    }
    output
}

pub(super) fn struct_proxy(
    native_name: &str,
    host_name: &str,
    header: &str,
    comment: Option<&str>,
    layout: &StructLayout,
    fields: &[ProxyField],
) -> String {
    let mut output = doc_lines(native_name, header, comment, false);
    output.push_str("#[repr(C)]\n");
    output.push_str("#[derive(Clone, Copy, Debug)]\n");
    output.push_str(&format!("pub struct {} {{\n", host_name));
    if fields.is_empty() {
        /* C++ gives an empty struct one byte */
        output.push_str(&format!("    {}: u8,\n", EMPTY_FIELD));
    }
    for field in fields {
        output.push_str(&format!("    pub {}: {},\n", field.ident, field.host_type));
    }
    output.push_str("}\n\n");

    output.push_str(&format!("impl {} {{\n", host_name));
    let offsets: Vec<String> = fields
        .iter()
        .map(|field| format!("(\"{}\", {})", field.native_name, field.offset))
        .collect();
    output.push_str("    /// Native field offsets, in declaration order.\n");
    output.push_str(&format!(
        "    pub const FIELD_OFFSETS: [(&'static str, usize); {}] = [{}];\n\n",
        fields.len(),
        offsets.join(", ")
    ));

    let params: Vec<String> = fields
        .iter()
        .map(|field| format!("{}: {}", field.ident, field.host_type))
        .collect();
    output.push_str(&format!("    pub const fn new({}) -> Self {{\n", params.join(", ")));
    if fields.is_empty() {
        output.push_str(&format!("        Self {{ {}: 0 }}\n", EMPTY_FIELD));
    } else {
        let idents: Vec<&str> = fields.iter().map(|field| field.ident.as_str()).collect();
        output.push_str(&format!("        Self {{ {} }}\n", idents.join(", ")));
    }
    output.push_str("    }\n");
    output.push_str("}\n\n");

    output.push_str(&layout_assertions(host_name, layout, fields));
    output
}

pub(super) fn opaque_proxy(
    native_name: &str,
    host_name: &str,
    header: &str,
    comment: Option<&str>,
    layout: &StructLayout,
) -> String {
    let mut output = doc_lines(native_name, header, comment, true);
    output.push_str(&format!("#[repr(C, align({}))]\n", layout.alignment));
    output.push_str("#[derive(Clone, Copy, Debug)]\n");
    output.push_str(&format!("pub struct {} {{\n", host_name));
    output.push_str(&format!("    bytes: [u8; {}],\n", layout.size));
    output.push_str("}\n\n");

    output.push_str(&format!("impl {} {{\n", host_name));
    output.push_str(&format!(
        "    pub const fn from_bytes(bytes: [u8; {}]) -> Self {{\n        Self {{ bytes }}\n    }}\n\n",
        layout.size
    ));
    output.push_str(&format!(
        "    pub const fn to_bytes(self) -> [u8; {}] {{\n        self.bytes\n    }}\n",
        layout.size
    ));
    output.push_str("}\n\n");

    output.push_str(&layout_assertions(host_name, layout, &[]));
    output
}

/* The host compiler re-checks the computed layout */
fn layout_assertions(host_name: &str, layout: &StructLayout, fields: &[ProxyField]) -> String {
    let mut output = String::from("const _: () = {\n");
    output.push_str(&format!(
        "    assert!(core::mem::size_of::<{}>() == {});\n",
        host_name, layout.size
    ));
    output.push_str(&format!(
        "    assert!(core::mem::align_of::<{}>() == {});\n",
        host_name, layout.alignment
    ));
    for field in fields {
        output.push_str(&format!(
            "    assert!(core::mem::offset_of!({}, {}) == {});\n",
            host_name, field.ident, field.offset
        ));
    }
    output.push_str("};\n");
    output
}
