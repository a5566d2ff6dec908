use crate::model::StructLayout;

/// Native-side `static_assert`s mirroring the host layout assertions.
pub(super) fn layout_asserts(native_name: &str, layout: &StructLayout) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "static_assert(sizeof({0}) == {1}, \"{0}: size differs from the generated proxy\");\n",
        native_name, layout.size
    ));
    output.push_str(&format!(
        "static_assert(alignof({0}) == {1}, \"{0}: alignment differs from the generated proxy\");\n",
        native_name, layout.alignment
    ));
    for field in &layout.fields {
        output.push_str(&format!(
            "static_assert(offsetof({0}, {1}) == {2}, \"{0}::{1}: offset differs from the generated proxy\");\n",
            native_name, field.name, field.offset
        ));
    }
    output
}
