use serde::{Deserialize, Serialize};

/// Formatting configuration.
///
/// Deserialised from a `.mformat.json` object with camelCase keys. Missing
/// keys fall back to the built-in defaults below; unknown keys are ignored.
/// A type mismatch on a known key is a deserialisation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Number of space characters per block-depth level.
    pub indent: usize,
    /// Indent `case`/`otherwise` clauses inside `switch`.
    pub indent_case_otherwise: bool,
    /// Indent the body of the main function.
    pub indent_main_function: bool,
    /// Indent the bodies of local (sibling) functions.
    pub indent_local_function: bool,
    /// Indent the bodies of nested functions.
    pub indent_nested_function: bool,
    /// Elide the space after a comma when every list item is short.
    pub omit_space_after_comma: bool,
    pub omit_space_after_comma_max_length: usize,
    /// Elide the spaces around `:` when both operands are short.
    pub omit_space_around_colon: bool,
    pub omit_space_around_colon_max_length: usize,
    /// Guarantee a trailing newline on non-empty output.
    pub newline_at_end_of_file: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            indent: 2,
            indent_case_otherwise: true,
            indent_main_function: false,
            indent_local_function: false,
            indent_nested_function: true,
            omit_space_after_comma: true,
            omit_space_after_comma_max_length: 1,
            omit_space_around_colon: true,
            omit_space_around_colon_max_length: 5,
            newline_at_end_of_file: true,
        }
    }
}
