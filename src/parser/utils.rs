//! Label escaping for writing Newick and NEXUS text.

/// Characters that end an unquoted label in Newick or NEXUS.
const SPECIAL_CHARS: &[char] = &[
    ' ', ',', ';', '\t', '\n', '\r', '(', ')', ':', '[', ']', '\'', '=',
];

/// Checks whether a label has to be quoted to be read back verbatim.
///
/// # Examples
/// ```
/// # use phylotraits::parser::utils::needs_quoting;
/// assert!(!needs_quoting("Pukeko"));
/// assert!(!needs_quoting("hCoV-19|EPI_ISL_402124|2019-12-30"));
/// assert!(needs_quoting("Australasian Swamphen"));
/// assert!(needs_quoting("Baillon's_Crake"));
/// assert!(needs_quoting(""));
/// ```
pub fn needs_quoting(label: &str) -> bool {
    label.is_empty() || label.contains(SPECIAL_CHARS)
}

/// Escapes a label for writing: labels containing special characters are
/// wrapped in single quotes, with internal single quotes doubled.
///
/// # Examples
/// ```
/// # use phylotraits::parser::utils::escape_label;
/// assert_eq!(escape_label("Pukeko"), "Pukeko");
/// assert_eq!(escape_label("Pu[ke]ko"), "'Pu[ke]ko'");
/// assert_eq!(escape_label("Australasian Swamphen"), "'Australasian Swamphen'");
/// assert_eq!(escape_label("Baillon's Crake"), "'Baillon''s Crake'");
/// ```
pub fn escape_label(label: &str) -> String {
    if needs_quoting(label) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

/// Removes one pair of enclosing single or double quotes, if present.
///
/// # Examples
/// ```
/// # use phylotraits::parser::utils::strip_quotes;
/// assert_eq!(strip_quotes("'A|2020-01-03'"), "A|2020-01-03");
/// assert_eq!(strip_quotes("\"B\""), "B");
/// assert_eq!(strip_quotes("C'"), "C'");
/// ```
pub fn strip_quotes(label: &str) -> &str {
    for quote in ['\'', '"'] {
        if label.len() >= 2 && label.starts_with(quote) && label.ends_with(quote) {
            return &label[1..label.len() - 1];
        }
    }
    label
}
