//! LDAP search filter construction
//!
//! Values are escaped per RFC 4515 before they are interpolated: `(`, `)`,
//! `*`, `\` and NUL become `\28`, `\29`, `\2a`, `\5c` and `\00`.

use ldap3::ldap_escape;

/// Escape a string for use as an assertion value inside a filter
pub fn escape_value(value: &str) -> String {
    ldap_escape(value).into_owned()
}

/// `(<attribute>=<escaped value>)`
pub fn equality(attribute: &str, value: &str) -> String {
    format!("({}={})", attribute, ldap_escape(value))
}

/// Conjunction of already-built filter terms.
///
/// A single term is returned as-is rather than wrapped in `(&...)`.
pub fn and<I>(terms: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut terms: Vec<String> = terms.into_iter().collect();
    match terms.len() {
        1 => terms.remove(0),
        _ => format!("(&{})", terms.concat()),
    }
}

/// Equality term optionally narrowed to an object class
pub fn equality_with_class(attribute: &str, value: &str, object_class: Option<&str>) -> String {
    let mut terms = vec![equality(attribute, value)];
    if let Some(class) = object_class.filter(|c| !c.trim().is_empty()) {
        terms.push(equality("objectClass", class.trim()));
    }
    and(terms)
}
