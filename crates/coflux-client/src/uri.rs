//! URI template expansion.
//!
//! Templates use `{name}` placeholders. Positional expansion fills them
//! left to right; named expansion looks each name up. Substituted values
//! are percent-encoded as URI components, so `/` or `?` inside a value
//! cannot change the structure of the URI.

use http::Uri;
use std::fmt::Display;

/// Expands `{..}` placeholders in order with `values`.
pub(crate) fn expand_positional(template: &str, values: &[&dyn Display]) -> Result<String, String> {
    let mut values = values.iter();
    expand(template, |name| {
        values
            .next()
            .map(ToString::to_string)
            .ok_or_else(|| format!("not enough variable values to expand '{name}' in '{template}'"))
    })
}

/// Expands `{name}` placeholders from `lookup`.
pub(crate) fn expand_named<F>(template: &str, lookup: F) -> Result<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    expand(template, |name| {
        lookup(name).ok_or_else(|| format!("no value for variable '{name}' in '{template}'"))
    })
}

fn expand<F>(template: &str, mut value_for: F) -> Result<String, String>
where
    F: FnMut(&str) -> Result<String, String>,
{
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        expanded.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| format!("unclosed variable in '{template}'"))?;
        let name = after[..close].trim();
        let value = value_for(name)?;
        expanded.push_str(&urlencoding::encode(&value));
        rest = &after[close + 1..];
    }
    expanded.push_str(rest);
    Ok(expanded)
}

/// Resolves an expanded template against an optional base URL.
///
/// Absolute templates are used as is. Relative ones are appended to the
/// base URL's path; the base's query and fragment are not carried over.
pub(crate) fn resolve(base: Option<&Uri>, expanded: &str) -> Result<Uri, String> {
    let uri: Uri = expanded
        .parse()
        .map_err(|e| format!("invalid URI '{expanded}': {e}"))?;
    if uri.scheme().is_some() {
        return Ok(uri);
    }
    let Some(base) = base else {
        return Ok(uri);
    };

    let origin = match (base.scheme(), base.authority()) {
        (Some(scheme), Some(authority)) => format!("{scheme}://{authority}"),
        _ => String::new(),
    };
    let base = format!("{origin}{}", base.path().trim_end_matches('/'));
    let joined = if expanded.is_empty() || expanded.starts_with('?') {
        format!("{base}{expanded}")
    } else if expanded.starts_with('/') {
        format!("{base}{expanded}")
    } else {
        format!("{base}/{expanded}")
    };
    joined
        .parse()
        .map_err(|e| format!("invalid URI '{joined}': {e}"))
}
