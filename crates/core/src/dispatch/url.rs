//! URL and header resolution for descriptors

use gamelink_domain::{GameLinkError, RequestDescriptor, Result};
use url::Url;

/// Build the final URL: `base_url` + path with placeholders filled +
/// query parameters.
///
/// Placeholders are positional (`{0}`, `{1}`, ...) and their values are
/// percent-encoded. A path that already is an absolute http(s) URL is used
/// as-is instead of being joined to `base_url`.
///
/// # Errors
///
/// Returns `GameLinkError::InvalidInput` when a placeholder has no value or
/// the result is not a valid URL.
pub fn resolve_url(base_url: &str, descriptor: &RequestDescriptor) -> Result<String> {
    let path = fill_placeholders(descriptor.path(), descriptor.path_args())?;

    let joined = if path.starts_with("http://") || path.starts_with("https://") {
        path
    } else {
        let base = base_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    };

    let mut url = Url::parse(&joined)
        .map_err(|e| GameLinkError::InvalidInput(format!("invalid url '{joined}': {e}")))?;

    if !descriptor.query().is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in descriptor.query() {
            pairs.append_pair(name, value);
        }
    }

    Ok(url.into())
}

/// True when both URLs parse and share scheme, host and port.
pub fn same_origin(url: &str, base_url: &str) -> bool {
    match (Url::parse(url), Url::parse(base_url)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin(),
        _ => false,
    }
}

fn fill_placeholders(template: &str, args: &[String]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let index = after
            .find('}')
            .map(|close| (&after[..close], close))
            .filter(|(digits, _)| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));

        match index {
            Some((digits, close)) => {
                let value = digits
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| args.get(i))
                    .ok_or_else(|| {
                        GameLinkError::InvalidInput(format!(
                            "no value for placeholder {{{digits}}} in '{template}'"
                        ))
                    })?;
                out.push_str(&urlencoding::encode(value));
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Merge header layers: domain defaults, then descriptor headers (replacing
/// defaults with the same name, case-insensitively), then the auth header
/// unless the descriptor set it explicitly.
pub fn merge_headers(
    defaults: &[(String, String)],
    extra: &[(String, String)],
    auth: Option<(&str, &str)>,
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults.to_vec();

    for (name, value) in extra {
        match merged.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.1.clone_from(value),
            None => merged.push((name.clone(), value.clone())),
        }
    }

    if let Some((name, token)) = auth {
        if !merged.iter().any(|(key, _)| key.eq_ignore_ascii_case(name)) {
            merged.push((name.to_string(), token.to_string()));
        }
    }

    merged
}
