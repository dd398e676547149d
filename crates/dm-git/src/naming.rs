//! Remote repository naming and URL forms

/// Characters a hosted repository name may contain besides ASCII alphanumerics.
const NAME_PUNCTUATION: [char; 3] = ['.', '_', '-'];

/// Whether `name` is acceptable as a hosted repository name.
pub fn is_valid_repo_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || NAME_PUNCTUATION.contains(&c))
}

/// Turn one path segment into something a repository host accepts.
///
/// Unsupported characters collapse into a single dash. Leading and trailing
/// dashes are removed.
pub fn sanitize_segment(segment: &str) -> String {
    let mut result = String::with_capacity(segment.len());
    let mut last_was_dash = true; // Start true to skip leading dashes

    for c in segment.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
            result.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Remote repository name for the container at `key` below the container
/// published as `base`.
///
/// The container itself (`"."`) keeps `base`. Nested containers append their
/// key segments, each prefixed with a dash, so every container in a tree maps
/// to a distinct flat repository name.
pub fn sibling_repo_name(base: &str, key: &str) -> String {
    let mut name = base.to_string();
    for segment in dm_fs::key_segments(key) {
        let segment = sanitize_segment(segment);
        if !segment.is_empty() {
            name.push('-');
            name.push_str(&segment);
        }
    }
    name
}

/// Rewrite an SSH remote URL to its HTTPS form.
///
/// `user@host:path[.git]` becomes `https://host/path`. URLs that are not in
/// the scp-like SSH form are returned unchanged.
pub fn ssh_to_https(url: &str) -> String {
    if url.contains("://") {
        return url.to_string();
    }
    let Some((user_host, path)) = url.split_once(':') else {
        return url.to_string();
    };
    let Some((_, host)) = user_host.split_once('@') else {
        return url.to_string();
    };
    if host.is_empty() {
        return url.to_string();
    }

    let path = path.trim_start_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    format!("https://{host}/{path}")
}

/// Whether `url` uses the scp-like SSH form.
pub fn is_ssh_url(url: &str) -> bool {
    ssh_to_https(url) != url
}
