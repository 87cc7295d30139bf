/// Namespace every exported metric name lives under.
pub const PREFIX: &str = "typesense_";

/// Turns an arbitrary upstream JSON key into a valid metric name.
///
/// Lower-cases, maps everything outside `[a-z0-9_]` to `_`, collapses
/// runs of underscores and prepends [`PREFIX`] unless the key already
/// carries it. Never fails: a key made only of punctuation becomes an
/// all-underscore tail. Applying it to its own output is a no-op.
pub fn sanitize(key: &str) -> String {
    let mut body: String = key
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if body.starts_with(|c: char| c.is_ascii_digit()) {
        body.insert(0, '_');
    }

    let full = if body.starts_with(PREFIX) {
        body
    } else {
        format!("{PREFIX}{body}")
    };

    collapse_underscores(&full)
}

/// Joins an already-sanitized parent name with a raw child key.
pub fn join(parent: &str, key: &str) -> String {
    sanitize(&format!("{parent}_{key}"))
}

fn collapse_underscores(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_underscore = false;
    for c in s.chars() {
        if c == '_' {
            if !prev_underscore {
                out.push(c);
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }
    out
}
