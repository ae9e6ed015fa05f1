//! Key-value wire codec.
//!
//! Protocol messages are plain text of the form `?key=value&key=value...`.
//! No escaping is performed anywhere: keys and values must not contain the
//! pair separator `&` or `=`. Likewise, a key that is a substring of another
//! key or of a value will confuse [`extract`]; callers must pick
//! distinguishing key names. These are documented limitations of the wire
//! format, not bugs.

/// Separator between `key=value` pairs.
pub const PAIR_SEPARATOR: char = '&';

/// Leading marker every protocol message starts with.
pub const MARKER: char = '?';

/// Builds `prefix + "&k1=v1&k2=v2..."` preserving the iteration order of
/// `pairs`.
pub fn encode<'a, I>(pairs: I, prefix: &str) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::from(prefix);
    for (key, value) in pairs {
        out.push(PAIR_SEPARATOR);
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out
}

/// Returns the value of the first `key=` occurrence in `source`, up to the
/// next `separator` or the end of the string. Empty string when the key is
/// absent.
pub fn extract(source: &str, key: &str, separator: char) -> String {
    let needle = [key, "="].concat();
    match source.find(&needle) {
        Some(pos) => {
            let rest = &source[pos + needle.len()..];
            match rest.find(separator) {
                Some(end) => rest[..end].to_string(),
                None => rest.to_string(),
            }
        }
        None => String::new(),
    }
}

/// Splits on every occurrence of `separator`, keeping empty segments
/// (including a trailing one).
pub fn split(source: &str, separator: char) -> Vec<String> {
    source.split(separator).map(str::to_string).collect()
}
