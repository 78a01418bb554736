//! Character set of the host locale
//!
//! POSIX locale names look like `language[_territory][.codeset][@modifier]`.
//! The first non-empty of `LC_ALL`, `LC_CTYPE` and `LANG` wins.

/// Codeset used when the locale names none
pub const DEFAULT_CODESET: &str = "UTF-8";

const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_CTYPE", "LANG"];

/// Character set name of the current locale
pub fn current_codeset() -> String {
    codeset_from(|var| std::env::var(var).ok())
}

fn codeset_from(lookup: impl Fn(&str) -> Option<String>) -> String {
    LOCALE_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .find(|value| !value.is_empty())
        .map_or_else(|| DEFAULT_CODESET.to_owned(), |locale| codeset_of(&locale))
}

/// Extract the codeset of one locale name
pub fn codeset_of(locale: &str) -> String {
    if locale == "C" || locale == "POSIX" {
        return "US-ASCII".to_owned();
    }

    locale
        .split_once('.')
        .map(|(_, rest)| rest.split('@').next().unwrap_or(rest))
        .filter(|codeset| !codeset.is_empty())
        .unwrap_or(DEFAULT_CODESET)
        .to_owned()
}
