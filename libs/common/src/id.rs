use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = chat_common::id::prefixed_ulid("usr");
/// assert!(id.starts_with("usr_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Short, human-friendly suffix of a prefixed ULID.
///
/// Takes the trailing characters, which come from the ULID's random part, so
/// two IDs minted in the same millisecond still get distinct short forms.
///
/// # Examples
/// ```
/// let short = chat_common::id::short_id("usr_01HZX3M4K7QWERTYASDFGHJKLZ");
/// assert_eq!(short, "DFGHJKLZ");
/// ```
pub fn short_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    let start = chars.len().saturating_sub(SHORT_ID_LEN);
    chars[start..].iter().collect()
}

/// Number of characters kept by [`short_id`].
pub const SHORT_ID_LEN: usize = 8;

/// Marker trait for types that represent a prefixed ID.
pub trait PrefixedId {
    const PREFIX: &'static str;

    fn generate() -> String {
        prefixed_ulid(Self::PREFIX)
    }
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const USER: &str = "usr";
    pub const MESSAGE: &str = "msg";
    pub const CONNECTION: &str = "conn";
}
