use std::fmt;

/// Audience of a published video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Friends,
    Private,
}

impl Visibility {
    /// Parse a visibility name, case-insensitively; anything unrecognized is `Public`
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "friends" => Self::Friends,
            "private" => Self::Private,
            _ => Self::Public,
        }
    }

    /// Numeric `privacy_level` sent to the publish endpoints
    pub const fn code(self) -> u8 {
        match self {
            Self::Public => 0,
            Self::Friends => 1,
            Self::Private => 2,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Public => "public",
            Self::Friends => "friends",
            Self::Private => "private",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(Visibility::parse("public").code(), 0);
        assert_eq!(Visibility::parse("friends").code(), 1);
        assert_eq!(Visibility::parse("private").code(), 2);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(Visibility::parse("PRIVATE"), Visibility::Private);
        assert_eq!(Visibility::parse("Friends"), Visibility::Friends);
    }

    #[test]
    fn unknown_defaults_to_public() {
        assert_eq!(Visibility::parse("unlisted").code(), 0);
        assert_eq!(Visibility::parse("").code(), 0);
        assert_eq!(Visibility::parse(" private"), Visibility::Public);
    }
}
