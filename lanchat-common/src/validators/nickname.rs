//! Nickname validation
//!
//! Nicks are short ASCII identifiers: letters, digits, `-` and `_`.

/// Longest nick accepted, counted in characters
pub const MAX_NICKNAME_LENGTH: usize = 10;

/// Why a nick was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NicknameError {
    Empty,
    /// Longer than [`MAX_NICKNAME_LENGTH`]
    TooLong,
    /// Something other than ASCII letters, digits, `-` or `_`
    InvalidCharacters,
}

fn is_nick_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_')
}

/// Check that `nick` can be used on the network
///
/// The user code (eight digits) always passes, so it is a safe fallback
/// when a chosen nick is refused.
pub fn validate_nickname(nick: &str) -> Result<(), NicknameError> {
    match nick.chars().count() {
        0 => Err(NicknameError::Empty),
        n if n > MAX_NICKNAME_LENGTH => Err(NicknameError::TooLong),
        _ if !nick.chars().all(is_nick_char) => Err(NicknameError::InvalidCharacters),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_nicks() {
        for nick in ["tina", "Peter2", "x_y", "dash-it", "12345678", "abcdefghij"] {
            assert_eq!(validate_nickname(nick), Ok(()), "{nick}");
        }
    }

    #[test]
    fn test_rejects_empty_and_long() {
        assert_eq!(validate_nickname(""), Err(NicknameError::Empty));
        assert_eq!(
            validate_nickname("abcdefghijk"),
            Err(NicknameError::TooLong)
        );
    }

    #[test]
    fn test_rejects_other_characters() {
        for nick in ["two words", "a:b", "hash#", "bjørn", "tab\t"] {
            assert_eq!(
                validate_nickname(nick),
                Err(NicknameError::InvalidCharacters),
                "{nick}"
            );
        }
    }
}
