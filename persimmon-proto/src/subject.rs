use std::{
    fmt::{self, Display},
    ops::Deref,
    str::FromStr,
};

use bytestring::ByteString;

/// Longest subject the checked constructors accept, in bytes.
const MAX_LEN: usize = 256;

/// The interest pattern of a subscription, or the stream a message
/// belongs to
///
/// A subject is a `.`-separated sequence of non-empty tokens, like
/// `events.orders.created`. The wildcard tokens `*` and `>` are carried
/// through unchanged; matching them against concrete subjects is the
/// server's job, not the client's.
///
/// The checked constructors ([`Subject::from_static`], [`FromStr`] and
/// the `TryFrom` implementations) reject values that would corrupt the
/// framing of the connection: empty strings, whitespace, empty tokens
/// and anything longer than 256 bytes. Subjects read off the wire can
/// skip the checks through [`Subject::new_unchecked`], since the server
/// already framed them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Subject(ByteString);

impl Subject {
    /// Construct a `Subject` from a string literal
    ///
    /// # Panics
    ///
    /// Panics if the literal is not a well formed subject.
    #[must_use]
    pub fn from_static(value: &'static str) -> Self {
        match Self::try_from(ByteString::from_static(value)) {
            Ok(subject) => subject,
            Err(err) => panic!("malformed subject literal {value:?}: {err}"),
        }
    }

    /// Wrap a string already known to hold a well formed subject
    ///
    /// Nothing is validated outside debug builds. Handing the server a
    /// malformed subject can break the framing of the whole connection,
    /// so this is only meant for values the server itself produced or
    /// that were checked beforehand.
    #[must_use]
    pub fn new_unchecked(value: ByteString) -> Self {
        debug_assert!(
            validate(&value).is_ok(),
            "Subject::new_unchecked got a malformed subject: {value:?}"
        );
        Self(value)
    }

    /// View the subject as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Subject {
    type Err = SubjectValidateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        validate(value)?;
        Ok(Self(ByteString::from(value.to_owned())))
    }
}

impl TryFrom<ByteString> for Subject {
    type Error = SubjectValidateError;

    fn try_from(value: ByteString) -> Result<Self, Self::Error> {
        validate(&value).map(|()| Self(value))
    }
}

impl TryFrom<String> for Subject {
    type Error = SubjectValidateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value).map(|()| Self(value.into()))
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for Subject {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// An error encountered while validating [`Subject`]
#[derive(Debug, thiserror::Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum SubjectValidateError {
    /// The value is empty
    #[error("empty subject")]
    Empty,
    /// The value is longer than 256 bytes
    #[error("subject exceeds 256 bytes")]
    TooLong,
    /// The value contains a whitespace character
    #[error("whitespace in subject")]
    IllegalCharacter,
    /// The value contains an empty `.`-separated token
    #[error("empty token in subject")]
    EmptyToken,
}

fn validate(subject: &str) -> Result<(), SubjectValidateError> {
    match subject {
        "" => return Err(SubjectValidateError::Empty),
        s if s.len() > MAX_LEN => return Err(SubjectValidateError::TooLong),
        _ => {}
    }

    for token in subject.split('.') {
        if token.is_empty() {
            return Err(SubjectValidateError::EmptyToken);
        }
        if token.chars().any(char::is_whitespace) {
            return Err(SubjectValidateError::IllegalCharacter);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok};

    use super::{Subject, SubjectValidateError};

    #[test]
    fn valid_subjects() {
        let subjects = [
            "events",
            "events.orders",
            "events.orders.created",
            "events.*.created",
            "events.orders.>",
        ];
        for subject in subjects {
            let s = assert_ok!(subject.parse::<Subject>());
            assert_eq!(subject, s.as_str());
        }
    }

    #[test]
    fn invalid_subjects() {
        let long = "x".repeat(257);
        let subjects = [
            ("", SubjectValidateError::Empty),
            (long.as_str(), SubjectValidateError::TooLong),
            ("events ", SubjectValidateError::IllegalCharacter),
            (" events", SubjectValidateError::IllegalCharacter),
            ("events .orders", SubjectValidateError::IllegalCharacter),
            ("events\t.orders", SubjectValidateError::IllegalCharacter),
            ("events.or ders", SubjectValidateError::IllegalCharacter),
            ("events.orders\n", SubjectValidateError::IllegalCharacter),
            (" ", SubjectValidateError::IllegalCharacter),
            ("events..orders", SubjectValidateError::EmptyToken),
            (".events", SubjectValidateError::EmptyToken),
            ("events.", SubjectValidateError::EmptyToken),
            (".", SubjectValidateError::EmptyToken),
        ];
        for (subject, expected_err) in subjects {
            let err = assert_err!(subject.parse::<Subject>());
            assert_eq!(expected_err, err);
        }
    }
}
