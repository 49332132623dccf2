use std::{
    fmt::{self, Display},
    ops::Deref,
    str::FromStr,
};

use bytestring::ByteString;

/// Longest queue group name the checked constructors accept, in bytes.
const MAX_LEN: usize = 64;

/// The name of a queue group
///
/// Subscriptions to the same subject that share a `QueueGroup` form a
/// load balancing group: the server picks one member per message
/// instead of fanning out to all of them.
///
/// The name is opaque to the client. The checked constructors
/// ([`QueueGroup::from_static`], [`FromStr`] and the `TryFrom`
/// implementations) only reject values that would corrupt the framing
/// of the connection: empty strings, whitespace and anything longer
/// than 64 bytes. Names read off the wire can skip the checks through
/// [`QueueGroup::new_unchecked`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueueGroup(ByteString);

impl QueueGroup {
    /// Construct a `QueueGroup` from a string literal
    ///
    /// # Panics
    ///
    /// Panics if the literal is not a well formed queue group name.
    #[must_use]
    pub fn from_static(value: &'static str) -> Self {
        match Self::try_from(ByteString::from_static(value)) {
            Ok(queue_group) => queue_group,
            Err(err) => panic!("malformed queue group literal {value:?}: {err}"),
        }
    }

    /// Wrap a string already known to hold a well formed queue group
    /// name
    ///
    /// Nothing is validated outside debug builds. Handing the server a
    /// malformed name can break the framing of the whole connection, so
    /// this is only meant for values the server itself produced or that
    /// were checked beforehand.
    #[must_use]
    pub fn new_unchecked(value: ByteString) -> Self {
        debug_assert!(
            validate(&value).is_ok(),
            "QueueGroup::new_unchecked got a malformed name: {value:?}"
        );
        Self(value)
    }

    /// View the queue group name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for QueueGroup {
    type Err = QueueGroupValidateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        validate(value)?;
        Ok(Self(ByteString::from(value.to_owned())))
    }
}

impl TryFrom<ByteString> for QueueGroup {
    type Error = QueueGroupValidateError;

    fn try_from(value: ByteString) -> Result<Self, Self::Error> {
        validate(&value).map(|()| Self(value))
    }
}

impl TryFrom<String> for QueueGroup {
    type Error = QueueGroupValidateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value).map(|()| Self(value.into()))
    }
}

impl Display for QueueGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for QueueGroup {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// An error encountered while validating [`QueueGroup`]
#[derive(Debug, thiserror::Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum QueueGroupValidateError {
    /// The value is empty
    #[error("empty queue group name")]
    Empty,
    /// The value is longer than 64 bytes
    #[error("queue group name exceeds 64 bytes")]
    TooLong,
    /// The value contains a whitespace character
    #[error("whitespace in queue group name")]
    IllegalCharacter,
}

fn validate(queue_group: &str) -> Result<(), QueueGroupValidateError> {
    if queue_group.is_empty() {
        Err(QueueGroupValidateError::Empty)
    } else if queue_group.len() > MAX_LEN {
        Err(QueueGroupValidateError::TooLong)
    } else if queue_group.chars().any(char::is_whitespace) {
        Err(QueueGroupValidateError::IllegalCharacter)
    } else {
        Ok(())
    }
}
