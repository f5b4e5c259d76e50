use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The requested datum is absent by design (no GC on a one-day race, a
    /// cancelled edition without an edition number, ...)
    #[error("expected parsing error: {0}")]
    Expected(String),
    /// The page doesn't have the structure the extractor relies on
    #[error("unexpected parsing error: {0}")]
    Unexpected(String),
    /// Invalid input: unknown reference, unknown field name, broken join key
    #[error("invalid value: {0}")]
    Value(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Expected,
    Unexpected,
    Value,
}

impl Error {
    pub fn expected(msg: impl fmt::Display) -> Self {
        Error::Expected(msg.to_string())
    }

    pub fn unexpected(msg: impl fmt::Display) -> Self {
        Error::Unexpected(msg.to_string())
    }

    pub fn value(msg: impl fmt::Display) -> Self {
        Error::Value(msg.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Expected(_) => ErrorKind::Expected,
            Error::Unexpected(_) => ErrorKind::Unexpected,
            Error::Value(_) => ErrorKind::Value,
        }
    }

    /// Turns "the data isn't there" into a structural failure, used for
    /// extractors whose data must always be present.
    pub(crate) fn into_unexpected(self) -> Self {
        match self {
            Error::Expected(msg) => Error::Unexpected(msg),
            other => other,
        }
    }
}

#[test]
fn test_required_reclassification() {
    assert_eq!(
        Error::expected("no h1").into_unexpected(),
        Error::Unexpected("no h1".to_string())
    );
    assert_eq!(
        Error::value("bad").into_unexpected().kind(),
        ErrorKind::Value
    );
}
