//! A user-defined domain whose payload is shared through an intrusive pointer,
//! and a `thiserror` type plugged in through `IntoError`.

use errdom::{
    Counted, DomainId, Errc, Error, ErrorDomain, IntoError, IntrusivePtr, ResultExt, SharedString,
};

/// A parse failure with its location.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: {reason}")]
struct ParseError {
    line: u32,
    reason: String,
}

/// Parse failures, shared between copies of the error.
struct ParseDomain;

impl ErrorDomain for ParseDomain {
    type Value = IntrusivePtr<Counted<ParseError>>;

    const ID: DomainId = DomainId::from_u128(0x9b1c_52e7_d840_4a6f_b3a9_0c1d_e2f5_7a86);

    fn name() -> &'static str {
        "parse domain"
    }

    fn equivalent(lhs: &Self::Value, rhs: &Error) -> bool {
        if let Some(other) = rhs.value_in::<ParseDomain>() {
            return match (lhs.get(), other.get()) {
                (Some(a), Some(b)) => **a == **b,
                _ => false,
            };
        }
        *rhs == Errc::InvalidArgument
    }

    fn message(value: &Self::Value) -> SharedString {
        match value.get() {
            Some(error) => SharedString::from(error.to_string()),
            None => SharedString::from_static("unknown parse error"),
        }
    }
}

impl IntoError for ParseError {
    fn into_error(self) -> Error {
        Error::new::<ParseDomain>(IntrusivePtr::new(Counted::new(self)))
    }
}

fn parse(input: &str) -> Result<u32, ParseError> {
    input.trim().parse().map_err(|_| ParseError {
        line: 1,
        reason: format!("{input:?} is not a number"),
    })
}

#[test]
fn test_thiserror_type_into_error() {
    let error = parse("twelve").map_into_error().unwrap_err();
    assert_eq!(error.domain().name(), "parse domain");
    assert_eq!(error.message(), r#"line 1: "twelve" is not a number"#);
    assert!(error == Errc::InvalidArgument);
    assert!(Errc::InvalidArgument == error);
    assert!(error != Errc::BadMessage);
    assert_eq!(parse(" 12 ").map_into_error().ok(), Some(12));
}

#[test]
fn test_payload_is_shared_between_copies() {
    let error = Error::from_value(ParseError {
        line: 3,
        reason: String::from("unexpected token"),
    });
    let copy = error.clone();
    let handle = copy
        .cast_ref::<IntrusivePtr<Counted<ParseError>>>()
        .expect("parse payload");
    assert_eq!(handle.use_count(), 2);
    assert!(copy == error);

    let other = Error::from_value(ParseError {
        line: 4,
        reason: String::from("unexpected token"),
    });
    assert!(other != error);
}

#[test]
fn test_errors_compose_with_std_error() {
    fn boxed() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Error::from(Errc::FileExists))?;
        Ok(())
    }

    let error = boxed().unwrap_err();
    assert_eq!(error.to_string(), "File exists");
    assert!(error.downcast_ref::<Error>().is_some_and(|e| *e == Errc::FileExists));
}
