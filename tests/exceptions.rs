//! Capturing, classifying and re-raising panics.
#![cfg(feature = "std")]

use std::panic::{self, AssertUnwindSafe};

use errdom::{
    Errc, Error, ErrorCode, Exception, ExceptionErrc, ExceptionKind, ExceptionPtr,
    LegacyCodeDomain, NativeExceptionDomain, ResultExt, SystemCategory, ThrownError,
    exception::classify,
};

/// Runs `f` with the default panic hook silenced.
fn quietly<R>(f: impl FnOnce() -> R) -> R {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = f();
    panic::set_hook(hook);
    result
}

#[test]
fn test_capture_classify_and_rethrow() {
    let caught = quietly(|| {
        ExceptionPtr::catch(|| Exception::invalid_argument("X").raise())
    })
    .expect_err("the closure raises");

    assert_eq!(classify(&caught), ErrorCode::from(ExceptionErrc::InvalidArgument));

    let error = Error::from(caught.clone());
    assert!(error.domain().is::<NativeExceptionDomain>());
    assert_eq!(error.message(), "X");
    assert!(error == Errc::InvalidArgument);

    let payload = quietly(|| panic::catch_unwind(AssertUnwindSafe(|| error.throw_exception())))
        .expect_err("throwing always unwinds");
    let exception = payload
        .downcast::<Exception>()
        .expect("the original payload is raised again");
    assert_eq!(exception.kind(), ExceptionKind::InvalidArgument);
    assert_eq!(exception.message(), "X");

    let again = Error::from(ExceptionPtr::new(*exception));
    assert!(again == error);
    assert!(again == Errc::InvalidArgument);
}

#[test]
fn test_opaque_payloads_keep_identity_when_rethrown() {
    let caught = ExceptionPtr::new(vec![1_u8, 2, 3]);
    let error = Error::from(caught.clone());
    assert_eq!(error.message(), "Unknown dynamic exception");

    let again = quietly(|| ExceptionPtr::catch(AssertUnwindSafe(|| error.throw_exception())))
        .expect_err("throwing always unwinds");
    assert!(again.ptr_eq(&caught));
    assert!(Error::from(again) == error);
}

#[test]
fn test_panic_messages_become_errors() {
    let caught = quietly(|| ExceptionPtr::catch(|| panic!("disk on fire: {}", 3)))
        .expect_err("the closure panics");
    let error = Error::from(caught);
    assert_eq!(error.message(), "disk on fire: 3");
    assert!(error != Errc::IoError);
    assert!(error == error.clone());
}

#[test]
fn test_system_exception_equivalence() {
    let code = ErrorCode::new(12, &SystemCategory);
    let caught = quietly(|| ExceptionPtr::catch(AssertUnwindSafe(|| Exception::system(code).raise())))
        .expect_err("the closure raises");
    let error = Error::from(caught);
    assert_eq!(classify(&error.cast::<ExceptionPtr>().expect("native payload")), code);
    #[cfg(target_os = "linux")]
    assert!(error == Errc::NotEnoughMemory);
    assert!(error == Error::from(code));
}

#[test]
fn test_legacy_errors_raise_system_exceptions() {
    let error = Error::from(ErrorCode::new(4242, &SystemCategory));
    assert!(error.domain().is::<LegacyCodeDomain>());

    let caught = quietly(|| ExceptionPtr::catch(AssertUnwindSafe(|| error.throw_exception())))
        .expect_err("throwing always unwinds");
    let kind = caught.with_downcast(|exception: &Exception| (exception.kind(), exception.code()));
    assert_eq!(
        kind,
        Some((ExceptionKind::System, Some(ErrorCode::new(4242, &SystemCategory))))
    );
    assert!(Error::from(caught) == error);
}

#[test]
fn test_generic_errors_round_trip_through_panics() {
    let error = Error::from(Errc::ConnectionReset);
    let caught = quietly(|| ExceptionPtr::catch(AssertUnwindSafe(|| error.throw_exception())))
        .expect_err("throwing always unwinds");
    assert!(caught.is::<ThrownError>());

    let back = Error::from(caught);
    assert!(back.domain().is::<errdom::GenericDomain>());
    assert!(back == error);
}

#[test]
fn test_or_throw() {
    let ok: Result<u8, Errc> = Ok(1);
    assert_eq!(ok.or_throw(), 1);

    let failed: Result<u8, Errc> = Err(Errc::TimedOut);
    let caught = quietly(|| ExceptionPtr::catch(|| failed.or_throw())).expect_err("raises");
    assert!(Error::from(caught) == Errc::TimedOut);
}

#[test]
fn test_threads_share_captured_panics() {
    let caught = quietly(|| {
        std::thread::spawn(|| Exception::range_error("too far").raise())
            .join()
            .map_err(ExceptionPtr::from_payload)
    })
    .expect_err("the thread raises");
    let error = Error::from(caught);

    let copies: Vec<_> = (0..4)
        .map(|_| {
            let error = error.clone();
            std::thread::spawn(move || error == Errc::ResultOutOfRange)
        })
        .collect();
    for copy in copies {
        assert!(copy.join().expect("no panic"));
    }
}
