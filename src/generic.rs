//! The generic domain: portable POSIX-style error codes.
//!
//! [`Errc`] uses the Linux numbering for its discriminants, and its messages
//! are the standard descriptions of those codes.

use core::fmt;

use errdom_internals::{
    shared_string::SharedString,
    value::{Numeric, NumericPayload, Payload},
};

use crate::{DomainId, Error, ErrorDomain};

/// Fallback text for a code that has no description.
pub(crate) const UNSPECIFIED_ERROR: &str = "Unspecified error";

macro_rules! errc {
    ($($name:ident = $value:literal => $message:literal,)*) => {
        /// A portable error condition.
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[repr(i32)]
        #[non_exhaustive]
        pub enum Errc {
            $(
                #[doc = $message]
                $name = $value,
            )*
        }

        impl Errc {
            /// Returns the condition with the raw OS error code `code`, using
            /// the Linux numbering.
            pub const fn from_raw_os_error(code: i32) -> Option<Self> {
                match code {
                    $($value => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// Returns the standard description of this condition.
            pub const fn message(self) -> &'static str {
                match self {
                    $(Self::$name => $message,)*
                }
            }
        }
    };
}

errc! {
    OperationNotPermitted = 1 => "Operation not permitted",
    NoSuchFileOrDirectory = 2 => "No such file or directory",
    NoSuchProcess = 3 => "No such process",
    Interrupted = 4 => "Interrupted system call",
    IoError = 5 => "Input/output error",
    NoSuchDeviceOrAddress = 6 => "No such device or address",
    ArgumentListTooLong = 7 => "Argument list too long",
    ExecutableFormatError = 8 => "Exec format error",
    BadFileDescriptor = 9 => "Bad file descriptor",
    NoChildProcess = 10 => "No child processes",
    ResourceUnavailableTryAgain = 11 => "Resource temporarily unavailable",
    NotEnoughMemory = 12 => "Cannot allocate memory",
    PermissionDenied = 13 => "Permission denied",
    BadAddress = 14 => "Bad address",
    DeviceOrResourceBusy = 16 => "Device or resource busy",
    FileExists = 17 => "File exists",
    CrossDeviceLink = 18 => "Invalid cross-device link",
    NoSuchDevice = 19 => "No such device",
    NotADirectory = 20 => "Not a directory",
    IsADirectory = 21 => "Is a directory",
    InvalidArgument = 22 => "Invalid argument",
    TooManyFilesOpenInSystem = 23 => "Too many open files in system",
    TooManyFilesOpen = 24 => "Too many open files",
    InappropriateIoControlOperation = 25 => "Inappropriate ioctl for device",
    TextFileBusy = 26 => "Text file busy",
    FileTooLarge = 27 => "File too large",
    NoSpaceOnDevice = 28 => "No space left on device",
    InvalidSeek = 29 => "Illegal seek",
    ReadOnlyFileSystem = 30 => "Read-only file system",
    TooManyLinks = 31 => "Too many links",
    BrokenPipe = 32 => "Broken pipe",
    ArgumentOutOfDomain = 33 => "Numerical argument out of domain",
    ResultOutOfRange = 34 => "Numerical result out of range",
    ResourceDeadlockWouldOccur = 35 => "Resource deadlock avoided",
    FilenameTooLong = 36 => "File name too long",
    NoLockAvailable = 37 => "No locks available",
    FunctionNotSupported = 38 => "Function not implemented",
    DirectoryNotEmpty = 39 => "Directory not empty",
    TooManySymbolicLinkLevels = 40 => "Too many levels of symbolic links",
    NoMessage = 42 => "No message of desired type",
    IdentifierRemoved = 43 => "Identifier removed",
    NotAStream = 60 => "Device not a stream",
    NoMessageAvailable = 61 => "No data available",
    StreamTimeout = 62 => "Timer expired",
    NoStreamResources = 63 => "Out of streams resources",
    NoLink = 67 => "Link has been severed",
    ProtocolError = 71 => "Protocol error",
    BadMessage = 74 => "Bad message",
    ValueTooLarge = 75 => "Value too large for defined data type",
    IllegalByteSequence = 84 => "Invalid or incomplete multibyte or wide character",
    NotASocket = 88 => "Socket operation on non-socket",
    DestinationAddressRequired = 89 => "Destination address required",
    MessageSize = 90 => "Message too long",
    WrongProtocolType = 91 => "Protocol wrong type for socket",
    NoProtocolOption = 92 => "Protocol not available",
    ProtocolNotSupported = 93 => "Protocol not supported",
    NotSupported = 95 => "Operation not supported",
    AddressFamilyNotSupported = 97 => "Address family not supported by protocol",
    AddressInUse = 98 => "Address already in use",
    AddressNotAvailable = 99 => "Cannot assign requested address",
    NetworkDown = 100 => "Network is down",
    NetworkUnreachable = 101 => "Network is unreachable",
    NetworkReset = 102 => "Network dropped connection on reset",
    ConnectionAborted = 103 => "Software caused connection abort",
    ConnectionReset = 104 => "Connection reset by peer",
    NoBufferSpace = 105 => "No buffer space available",
    AlreadyConnected = 106 => "Transport endpoint is already connected",
    NotConnected = 107 => "Transport endpoint is not connected",
    TimedOut = 110 => "Connection timed out",
    ConnectionRefused = 111 => "Connection refused",
    HostUnreachable = 113 => "No route to host",
    ConnectionAlreadyInProgress = 114 => "Operation already in progress",
    OperationInProgress = 115 => "Operation now in progress",
    OperationCanceled = 125 => "Operation canceled",
    OwnerDead = 130 => "Owner died",
    StateNotRecoverable = 131 => "State not recoverable",
}

impl Errc {
    /// The alias of [`Errc::NotSupported`] for operations on sockets.
    pub const OPERATION_NOT_SUPPORTED: Self = Self::NotSupported;

    /// The alias of [`Errc::ResourceUnavailableTryAgain`] for non-blocking
    /// operations.
    pub const OPERATION_WOULD_BLOCK: Self = Self::ResourceUnavailableTryAgain;

    /// Returns the raw Linux error number of this condition.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Returns the condition closest to an I/O error kind, if there is one.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn from_io_error_kind(kind: std::io::ErrorKind) -> Option<Self> {
        use std::io::ErrorKind;

        Some(match kind {
            ErrorKind::NotFound => Self::NoSuchFileOrDirectory,
            ErrorKind::PermissionDenied => Self::PermissionDenied,
            ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            ErrorKind::ConnectionReset => Self::ConnectionReset,
            ErrorKind::HostUnreachable => Self::HostUnreachable,
            ErrorKind::NetworkUnreachable => Self::NetworkUnreachable,
            ErrorKind::ConnectionAborted => Self::ConnectionAborted,
            ErrorKind::NotConnected => Self::NotConnected,
            ErrorKind::AddrInUse => Self::AddressInUse,
            ErrorKind::AddrNotAvailable => Self::AddressNotAvailable,
            ErrorKind::NetworkDown => Self::NetworkDown,
            ErrorKind::BrokenPipe => Self::BrokenPipe,
            ErrorKind::AlreadyExists => Self::FileExists,
            ErrorKind::WouldBlock => Self::ResourceUnavailableTryAgain,
            ErrorKind::NotADirectory => Self::NotADirectory,
            ErrorKind::IsADirectory => Self::IsADirectory,
            ErrorKind::DirectoryNotEmpty => Self::DirectoryNotEmpty,
            ErrorKind::ReadOnlyFilesystem => Self::ReadOnlyFileSystem,
            ErrorKind::InvalidInput => Self::InvalidArgument,
            ErrorKind::InvalidData => Self::BadMessage,
            ErrorKind::TimedOut => Self::TimedOut,
            ErrorKind::WriteZero => Self::IoError,
            ErrorKind::StorageFull => Self::NoSpaceOnDevice,
            ErrorKind::NotSeekable => Self::InvalidSeek,
            ErrorKind::FileTooLarge => Self::FileTooLarge,
            ErrorKind::ResourceBusy => Self::DeviceOrResourceBusy,
            ErrorKind::ExecutableFileBusy => Self::TextFileBusy,
            ErrorKind::Deadlock => Self::ResourceDeadlockWouldOccur,
            ErrorKind::CrossesDevices => Self::CrossDeviceLink,
            ErrorKind::TooManyLinks => Self::TooManyLinks,
            ErrorKind::InvalidFilename => Self::FilenameTooLong,
            ErrorKind::ArgumentListTooLong => Self::ArgumentListTooLong,
            ErrorKind::Interrupted => Self::Interrupted,
            ErrorKind::Unsupported => Self::FunctionNotSupported,
            ErrorKind::UnexpectedEof => Self::IoError,
            ErrorKind::OutOfMemory => Self::NotEnoughMemory,
            _ => return None,
        })
    }
}

impl NumericPayload for Errc {
    #[inline]
    fn into_code(self) -> isize {
        self as isize
    }

    fn from_code(code: isize) -> Self {
        match i32::try_from(code).ok().and_then(Self::from_raw_os_error) {
            Some(errc) => errc,
            None => unreachable!("{code} is not the code of an `Errc`"),
        }
    }
}

impl Payload for Errc {
    type Storage = Numeric;
}

impl fmt::Display for Errc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl core::error::Error for Errc {}

/// The domain of [`Errc`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct GenericDomain;

impl ErrorDomain for GenericDomain {
    type Value = Errc;

    const ID: DomainId = DomainId::new(0x746d_7e9a_35f1_a9c2, 0x5f2b_8d4c_0e16_47a3);

    fn name() -> &'static str {
        "generic domain"
    }

    fn equivalent(lhs: &Errc, rhs: &Error) -> bool {
        rhs.value_in::<GenericDomain>()
            .is_some_and(|rhs| *rhs == *lhs)
    }

    fn message(value: &Errc) -> SharedString {
        SharedString::from_static(value.message())
    }
}

impl From<Errc> for Error {
    #[inline]
    fn from(errc: Errc) -> Self {
        Error::new::<GenericDomain>(errc)
    }
}

/// Converts an I/O error.
///
/// An error carrying a raw OS code becomes a [`SystemCategory`] code in the
/// legacy domain, which stays equivalent to the matching [`Errc`]. Any other
/// error becomes the [`Errc`] closest to its kind.
///
/// [`SystemCategory`]: crate::SystemCategory
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        if let Some(code) = error.raw_os_error() {
            return crate::ErrorCode::new(code, &crate::SystemCategory).into();
        }
        Error::from(Errc::from_io_error_kind(error.kind()).unwrap_or(Errc::IoError))
    }
}
