pub use crate::storage::StorageError;
use grainfall_concepts::errors::*;
use core::any::type_name;
use core::fmt::Display;

use crossbeam_channel::{RecvError, SendError};

macro_rules! impl_error_variant {
    ($name: ident, $($err_var: ident),+) => {
        // Implement Display for ErrorVariant
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        $name::$err_var(message) => write!(f, "{}", message),
                    )+
                }
            }
        }
    }
}

macro_rules! impl_from_error {
    ($name: ident, $(($err_var: ident, $err_type: ty)),+) => {
        $(
            // Implement conversion from error to errorvariant
            impl From<$err_type> for $name {
                fn from(err: $err_type) -> Self {
                    $name::$err_var(err)
                }
            }
        )+
    }
}

/// Covers all errors that can occur while relaxing a board
///
/// The errors are listed from very likely to be a user error to almost certainly an
/// internal error.
/// Violated invariants of the relaxation itself (a cell holding 4 or more grains after
/// relaxation claims to be done, grains appearing or vanishing during a merge) are not
/// represented here. They indicate a bug and abort the program.
#[derive(Debug)]
pub enum RelaxationError {
    // Very likely to be user errors
    /// Invalid parameters such as a worker count of zero
    SetupError(SetupError),
    /// Boards which do not have the expected shape
    ShapeError(ShapeError),
    /// Failed to split the board into row bands
    DecomposeError(DecomposeError),
    /// Progress bar could not be created or updated
    TimeError(TimeError),

    // Less likely but possible to be user errors
    /// Sending information between threads fails
    SendError(String),
    /// Receiving information from another thread fails
    ReceiveError(RecvError),
    /// Storing results fails
    StorageError(StorageError),

    // Highly unlikely to be user errors
    /// Mostly caused by reports which do not fit to any partition
    IndexError(IndexError),
    /// Spawning threads or writing to the terminal
    IoError(std::io::Error),
    /// Errors surrounding construction of [rayon::ThreadPool].
    ThreadingError(rayon::ThreadPoolBuildError),
}

impl_from_error! {RelaxationError,
    (SetupError, SetupError),
    (ShapeError, ShapeError),
    (DecomposeError, DecomposeError),
    (TimeError, TimeError),
    (ReceiveError, RecvError),
    (StorageError, StorageError),
    (IndexError, IndexError),
    (IoError, std::io::Error),
    (ThreadingError, rayon::ThreadPoolBuildError)
}

impl_error_variant! {RelaxationError,
    SetupError,
    ShapeError,
    DecomposeError,
    TimeError,
    SendError,
    ReceiveError,
    StorageError,
    IndexError,
    IoError,
    ThreadingError
}

// Implement the general error property
impl std::error::Error for RelaxationError {}

// Implement conversion from Sending error manually
impl<T> From<SendError<T>> for RelaxationError {
    fn from(_err: SendError<T>) -> Self {
        RelaxationError::SendError(format!(
            "Error sending object of type {}",
            type_name::<T>()
        ))
    }
}
