use core::fmt::Display;
use std::error::Error;

macro_rules! define_errors {
    ($(($err_name: ident, $err_descr: expr)),+) => {
        $(
            #[doc = $err_descr]
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub struct $err_name(
                #[doc = "Error message associated with "]
                #[doc = stringify!($err_name)]
                #[doc = " error type."]
                pub String,
            );

            impl Display for $err_name {
                fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl Error for $err_name {}
        )+
    }
}

define_errors!(
    (
        SetupError,
        "Occurs when the parameters of a new run are invalid"
    ),
    (
        ShapeError,
        "Boards which are empty, not rectangular or do not match in size"
    ),
    (
        IndexError,
        "Can occur internally when information is not present at expected place"
    ),
    (TimeError, "Error related to displaying the progress of a run"),
    (DrawingError, "Used to catch errors related to plotting")
);

/// Error during decomposition of a [Board](crate::Board) into multiple row bands
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecomposeError {
    /// Generic error encountered during domain-decomposition
    Generic(String),
    /// [ShapeError] which is encountered during domain-decomposition
    ShapeError(ShapeError),
    /// [IndexError] encountered during domain-decomposition
    IndexError(IndexError),
}

impl Display for DecomposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DecomposeError::Generic(message) => write!(f, "{}", message),
            DecomposeError::ShapeError(error) => write!(f, "{}", error),
            DecomposeError::IndexError(error) => write!(f, "{}", error),
        }
    }
}

impl Error for DecomposeError {}

impl From<ShapeError> for DecomposeError {
    fn from(value: ShapeError) -> Self {
        DecomposeError::ShapeError(value)
    }
}

impl From<IndexError> for DecomposeError {
    fn from(value: IndexError) -> Self {
        DecomposeError::IndexError(value)
    }
}

impl From<String> for TimeError {
    fn from(value: String) -> Self {
        TimeError(value)
    }
}

impl From<ShapeError> for SetupError {
    fn from(value: ShapeError) -> Self {
        SetupError(format!("{}", value))
    }
}

impl From<ndarray::ShapeError> for ShapeError {
    fn from(value: ndarray::ShapeError) -> Self {
        ShapeError(format!("{}", value))
    }
}

#[cfg(feature = "plotters")]
impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for DrawingError
where
    E: Error + Send + Sync,
{
    fn from(drawing_error: plotters::drawing::DrawingAreaErrorKind<E>) -> DrawingError {
        DrawingError(drawing_error.to_string())
    }
}

/// For internal use: formats an error message to include a link to the bug tracker on github.
#[macro_export]
macro_rules! format_error_message(
    (@function) => {
        {
            fn f() {}
            let name = std::any::type_name_of_val(&f);
            name.strip_suffix("::f").unwrap_or(name)
        }
    };
    ($bug_title:expr, $error_msg:expr) => {
        {
        let __gf_private_error = {
            let title = $bug_title.replace(" ", "%20");
            let mut body = String::from($error_msg);
            body = body + &format!("%0A%0AFile: {}", file!());
            body = body + &format!("%0ALine: {}", line!());
            body = body + &format!("%0AColumn: {}", column!());
            body = body.replace(" ", "%20");
            format!("Internal Error in function {} file {}: +++ {} +++ Please file a bug-report: \
                https://github.com/jonaspleyer/grainfall/issues/new?\
                title={}&body={}",
                $crate::format_error_message!(@function),
                file!(),
                $error_msg,
                title,
                body,
            )
        };
        __gf_private_error
        }
    };
);
