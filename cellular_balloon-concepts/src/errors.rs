use core::fmt::Display;
use std::error::Error;

macro_rules! define_errors {
    ($(($err_name: ident, $err_descr: expr)),+) => {
        $(
            #[doc = $err_descr]
            #[derive(Debug, Clone, PartialEq)]
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
        "Occurs when constructing a contour or reading its parameters"
    ),
    (
        IndexError,
        "Can occur when a vertex index or the vertex arrays of a contour are inconsistent"
    ),
    (DrawingError, "Used to catch errors related to plotting")
);

impl From<IndexError> for SetupError {
    fn from(value: IndexError) -> Self {
        SetupError(format!("{}", value))
    }
}

impl From<ron::error::SpannedError> for SetupError {
    fn from(value: ron::error::SpannedError) -> Self {
        SetupError(format!("could not parse parameters: {}", value))
    }
}

impl From<ron::Error> for SetupError {
    fn from(value: ron::Error) -> Self {
        SetupError(format!("could not write parameters: {}", value))
    }
}

impl From<serde_json::Error> for SetupError {
    fn from(value: serde_json::Error) -> Self {
        SetupError(format!("could not parse parameters: {}", value))
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

/// For internal use: formats an error message to include a link to the bug tracker.
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
        let __cb_private_error = {
            let title = $bug_title.replace(" ", "%20");
            let mut body = String::from($error_msg);
            body = body + &format!("%0A%0AFile: {}", file!());
            body = body + &format!("%0ALine: {}", line!());
            body = body.replace(" ", "%20");
            format!("Internal Error in function {} (file {}): +++ {} +++ Please file a bug-report: \
                https://github.com/jonaspleyer/cellular_balloon/issues/new?\
                title={}&body={}",
                $crate::format_error_message!(@function),
                file!(),
                $error_msg,
                title,
                body,
            )
        };
        __cb_private_error
        }
    };
);
