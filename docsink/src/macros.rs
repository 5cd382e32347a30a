/// Creates a [`DocSinkError`](crate::error::DocSinkError) from a kind and a description.
///
/// Accepts optional dynamic detail and an originating error:
///
/// ```ignore
/// docsink_error!(ErrorKind::InvalidData, "Envelope has no table");
/// docsink_error!(ErrorKind::MissingField, "Row is missing a field", format!("field `{name}`"));
/// docsink_error!(ErrorKind::IoError, "Snapshot write failed", source: err);
/// ```
#[macro_export]
macro_rules! docsink_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::DocSinkError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::DocSinkError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::DocSinkError::from(($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::DocSinkError::from(($kind, $desc, $detail)).with_source($source)
    };
}

/// Returns early with a [`DocSinkError`](crate::error::DocSinkError).
///
/// Takes the same arguments as [`docsink_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::docsink_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::docsink_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::docsink_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::docsink_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
