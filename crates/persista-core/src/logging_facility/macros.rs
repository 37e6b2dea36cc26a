//! Canonical logging macros
//!
//! These macros give every connector operation the same start/end shape.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use persista_core::log_op_start;
/// log_op_start!("record_tables");
/// log_op_start!("record_tables", model_count = 2);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        $crate::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        $crate::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use persista_core::log_op_end;
/// log_op_end!("tick", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        $crate::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        $crate::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// The error is converted into [`ExError`](crate::errors::ExError) so the
/// event carries the stable kind and code.
///
/// # Example
///
/// ```
/// # use persista_core::{log_op_error, errors::PersistError};
/// let err = PersistError::NotFound {
///     model: "user".to_string(),
///     lookup: "id = 1".to_string(),
/// };
/// log_op_error!("find", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($field)*
        );
    }};
}

/// Run an operation body between `log_op_start!` and `log_op_end!`
///
/// Failures are logged with `log_op_error!` and returned unchanged.
///
/// ```
/// # use persista_core::{logged_op, errors::Result};
/// fn work() -> Result<u32> {
///     logged_op!("work", { Ok(7) })
/// }
/// assert_eq!(work().unwrap(), 7);
/// ```
#[macro_export]
macro_rules! logged_op {
    ($op:expr, $body:block) => {{
        $crate::log_op_start!($op);
        let start = ::std::time::Instant::now();
        let result = (|| -> $crate::errors::Result<_> { $body })();
        match &result {
            Ok(_) => {
                $crate::log_op_end!($op, duration_ms = start.elapsed().as_millis() as u64);
            }
            Err(e) => {
                $crate::log_op_error!(
                    $op,
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
            }
        }
        result
    }};
}
