//! Adapting caller error handlers to the adapter callback shape
//!
//! Adapters report a bulk-row failure as `(Row, AdapterError)`. Callers
//! receive a [`RowFailure`] with the target and operation attached and the
//! cause wrapped as a mediator [`Error`]. The conversion happens here and
//! nowhere else.

use rowgate_core::{AdapterError, AdapterErrorSink, Error, Operation, Row, RowErrorHandler, RowFailure};
use tracing::debug;

/// Wrap `handler` as the sink passed to the adapter
pub(crate) fn adapt_handler<'a>(
    target: &str,
    operation: Operation,
    handler: &'a mut dyn RowErrorHandler,
) -> AdapterErrorSink<'a> {
    let target = target.to_string();
    Box::new(move |row: Row, cause: AdapterError| {
        debug!(
            target: "rowgate::exec",
            operation = %operation,
            collection = %target,
            error = %cause,
            "Row failure isolated"
        );
        let error = Error::from_adapter(operation, &target, cause);
        handler.on_row_error(RowFailure {
            target: target.clone(),
            operation,
            row,
            error,
        });
    })
}
