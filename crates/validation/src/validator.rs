//! Input validation gate.
//!
//! The only path from untrusted input to [`ValidatedMessage`].

use crate::schema::SchemaPredicate;
use liquidity_core::{
    DiagnosticSink, Error, MessageDisplay, RawMessage, Result, TracingSink, ValidatedMessage,
};
use std::sync::Arc;

/// Validate a raw message against `schema`.
///
/// Returns the message unchanged, tagged as validated. A rejected message is
/// logged at error level and handed back inside [`Error::Validation`].
pub fn validate_input_message<P>(
    message: RawMessage,
    schema: &P,
    sink: &dyn DiagnosticSink,
) -> Result<ValidatedMessage>
where
    P: SchemaPredicate + ?Sized,
{
    sink.debug(format_args!("Validating message schema..."));
    if !schema.validate_message_schema(&message) {
        sink.error(format_args!(
            "Invalid message schema: {}",
            MessageDisplay(&message)
        ));
        return Err(Error::validation(message));
    }
    Ok(ValidatedMessage::assume_valid(message))
}

/// A schema predicate bound to a diagnostic sink.
pub struct MessageValidator<P> {
    schema: P,
    sink: Arc<dyn DiagnosticSink>,
}

impl<P: SchemaPredicate> MessageValidator<P> {
    /// Create a validator that reports through `tracing`.
    pub fn new(schema: P) -> Self {
        Self::with_sink(schema, Arc::new(TracingSink))
    }

    /// Create a validator with an explicit sink.
    pub fn with_sink(schema: P, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { schema, sink }
    }

    /// Validate one message.
    pub fn validate(&self, message: RawMessage) -> Result<ValidatedMessage> {
        validate_input_message(message, &self.schema, self.sink.as_ref())
    }

    /// The wrapped predicate.
    pub fn schema(&self) -> &P {
        &self.schema
    }
}
