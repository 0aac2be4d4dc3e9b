//! Errors surfaced by the generator core.

/// The only fatal generation failure. Every other anomaly (unmapped types,
/// malformed callback shapes, duplicate names) degrades gracefully.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The declaration tree violates a structural invariant of the model.
    #[error("structural invariant violated: {detail}")]
    StructuralInvariant { detail: String },
}
