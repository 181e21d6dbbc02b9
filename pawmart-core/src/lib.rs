pub mod identity;
pub mod payment;
pub mod validation;
pub mod chat;

pub use validation::FieldError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid fields: {}", validation::summarize(.0))]
    InvalidFields(Vec<FieldError>),
}
