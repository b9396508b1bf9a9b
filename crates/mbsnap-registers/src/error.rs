/// Errors raised by register access and option parsing.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    /// A bounded read reached past the end of the store.
    #[error("register range {offset}..{end} outside store of {len} words")]
    OutOfRange {
        offset: usize,
        end: usize,
        len: usize,
    },

    /// An order name other than `big` or `little`.
    #[error("invalid order {0:?} (expected \"big\" or \"little\")")]
    InvalidOrder(String),

    /// A decode policy name other than `strict` or `heuristic`.
    #[error("invalid decode policy {0:?} (expected \"strict\" or \"heuristic\")")]
    InvalidPolicy(String),

    /// A value type name other than `float32` or `uint32`.
    #[error("invalid value type {0:?} (expected \"float32\" or \"uint32\")")]
    InvalidValueType(String),
}

pub type Result<T> = std::result::Result<T, RegisterError>;
