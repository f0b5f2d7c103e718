//! Construction errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    #[error("invalid capacity {0}: a table needs at least one bucket")]
    InvalidCapacity(usize),
}
