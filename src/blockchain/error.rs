use crate::blockchain::client::ClientError;
use crate::db::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Run cancelled")]
    Cancelled,
}

impl IndexerError {
    /// A concurrent upsert already wrote this signature
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, IndexerError::Store(e) if e.is_duplicate_key())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, IndexerError::Store(e) if e.is_fatal())
    }
}
