use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed key in {table}: {len} bytes")]
    MalformedKey { table: &'static str, len: usize },
}

impl From<LmdbError> for civitas_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::MalformedKey { .. } => civitas_store::StoreError::Corruption(e.to_string()),
            other => civitas_store::StoreError::Backend(other.to_string()),
        }
    }
}
