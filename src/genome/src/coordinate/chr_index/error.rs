use thiserror::Error;

#[derive(Error, Debug)]
#[error("Failed to parse chromosome name into a valid chromosome index: '{0}'")]
pub struct ChrIdxError(pub String);
