#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid player id: {0}")]
    InvalidPlayerId(String),

    #[error("Invalid payload codec: {0}")]
    InvalidCodec(String),
}
