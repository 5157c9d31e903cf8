//! Tipos de erro da camada de transporte.
//!
//! Define [`TransportError`] com uma variante por forma de falha de uma troca
//! com a fonte de atualizações. Todas encerram a sessão e são reportadas
//! uma única vez ao handler correspondente.

use thiserror::Error;

/// Erros que podem ocorrer ao obter um documento de atualização.
///
/// - [`Network`](TransportError::Network): a troca não pôde ser concluída
/// - [`Http`](TransportError::Http): o servidor respondeu com status diferente de 200
/// - [`Parse`](TransportError::Parse): o corpo chegou mas não é JSON
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Falha de rede (DNS, conexão recusada, timeout, conexão encerrada).
    #[error("network error: {0}")]
    Network(String),

    /// O servidor concluiu a troca mas sinalizou falha.
    #[error("HTTP error (status {status})")]
    Http { status: u16 },

    /// Corpo recebido que não pôde ser decodificado como JSON.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}
