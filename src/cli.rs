//! Interface de linha de comando do taskpulse baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (watch, classify)
//! e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use taskpulse::config::CONFIG_FILE;
use taskpulse::transport::TransportKind;

/// taskpulse: acompanha o status de uma tarefa em segundo plano.
#[derive(Debug, Parser)]
#[command(name = "taskpulse", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração.
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Transporte aceito pela CLI, mapeado para [`TransportKind`] internamente.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TransportArg {
    /// Requisições HTTP periódicas.
    Poll,
    /// Conexão WebSocket persistente.
    Stream,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Poll => TransportKind::Poll,
            TransportArg::Stream => TransportKind::Stream,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Acompanha uma tarefa até o fim.
    Watch {
        /// URL de progresso (http(s):// para polling, ws(s):// para stream).
        url: String,

        /// Intervalo de polling em milissegundos.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Força o transporte em vez de inferir pelo esquema da URL.
        #[arg(long)]
        transport: Option<TransportArg>,

        /// Rótulo exibido ao lado da barra.
        #[arg(long)]
        label: Option<String>,

        /// Arquivo que recebe o resultado da tarefa.
        #[arg(long)]
        result_file: Option<PathBuf>,
    },

    /// Classifica um documento de atualização (arquivo ou stdin).
    Classify {
        /// Caminho do documento JSON; lê do stdin quando ausente.
        file: Option<PathBuf>,
    },
}
