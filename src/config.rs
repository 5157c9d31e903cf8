//! Configuração do taskpulse carregada a partir de `taskpulse.toml`.
//!
//! A struct [`PulseConfig`] contém os parâmetros do arquivo; valores ausentes
//! usam defaults sensíveis. A variável de ambiente `TASKPULSE_POLL_INTERVAL_MS`
//! tem precedência sobre o arquivo, e [`ConfigOverrides`] vindos da linha de
//! comando têm precedência sobre ambos. [`SessionConfig`] é a configuração
//! imutável de uma única sessão.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::PulseError;
use crate::reporter::{Handlers, RenderTargets};
use crate::transport::TransportKind;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "taskpulse.toml";

/// Variável de ambiente que sobrescreve o intervalo de polling.
pub const POLL_INTERVAL_ENV: &str = "TASKPULSE_POLL_INTERVAL_MS";

/// Configuração de nível superior carregada de `taskpulse.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PulseConfig {
    /// Intervalo entre requisições de polling, em milissegundos.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Transporte forçado; quando ausente, é inferido pelo esquema da URL.
    #[serde(default)]
    pub transport: Option<TransportKind>,

    /// Alvos de renderização (rótulo e arquivo de resultado).
    #[serde(flatten)]
    pub targets: RenderTargets,
}

// Valor padrão para o intervalo de polling: 500ms.
fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            transport: None,
            targets: RenderTargets::default(),
        }
    }
}

impl PulseConfig {
    /// Carrega a configuração do caminho dado.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load_from(path: &Path) -> Result<Self, PulseError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<PulseConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo.
        config.apply_interval_override(std::env::var(POLL_INTERVAL_ENV).ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    fn apply_interval_override(&mut self, value: Option<&str>) -> Result<(), PulseError> {
        if let Some(raw) = value
            && !raw.trim().is_empty()
        {
            self.poll_interval_ms = raw.trim().parse().map_err(|_| {
                PulseError::Config(format!("{POLL_INTERVAL_ENV} must be an integer, got {raw:?}"))
            })?;
        }
        Ok(())
    }

    /// Aplica os valores da linha de comando por cima do arquivo e do
    /// ambiente.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<(), PulseError> {
        if let Some(ms) = overrides.poll_interval_ms {
            self.poll_interval_ms = ms;
        }
        if let Some(kind) = overrides.transport {
            self.transport = Some(kind);
        }
        if let Some(label) = overrides.label {
            self.targets.label = label;
        }
        if let Some(path) = overrides.result_file {
            self.targets.result_file = Some(path);
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), PulseError> {
        if self.poll_interval_ms == 0 {
            return Err(PulseError::Config("poll_interval_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Monta a configuração de sessão para `endpoint` com os handlers padrão.
    pub fn session(&self, endpoint: &str) -> SessionConfig {
        let transport = self
            .transport
            .unwrap_or_else(|| TransportKind::infer(endpoint));
        SessionConfig::new(endpoint)
            .with_transport(transport)
            .with_poll_interval(self.poll_interval())
            .with_targets(self.targets.clone())
    }
}

/// Valores passados na linha de comando; `None` mantém o que já foi carregado.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub poll_interval_ms: Option<u64>,
    pub transport: Option<TransportKind>,
    pub label: Option<String>,
    pub result_file: Option<PathBuf>,
}

/// Configuração de uma sessão. A sessão assume a posse dela e não a altera.
#[derive(Debug)]
pub struct SessionConfig {
    pub endpoint: String,
    pub transport: TransportKind,
    pub poll_interval: Duration,
    pub handlers: Handlers,
    /// Lidos apenas por [`Session::terminal`](crate::Session::terminal);
    /// um renderer próprio passado a `from_config` ignora estes alvos.
    pub targets: RenderTargets,
}

impl SessionConfig {
    /// Configuração padrão: transporte inferido, 500ms, handlers padrão.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self {
            transport: TransportKind::infer(&endpoint),
            endpoint,
            poll_interval: Duration::from_millis(default_poll_interval_ms()),
            handlers: Handlers::default(),
            targets: RenderTargets::default(),
        }
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_targets(mut self, targets: RenderTargets) -> Self {
        self.targets = targets;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = PulseConfig::default();
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.transport, None);
        assert_eq!(config.targets.label, "task");
        assert!(config.targets.result_file.is_none());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            poll_interval_ms = 250
            label = "import"
        "#;
        let config: PulseConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.targets.label, "import");
        assert_eq!(config.transport, None);
    }

    #[test]
    fn deserialize_transport_and_result_file() {
        let toml_str = r#"
            transport = "stream"
            result_file = "out/result.txt"
        "#;
        let config: PulseConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.transport, Some(TransportKind::Stream));
        assert_eq!(config.targets.result_file, Some(PathBuf::from("out/result.txt")));
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PulseConfig::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.targets.label, "task");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "label = \"thumbnails\"\n").unwrap();
        let config = PulseConfig::load_from(&path).unwrap();
        assert_eq!(config.targets.label, "thumbnails");
    }

    #[test]
    fn load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "poll_interval_ms = \"fast\"\n").unwrap();
        assert!(matches!(PulseConfig::load_from(&path), Err(PulseError::Toml(_))));
    }

    #[test]
    fn env_override_wins() {
        let mut config = PulseConfig::default();
        config.apply_interval_override(Some("1500")).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(1500));

        config.apply_interval_override(Some("  ")).unwrap();
        assert_eq!(config.poll_interval_ms, 1500);

        assert!(config.apply_interval_override(Some("soon")).is_err());
    }

    #[test]
    fn cli_overrides_beat_env_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "poll_interval_ms = 250\nlabel = \"import\"\ntransport = \"poll\"\n")
            .unwrap();
        let mut config: PulseConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        config.apply_interval_override(Some("1500")).unwrap();
        assert_eq!(config.poll_interval_ms, 1500);

        config
            .apply_overrides(ConfigOverrides {
                poll_interval_ms: Some(40),
                transport: Some(TransportKind::Stream),
                label: None,
                result_file: Some(PathBuf::from("out.txt")),
            })
            .unwrap();
        assert_eq!(config.poll_interval_ms, 40);
        assert_eq!(config.transport, Some(TransportKind::Stream));
        assert_eq!(config.targets.label, "import");
        assert_eq!(config.targets.result_file, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn empty_overrides_keep_loaded_values() {
        let mut config = PulseConfig {
            poll_interval_ms: 250,
            ..Default::default()
        };
        config.apply_overrides(ConfigOverrides::default()).unwrap();
        assert_eq!(config, PulseConfig { poll_interval_ms: 250, ..Default::default() });
    }

    #[test]
    fn zero_interval_override_is_rejected() {
        let mut config = PulseConfig::default();
        let overrides = ConfigOverrides {
            poll_interval_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(config.apply_overrides(overrides), Err(PulseError::Config(_))));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = PulseConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PulseError::Config(_))));
    }

    #[test]
    fn session_config_infers_transport() {
        let config = PulseConfig::default();
        let session = config.session("ws://localhost/ws/progress/1/");
        assert_eq!(session.transport, TransportKind::Stream);
        assert_eq!(session.poll_interval, Duration::from_millis(500));

        let forced = PulseConfig {
            transport: Some(TransportKind::Poll),
            ..Default::default()
        };
        assert_eq!(
            forced.session("ws://localhost/x").transport,
            TransportKind::Poll
        );
    }
}
