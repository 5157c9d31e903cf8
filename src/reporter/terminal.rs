//! Renderização no terminal: barra de progresso e saída colorida.
//!
//! Usa a crate `indicatif` para a barra e `console` para estilizar a linha
//! de status conforme o [`Tone`]. O [`TerminalRenderer`] é o [`Renderer`]
//! padrão do binário `taskpulse`.

use std::path::PathBuf;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::warn;

use super::{Renderer, Tone};

/// Alvos de renderização de uma sessão.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderTargets {
    /// Rótulo exibido à esquerda da barra.
    #[serde(default = "default_label")]
    pub label: String,
    /// Arquivo que recebe o resultado da tarefa, se configurado.
    #[serde(default)]
    pub result_file: Option<PathBuf>,
}

// Rótulo padrão da barra: "task".
pub(crate) fn default_label() -> String {
    "task".to_string()
}

impl Default for RenderTargets {
    fn default() -> Self {
        Self::new(default_label())
    }
}

impl RenderTargets {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            result_file: None,
        }
    }

    pub fn with_result_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.result_file = Some(path.into());
        self
    }
}

/// Barra de progresso do `indicatif` que implementa [`Renderer`].
///
/// A cor da barra e da mensagem segue o tom atual: azul para progresso,
/// verde para sucesso, vermelho para erro e branco para resultado ignorado.
/// Ao ser descartada, a barra é abandonada e permanece visível.
pub struct TerminalRenderer {
    // Barra de progresso do indicatif.
    pb: ProgressBar,
    // Tom aplicado à linha de status.
    tone: Tone,
    result_file: Option<PathBuf>,
}

impl TerminalRenderer {
    /// Cria a barra no stderr com o rótulo dos alvos.
    pub fn new(targets: &RenderTargets) -> Self {
        Self::with_bar(ProgressBar::new(100), targets)
    }

    /// Variante sem saída visível (útil para testes).
    pub fn hidden(targets: &RenderTargets) -> Self {
        Self::with_bar(ProgressBar::hidden(), targets)
    }

    fn with_bar(pb: ProgressBar, targets: &RenderTargets) -> Self {
        pb.set_length(100);
        pb.set_prefix(targets.label.clone());
        pb.set_style(bar_style(Tone::Progress));
        Self {
            pb,
            tone: Tone::Progress,
            result_file: targets.result_file.clone(),
        }
    }

    /// Mensagem atual sem códigos ANSI.
    pub fn message(&self) -> String {
        console::strip_ansi_codes(&self.pb.message()).into_owned()
    }

    /// Posição atual da barra (0–100).
    pub fn position(&self) -> u64 {
        self.pb.position()
    }
}

fn tone_color(tone: Tone) -> &'static str {
    match tone {
        Tone::Progress => "blue",
        Tone::Success => "green",
        Tone::Error => "red",
        Tone::Ignored => "white",
    }
}

fn message_style(tone: Tone) -> Style {
    match tone {
        Tone::Progress => Style::new().cyan(),
        Tone::Success => Style::new().green().bold(),
        Tone::Error => Style::new().red().bold(),
        Tone::Ignored => Style::new().dim(),
    }
}

fn bar_style(tone: Tone) -> ProgressStyle {
    let template = format!(
        "{{prefix:.bold}} [{{bar:40.{}}}] {{pos:>3}}% {{msg}}",
        tone_color(tone)
    );
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

impl Renderer for TerminalRenderer {
    fn paint(&mut self, tone: Tone, percent: Option<f64>) {
        if tone != self.tone {
            self.tone = tone;
            self.pb.set_style(bar_style(tone));
        }
        if let Some(percent) = percent {
            self.pb.set_position(percent.clamp(0.0, 100.0).round() as u64);
        }
    }

    fn set_message(&mut self, text: &str) {
        let styled = message_style(self.tone).apply_to(text).to_string();
        self.pb.set_message(styled);
    }

    fn has_result_target(&self) -> bool {
        self.result_file.is_some()
    }

    fn show_result(&mut self, text: &str) {
        let Some(path) = &self.result_file else {
            return;
        };
        if let Err(e) = std::fs::write(path, text) {
            warn!(path = %path.display(), error = %e, "failed to write task result");
        }
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        self.pb.abandon();
    }
}
