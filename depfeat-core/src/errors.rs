//! # Erros do crate
//!
//! Todas as operações que podem falhar (persistência, consulta de labels,
//! codificação esparsa, leitura de configuração) retornam [`FeatureError`].

/// `Result` com [`FeatureError`] como erro padrão.
pub type Result<T, E = FeatureError> = std::result::Result<T, E>;

/// Erros produzidos pelo núcleo de features.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// Falha de leitura ou escrita no arquivo de dicionário.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Linha malformada no arquivo de dicionário (1-based).
    #[error("formato inválido na linha {line}: {msg}")]
    InvalidFormat { line: usize, msg: String },

    /// O arquivo terminou antes da linha em branco que separa labels de features.
    #[error("linha em branco separando labels e features não encontrada")]
    MissingSeparator,

    /// Nome vazio ou com espaço em branco, que não caberia no arquivo de dicionário.
    #[error("nome de feature/label inválido: {name:?}")]
    InvalidName { name: String },

    /// `label_text` chamado com um id que não existe.
    #[error("label {id} fora do intervalo (total de labels: {size})")]
    LabelOutOfRange { id: usize, size: usize },

    /// Dois itens do vetor esparso resolveram para o mesmo índice.
    #[error("índice duplicado {index} no vetor esparso")]
    DuplicateIndex { index: usize },

    /// Arquivo de configuração inválido.
    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

impl FeatureError {
    pub(crate) fn invalid_format<S>(line: usize, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat {
            line,
            msg: msg.into(),
        }
    }
}
