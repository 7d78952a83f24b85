//! # Configuração da extração de features
//!
//! Todos os campos têm valor padrão, então `{}` é uma configuração válida.
//! Os padrões reproduzem exatamente os nomes de features dos modelos já treinados.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Parâmetros dos templates e da poda por frequência.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Texto emitido para campos de contexto ausentes (pilha rasa, nó sem filhos...).
    pub missing_marker: String,
    /// Substituto de `,` nas features de fronteira.
    pub comma_placeholder: String,
    /// Substituto de sequências de espaço em branco dentro de um campo.
    pub space_placeholder: String,
    /// Frequência mínima para uma feature entrar no dicionário (poda opcional).
    pub min_count: Option<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            missing_marker: "null".to_string(),
            comma_placeholder: "<comma>".to_string(),
            space_placeholder: "<space>".to_string(),
            min_count: None,
        }
    }
}

impl FeatureConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
