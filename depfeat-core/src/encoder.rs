//! # Codificação em Vetor Esparso
//!
//! Converte listas de nomes de features no formato que um classificador linear espera:
//! pares `(índice, valor)` com índice **1-based**, estritamente crescente e sem repetição.
//! O id 0 do dicionário vira o índice 1.
//!
//! Índice repetido é violação de contrato (nome repetido na lista de entrada ou espaço de
//! ids corrompido) e faz a codificação falhar com [`FeatureError::DuplicateIndex`],
//! em vez de fundir ou descartar a entrada em silêncio.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dictionary::FeatureDictionary;
use crate::errors::{FeatureError, Result};

/// Uma entrada do vetor esparso.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureNode {
    pub index: usize,
    pub value: f64,
}

impl FeatureNode {
    /// Nó binário (valor 1.0) para o id 0-based do dicionário.
    pub fn from_id(id: usize) -> Self {
        Self {
            index: id + 1,
            value: 1.0,
        }
    }
}

/// Ids 0-based, na mesma ordem e tamanho da entrada. Nomes novos entram no dicionário.
pub fn map<S>(dictionary: &mut FeatureDictionary, features: &[S]) -> Vec<usize>
where
    S: AsRef<str>,
{
    features
        .iter()
        .map(|f| dictionary.lookup_or_insert(f.as_ref()))
        .collect()
}

/// Como [`map`], mas só consulta: nomes desconhecidos são ignorados e o dicionário não muda.
pub fn map_known<S>(dictionary: &FeatureDictionary, features: &[S]) -> Vec<usize>
where
    S: AsRef<str>,
{
    features
        .iter()
        .filter_map(|f| dictionary.lookup(f.as_ref()))
        .collect()
}

/// Vetor esparso pronto para o classificador (treino).
///
/// Os nomes são inseridos no dicionário antes da validação, então mesmo uma chamada que
/// falhe por índice duplicado deixa o dicionário crescido.
pub fn map_for_classifier<S>(dictionary: &mut FeatureDictionary, features: &[S]) -> Result<Vec<FeatureNode>>
where
    S: AsRef<str>,
{
    to_sparse(map(dictionary, features))
}

/// Vetor esparso contra um dicionário congelado (inferência).
pub fn map_for_classifier_frozen<S>(dictionary: &FeatureDictionary, features: &[S]) -> Result<Vec<FeatureNode>>
where
    S: AsRef<str>,
{
    to_sparse(map_known(dictionary, features))
}

/// Ordena os ids como índices 1-based e exige monotonicidade estrita.
pub fn to_sparse(ids: Vec<usize>) -> Result<Vec<FeatureNode>> {
    let mut nodes: Vec<FeatureNode> = ids.into_iter().map(FeatureNode::from_id).collect();
    nodes.sort_unstable_by_key(|n| n.index);

    if let Some(pair) = nodes.windows(2).find(|w| w[0].index >= w[1].index) {
        let index = pair[1].index;
        warn!(index, "índice duplicado no vetor esparso");
        return Err(FeatureError::DuplicateIndex { index });
    }
    Ok(nodes)
}
