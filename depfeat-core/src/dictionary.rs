//! # Dicionários de Features e Labels
//!
//! Mapeamento bidirecional e **append-only** entre nomes legíveis e ids inteiros.
//!
//! - Ids são atribuídos em ordem estrita de inserção, começando em 0.
//! - Nada é removido nem renumerado: o estado do classificador é indexado por esses ids.
//! - A ordem dos ids é a ordem da primeira ocorrência no corpus processado, então
//!   as inserções devem vir de um único fluxo lógico (uma passada de treino).

use std::collections::HashMap;

use serde::Serialize;

use crate::errors::{FeatureError, Result};

/// Um nome só pode ser gravado se não for vazio nem tiver espaço em branco
/// (o arquivo separa nome e id por espaço).
pub fn is_storable_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

/// Dicionário nome → id com semântica get-or-create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureDictionary {
    ids: HashMap<String, usize>,
}

impl FeatureDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retorna o id de `name`, inserindo-o com `id = size()` se ainda não existir.
    ///
    /// Nunca falha. Repetir a chamada com o mesmo nome devolve sempre o mesmo id.
    pub fn lookup_or_insert(&mut self, name: &str) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.ids.len();
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Consulta pura, sem inserção.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn size(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Entradas `(nome, id)` ordenadas por id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        let mut entries: Vec<(&str, usize)> =
            self.ids.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        entries.sort_unstable_by_key(|&(_, id)| id);
        entries.into_iter()
    }

    /// Insere uma entrada com id vindo de um arquivo persistido.
    ///
    /// O id é mantido como está; a validação do espaço de ids fica com quem carrega.
    /// Retorna o id anterior se o nome já existia.
    pub(crate) fn insert_with_id(&mut self, name: &str, id: usize) -> Option<usize> {
        self.ids.insert(name.to_string(), id)
    }
}

/// Dicionário de labels (classes do classificador).
///
/// Além do mapa nome → id, guarda a sequência de nomes em que `labels[i]` é o label de id `i`,
/// permitindo a consulta inversa id → texto.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelDictionary {
    dictionary: FeatureDictionary,
    labels: Vec<String>,
}

impl LabelDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create do id de um label; labels novos são anexados à sequência.
    pub fn label_id(&mut self, name: &str) -> usize {
        if let Some(id) = self.dictionary.lookup(name) {
            return id;
        }
        let id = self.dictionary.lookup_or_insert(name);
        self.labels.push(name.to_string());
        debug_assert_eq!(self.labels.len(), self.dictionary.size());
        id
    }

    /// Texto do label `id`. Nunca aumenta o dicionário.
    pub fn label_text(&self, id: usize) -> Result<&str> {
        self.labels
            .get(id)
            .map(String::as_str)
            .ok_or(FeatureError::LabelOutOfRange {
                id,
                size: self.labels.len(),
            })
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.dictionary.lookup(name)
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels na ordem dos ids.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Anexa um label lido de arquivo, com o ordinal gravado nele.
    pub(crate) fn push_persisted(&mut self, name: &str, id: usize) -> Option<usize> {
        self.labels.push(name.to_string());
        self.dictionary.insert_with_id(name, id)
    }
}
