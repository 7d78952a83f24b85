//! # Contagem de Frequência
//!
//! Conta quantas vezes cada feature aparece numa passada pelo corpus. A contagem é
//! transitória (nunca é persistida) e não decide nada sozinha: serve de diagnóstico e,
//! opcionalmente, de pré-passo de poda antes de congelar o dicionário.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dictionary::{is_storable_name, FeatureDictionary};

#[derive(Debug, Clone, Default)]
pub struct FeatureCounter {
    counts: HashMap<String, usize>,
    // ordem da primeira ocorrência, para a poda gerar ids determinísticos
    order: Vec<String>,
}

impl FeatureCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incrementa o contador de cada nome (repetições dentro da lista também contam).
    pub fn count<I, S>(&mut self, features: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for feature in features {
            let feature = feature.as_ref();
            match self.counts.get_mut(feature) {
                Some(n) => *n += 1,
                None => {
                    self.counts.insert(feature.to_string(), 1);
                    self.order.push(feature.to_string());
                }
            }
        }
    }

    /// Ocorrências de `feature` (0 se nunca vista).
    pub fn get(&self, feature: &str) -> usize {
        self.counts.get(feature).copied().unwrap_or(0)
    }

    /// Número de nomes distintos.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nomes com pelo menos `min_count` ocorrências, na ordem em que apareceram pela primeira vez.
    pub fn frequent(&self, min_count: usize) -> impl Iterator<Item = &str> + '_ {
        self.order
            .iter()
            .filter(move |f| self.get(f) >= min_count)
            .map(String::as_str)
    }

    /// Filtra uma lista de features mantendo só as frequentes (ordem preservada).
    pub fn retain_frequent<S>(&self, features: &[S], min_count: usize) -> Vec<String>
    where
        S: AsRef<str>,
    {
        features
            .iter()
            .map(AsRef::as_ref)
            .filter(|f| self.get(f) >= min_count)
            .map(str::to_string)
            .collect()
    }

    /// Insere no dicionário as features frequentes; devolve quantas eram novas.
    ///
    /// Nomes que não poderiam ser gravados no arquivo de dicionário são ignorados.
    pub fn seed_dictionary(&self, dictionary: &mut FeatureDictionary, min_count: usize) -> usize {
        let before = dictionary.size();
        for feature in self.frequent(min_count) {
            if !is_storable_name(feature) {
                warn!(feature, "feature com espaço ignorada na poda");
                continue;
            }
            dictionary.lookup_or_insert(feature);
        }
        let added = dictionary.size() - before;
        debug!(
            distinct = self.len(),
            kept = added,
            min_count,
            "poda por frequência aplicada"
        );
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate_across_calls() {
        let mut counter = FeatureCounter::new();
        counter.count(["a", "b", "a"]);
        counter.count(vec!["a".to_string()]);

        assert_eq!(counter.get("a"), 3);
        assert_eq!(counter.get("b"), 1);
        assert_eq!(counter.get("c"), 0);
        assert_eq!(counter.len(), 2);
    }

    #[test]
    fn test_frequent_keeps_first_occurrence_order() {
        let mut counter = FeatureCounter::new();
        counter.count(["z", "a", "z", "m", "a", "q"]);

        let kept: Vec<&str> = counter.frequent(2).collect();
        assert_eq!(kept, vec!["z", "a"]);
        assert_eq!(counter.retain_frequent(&["q", "a", "z"][..], 2), vec!["a", "z"]);
    }

    #[test]
    fn test_seed_dictionary() {
        let mut counter = FeatureCounter::new();
        counter.count(["0:dog", "1:null", "0:dog", "1:null", "0:cat", "w1:a b", "w1:a b"]);

        let mut dict = FeatureDictionary::new();
        assert_eq!(counter.seed_dictionary(&mut dict, 2), 2);
        assert_eq!(dict.lookup("0:dog"), Some(0));
        assert_eq!(dict.lookup("1:null"), Some(1));
        assert_eq!(dict.lookup("0:cat"), None);
    }
}
