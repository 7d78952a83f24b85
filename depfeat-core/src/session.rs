//! # Sessão de Features
//!
//! Dono explícito dos dicionários de uma sessão de treino ou inferência. Cada sessão
//! carrega (ou cria) seus dicionários, extrai e codifica features e, ao final do treino,
//! grava um snapshot congelado. Não existe estado global: quem precisa dos dicionários
//! recebe a sessão por referência.

use std::path::Path;

use crate::config::FeatureConfig;
use crate::context::{InputToken, ParseContext};
use crate::counter::FeatureCounter;
use crate::dictionary::{is_storable_name, FeatureDictionary, LabelDictionary};
use crate::encoder::{self, FeatureNode};
use crate::errors::{FeatureError, Result};
use crate::persistence;
use crate::templates::TemplateExtractor;

#[derive(Debug, Clone, Default)]
pub struct FeatureSession {
    features: FeatureDictionary,
    labels: LabelDictionary,
    extractor: TemplateExtractor,
}

impl FeatureSession {
    /// Sessão com dicionários vazios.
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            features: FeatureDictionary::new(),
            labels: LabelDictionary::new(),
            extractor: TemplateExtractor::new(config),
        }
    }

    /// Sessão a partir de um arquivo de dicionário salvo.
    pub fn load<P: AsRef<Path>>(path: P, config: FeatureConfig) -> Result<Self> {
        let (features, labels) = persistence::load(path)?;
        Ok(Self {
            features,
            labels,
            extractor: TemplateExtractor::new(config),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save(&self.features, &self.labels, path)
    }

    pub fn config(&self) -> &FeatureConfig {
        self.extractor.config()
    }

    pub fn features(&self) -> &FeatureDictionary {
        &self.features
    }

    pub fn labels(&self) -> &LabelDictionary {
        &self.labels
    }

    pub fn extractor(&self) -> &TemplateExtractor {
        &self.extractor
    }

    /// Como [`FeatureDictionary::lookup_or_insert`], mas recusa nomes que não poderiam ser gravados.
    pub fn lookup_or_insert(&mut self, feature: &str) -> Result<usize> {
        ensure_storable(feature)?;
        Ok(self.features.lookup_or_insert(feature))
    }

    pub fn label_id(&mut self, label: &str) -> Result<usize> {
        ensure_storable(label)?;
        Ok(self.labels.label_id(label))
    }

    pub fn label_text(&self, id: usize) -> Result<&str> {
        self.labels.label_text(id)
    }

    pub fn boundary_features(&self, current: &InputToken, next: &InputToken) -> Vec<String> {
        self.extractor.boundary_features(current, next)
    }

    pub fn lattice_features<C: ParseContext + ?Sized>(&self, context: &C) -> Vec<String> {
        self.extractor.lattice_features(context)
    }

    /// Todos os nomes são validados antes de qualquer inserção: um nome inválido
    /// não deixa o dicionário parcialmente crescido.
    pub fn map<S: AsRef<str>>(&mut self, features: &[S]) -> Result<Vec<usize>> {
        ensure_all_storable(features)?;
        Ok(encoder::map(&mut self.features, features))
    }

    pub fn map_for_classifier<S: AsRef<str>>(&mut self, features: &[S]) -> Result<Vec<FeatureNode>> {
        ensure_all_storable(features)?;
        encoder::map_for_classifier(&mut self.features, features)
    }

    /// Codifica um exemplo de treino: id do label gold + vetor esparso.
    pub fn encode_instance<S: AsRef<str>>(&mut self, label: &str, features: &[S]) -> Result<(usize, Vec<FeatureNode>)> {
        ensure_storable(label)?;
        let nodes = self.map_for_classifier(features)?;
        Ok((self.labels.label_id(label), nodes))
    }

    /// Codifica para inferência sem alterar o dicionário.
    pub fn encode_frozen<S: AsRef<str>>(&self, features: &[S]) -> Result<Vec<FeatureNode>> {
        encoder::map_for_classifier_frozen(&self.features, features)
    }

    /// Pré-passo de poda: semeia o dicionário com as features que atingem `min_count`
    /// da configuração. Sem limiar configurado, não faz nada e devolve 0.
    pub fn seed_from_counter(&mut self, counter: &FeatureCounter) -> usize {
        match self.extractor.config().min_count {
            Some(min_count) => counter.seed_dictionary(&mut self.features, min_count),
            None => 0,
        }
    }
}

fn ensure_storable(name: &str) -> Result<()> {
    if is_storable_name(name) {
        Ok(())
    } else {
        Err(FeatureError::InvalidName {
            name: name.to_string(),
        })
    }
}

fn ensure_all_storable<S: AsRef<str>>(names: &[S]) -> Result<()> {
    names.iter().try_for_each(|name| ensure_storable(name.as_ref()))
}
