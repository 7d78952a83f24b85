//! # Templates de Features
//!
//! Transforma o contexto do parser em listas **ordenadas** de nomes de features.
//! Nenhuma função deste módulo toca nos dicionários: a extração é pura e pode
//! rodar em paralelo, enquanto a atribuição de ids continua sequencial.
//!
//! ## Features de Fronteira (par de tokens adjacentes)
//!
//! | # | nome   | valor                        |
//! |---|--------|------------------------------|
//! | 0 | `w1w2` | palavra atual `_` próxima    |
//! | 1 | `w1`   | palavra atual                |
//! | 2 | `w2`   | próxima palavra              |
//! | 3 | `t1t2` | tag atual `_` próxima        |
//! | 4 | `t1`   | tag atual                    |
//! | 5 | `t2`   | próxima tag                  |
//!
//! Ex: `("dog", NN)`, `("runs", VBZ)` → `w1w2:dog_runs`, `w1:dog`, ..., `t2:VBZ`.
//!
//! ## Features de Lattice (configuração pilha/fila)
//!
//! Cada template vira `"<índice>:<campo1>[:<campo2>...]"`. O índice é a posição do
//! template em [`LATTICE_TEMPLATES`] e evita que o mesmo valor vindo de slots
//! diferentes (ex: a mesma tag como `s0t` e como `q0t`) colida no dicionário.
//!
//! **A tabela é parte do contrato do modelo.** Reordenar, remover ou inserir um
//! template muda o significado de ids já treinados. Isso inclui a combinação
//! `s1t:s1lc:s0t`, que aparece duas vezes (índices 23 e 27).
//!
//! Campos cujo elemento de contexto não existe (pilha com menos de dois nós, nó sem
//! filhos, fila curta) viram o marcador de ausência da configuração (`null` por padrão).

use std::borrow::Cow;
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::config::FeatureConfig;
use crate::context::{InputToken, ParseContext, StackNode};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Campos da janela de contexto lida pelos templates de lattice.
///
/// `q*` são tokens da fila, `s*` nós da pilha (0 = topo). `lc`/`rc` são as tags do filho
/// mais à esquerda/direita, `lcl`/`rcl` os rótulos dos respectivos arcos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Q0w,
    Q0t,
    Q1w,
    Q1t,
    Q2w,
    Q2t,
    S0w,
    S0t,
    S1w,
    S1t,
    S2w,
    S2t,
    S0lc,
    S0lcl,
    S0rc,
    S0rcl,
    S1lc,
    S1lcl,
    S1rc,
    S1rcl,
}

impl Field {
    pub const COUNT: usize = 20;
}

use Field::*;

/// Tabela fixa dos templates de lattice; a posição é o índice do template.
pub const LATTICE_TEMPLATES: [&[Field]; 37] = [
    // unigramas
    &[S0w],
    &[S1w],
    &[S0t],
    &[S1t],
    &[Q0w],
    &[Q0t],
    &[Q1w],
    &[Q1t],
    // palavra + tag
    &[S0w, S0t],
    &[S1w, S1t],
    &[Q0w, Q0t],
    // bigramas s0×s1, s0×q0
    &[S0w, S1w],
    &[S0t, S1t],
    &[S0t, Q0t],
    &[S0t, S1w, S1t],
    &[S0w, S0t, S1w],
    &[S0w, S0t, S1t],
    &[S0w, S1w, S1t],
    &[S0w, S0t, S1w, S1t],
    // trigramas pilha/fila/filhos
    &[S0t, Q0t, Q1t],
    &[S0w, Q0t, Q1t],
    &[S1t, S0t, Q0t],
    &[S1t, S0w, Q0t],
    &[S1t, S1lc, S0t],
    &[S1t, S0t, S0rc],
    &[S1t, S1rc, S0w],
    &[S1t, S1rc, S0t],
    &[S1t, S1lc, S0t],
    &[S1t, S0w, S0lc],
    // tags e rótulos dos filhos
    &[S0t, S0lcl],
    &[S0t, S0lcl, S0lc],
    &[S0t, S0rcl],
    &[S0t, S0rcl, S0rc],
    &[S1t, S1lcl],
    &[S1t, S1lcl, S1lc],
    &[S1t, S1rcl],
    &[S1t, S1rcl, S1rc],
];

pub const LATTICE_TEMPLATE_COUNT: usize = LATTICE_TEMPLATES.len();

/// Campos de um par de tokens adjacentes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryField {
    Word1,
    Word2,
    Tag1,
    Tag2,
}

/// Templates de fronteira: (prefixo, campos unidos por `_`).
pub const BOUNDARY_TEMPLATES: [(&str, &[BoundaryField]); 6] = [
    ("w1w2", &[BoundaryField::Word1, BoundaryField::Word2]),
    ("w1", &[BoundaryField::Word1]),
    ("w2", &[BoundaryField::Word2]),
    ("t1t2", &[BoundaryField::Tag1, BoundaryField::Tag2]),
    ("t1", &[BoundaryField::Tag1]),
    ("t2", &[BoundaryField::Tag2]),
];

/// Valores resolvidos da janela de contexto; `None` = elemento ausente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatticeWindow<'a> {
    values: [Option<&'a str>; Field::COUNT],
}

impl<'a> LatticeWindow<'a> {
    pub fn from_context<C>(context: &'a C) -> Self
    where
        C: ParseContext + ?Sized,
    {
        let mut window = Self {
            values: [None; Field::COUNT],
        };

        let queue = [(Q0w, Q0t), (Q1w, Q1t), (Q2w, Q2t)];
        for (i, (w, t)) in queue.into_iter().enumerate() {
            if let Some(token) = context.lookahead(i) {
                window.set_token(w, t, token);
            }
        }

        if let Some(s0) = context.stack(0) {
            window.set_token(S0w, S0t, &s0.token);
            window.set_children(s0, [S0lc, S0lcl, S0rc, S0rcl]);
        }
        if let Some(s1) = context.stack(1) {
            window.set_token(S1w, S1t, &s1.token);
            window.set_children(s1, [S1lc, S1lcl, S1rc, S1rcl]);
        }
        if let Some(s2) = context.stack(2) {
            window.set_token(S2w, S2t, &s2.token);
        }

        window
    }

    pub fn get(&self, field: Field) -> Option<&'a str> {
        self.values[field as usize]
    }

    fn set_token(&mut self, word: Field, tag: Field, token: &'a InputToken) {
        self.values[word as usize] = Some(token.word.as_str());
        self.values[tag as usize] = Some(token.tag.as_str());
    }

    fn set_children(&mut self, node: &'a StackNode, [lc, lcl, rc, rcl]: [Field; 4]) {
        if let Some(left) = node.leftmost_child() {
            self.values[lc as usize] = Some(left.node.token.tag.as_str());
            self.values[lcl as usize] = Some(left.label.as_str());
        }
        if let Some(right) = node.rightmost_child() {
            self.values[rc as usize] = Some(right.node.token.tag.as_str());
            self.values[rcl as usize] = Some(right.label.as_str());
        }
    }
}

/// Extrator de features guiado pelas tabelas acima.
#[derive(Debug, Clone, Default)]
pub struct TemplateExtractor {
    config: FeatureConfig,
}

impl TemplateExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// As 6 features de fronteira entre `current` e `next`, na ordem de [`BOUNDARY_TEMPLATES`].
    ///
    /// Vírgulas viram `comma_placeholder` e espaços viram `space_placeholder`, para que
    /// nenhum nome quebre o arquivo de dicionário.
    pub fn boundary_features(&self, current: &InputToken, next: &InputToken) -> Vec<String> {
        let value = |field: BoundaryField| {
            let raw = match field {
                BoundaryField::Word1 => &current.word,
                BoundaryField::Word2 => &next.word,
                BoundaryField::Tag1 => &current.tag,
                BoundaryField::Tag2 => &next.tag,
            };
            self.sanitize(raw, true)
        };

        BOUNDARY_TEMPLATES
            .iter()
            .map(|(name, fields)| {
                let joined: Vec<Cow<'_, str>> = fields.iter().map(|&f| value(f)).collect();
                format!("{name}:{}", joined.join("_"))
            })
            .collect()
    }

    /// As features de lattice da configuração atual, uma por template de [`LATTICE_TEMPLATES`].
    pub fn lattice_features<C>(&self, context: &C) -> Vec<String>
    where
        C: ParseContext + ?Sized,
    {
        let window = LatticeWindow::from_context(context);
        self.render_lattice(&window)
    }

    /// Renderiza os templates a partir de uma janela já resolvida.
    pub fn render_lattice(&self, window: &LatticeWindow<'_>) -> Vec<String> {
        LATTICE_TEMPLATES
            .iter()
            .enumerate()
            .map(|(index, fields)| {
                let mut feature = index.to_string();
                for &field in fields.iter() {
                    feature.push(':');
                    match window.get(field) {
                        Some(raw) => feature.push_str(&self.sanitize(raw, false)),
                        None => feature.push_str(&self.config.missing_marker),
                    }
                }
                feature
            })
            .collect()
    }

    /// [`lattice_features`](Self::lattice_features) para várias configurações em paralelo.
    ///
    /// A saída segue a ordem de `contexts`.
    pub fn lattice_features_batch<C>(&self, contexts: &[C]) -> Vec<Vec<String>>
    where
        C: ParseContext + Sync,
    {
        contexts
            .par_iter()
            .map(|context| self.lattice_features(context))
            .collect()
    }

    /// Features de fronteira para cada par adjacente de uma sentença (`n - 1` listas).
    pub fn sentence_boundary_features(&self, tokens: &[InputToken]) -> Vec<Vec<String>> {
        tokens
            .par_windows(2)
            .map(|pair| self.boundary_features(&pair[0], &pair[1]))
            .collect()
    }

    fn sanitize<'v>(&self, value: &'v str, escape_commas: bool) -> Cow<'v, str> {
        let mut value = WHITESPACE.replace_all(value, NoExpand(&self.config.space_placeholder));
        if escape_commas && value.contains(',') {
            value = Cow::Owned(value.replace(',', &self.config.comma_placeholder));
        }
        value
    }
}

/// [`TemplateExtractor::boundary_features`] com a configuração padrão.
pub fn boundary_features(current: &InputToken, next: &InputToken) -> Vec<String> {
    TemplateExtractor::default().boundary_features(current, next)
}

/// [`TemplateExtractor::lattice_features`] com a configuração padrão.
pub fn lattice_features<C>(context: &C) -> Vec<String>
where
    C: ParseContext + ?Sized,
{
    TemplateExtractor::default().lattice_features(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParserState;

    fn node(word: &str, tag: &str, position: usize) -> StackNode {
        StackNode::new(InputToken::new(word, tag), position)
    }

    /// "I saw the dog | with a": s1 = saw (←nsubj I), s0 = dog (←det the).
    fn sample_state() -> ParserState {
        let saw = node("saw", "VBD", 1).with_child("nsubj", node("I", "PRP", 0));
        let dog = node("dog", "NN", 3).with_child("det", node("the", "DT", 2));
        ParserState::new(
            vec![InputToken::new("with", "IN"), InputToken::new("a", "DT")],
            vec![saw, dog],
        )
    }

    #[test]
    fn test_boundary_scenario() {
        let features = boundary_features(&InputToken::new("dog", "NN"), &InputToken::new("runs", "VBZ"));
        assert_eq!(
            features,
            vec!["w1w2:dog_runs", "w1:dog", "w2:runs", "t1t2:NN_VBZ", "t1:NN", "t2:VBZ"]
        );
    }

    #[test]
    fn test_boundary_escapes_commas_and_spaces() {
        let features = boundary_features(&InputToken::new(",", ","), &InputToken::new("New York", "NNP"));
        assert_eq!(features[0], "w1w2:<comma>_New<space>York");
        assert_eq!(features[1], "w1:<comma>");
        assert_eq!(features[4], "t1:<comma>");
        assert!(features.iter().all(|f| !f.contains(',') && !f.contains(' ')));
    }

    #[test]
    fn test_table_has_fixed_size() {
        assert_eq!(LATTICE_TEMPLATE_COUNT, 37);
        assert_eq!(LATTICE_TEMPLATES[23], LATTICE_TEMPLATES[27]);
    }

    #[test]
    fn test_lattice_full_context() {
        let features = lattice_features(&sample_state());
        let expected = vec![
            "0:dog",
            "1:saw",
            "2:NN",
            "3:VBD",
            "4:with",
            "5:IN",
            "6:a",
            "7:DT",
            "8:dog:NN",
            "9:saw:VBD",
            "10:with:IN",
            "11:dog:saw",
            "12:NN:VBD",
            "13:NN:IN",
            "14:NN:saw:VBD",
            "15:dog:NN:saw",
            "16:dog:NN:VBD",
            "17:dog:saw:VBD",
            "18:dog:NN:saw:VBD",
            "19:NN:IN:DT",
            "20:dog:IN:DT",
            "21:VBD:NN:IN",
            "22:VBD:dog:IN",
            "23:VBD:PRP:NN",
            "24:VBD:NN:DT",
            "25:VBD:PRP:dog",
            "26:VBD:PRP:NN",
            "27:VBD:PRP:NN",
            "28:VBD:dog:DT",
            "29:NN:det",
            "30:NN:det:DT",
            "31:NN:det",
            "32:NN:det:DT",
            "33:VBD:nsubj",
            "34:VBD:nsubj:PRP",
            "35:VBD:nsubj",
            "36:VBD:nsubj:PRP",
        ];
        assert_eq!(features, expected);
    }

    #[test]
    fn test_lattice_is_deterministic() {
        let state = sample_state();
        let extractor = TemplateExtractor::default();
        assert_eq!(extractor.lattice_features(&state), extractor.lattice_features(&state));
    }

    #[test]
    fn test_shallow_stack_uses_missing_marker() {
        let state = ParserState::new(vec![InputToken::new("runs", "VBZ")], vec![node("dog", "NN", 0)]);
        let features = lattice_features(&state);

        assert_eq!(features.len(), LATTICE_TEMPLATE_COUNT);
        assert_eq!(features[0], "0:dog");
        assert_eq!(features[1], "1:null");
        assert_eq!(features[3], "3:null");
        assert_eq!(features[7], "7:null");
        assert_eq!(features[14], "14:NN:null:null");
        assert_eq!(features[23], "23:null:null:NN");
        assert_eq!(features[29], "29:NN:null");
        assert_eq!(features[36], "36:null:null:null");

        // todo template que lê algum campo s1* tem o marcador nesse campo
        for (index, fields) in LATTICE_TEMPLATES.iter().enumerate() {
            let parts: Vec<&str> = features[index].split(':').skip(1).collect();
            for (part, field) in parts.iter().zip(fields.iter()) {
                let name = format!("{field:?}");
                if name.starts_with("S1") || name.starts_with("S2") {
                    assert_eq!(*part, "null", "template {index}");
                }
            }
        }
    }

    #[test]
    fn test_empty_context() {
        let features = lattice_features(&ParserState::default());
        assert_eq!(features[18], "18:null:null:null:null");
        assert!(features.iter().all(|f| f.split(':').skip(1).all(|p| p == "null")));
    }

    #[test]
    fn test_custom_missing_marker() {
        let config = FeatureConfig {
            missing_marker: "<none>".to_string(),
            ..FeatureConfig::default()
        };
        let features = TemplateExtractor::new(config).lattice_features(&ParserState::default());
        assert_eq!(features[0], "0:<none>");
    }

    #[test]
    fn test_lattice_replaces_spaces_but_keeps_commas() {
        let state = ParserState::new(
            vec![InputToken::new(",", ",")],
            vec![node("New York", "NNP", 0)],
        );
        let features = lattice_features(&state);

        assert_eq!(features[0], "0:New<space>York");
        assert_eq!(features[5], "5:,");
        assert!(features.iter().all(|f| !f.contains(' ')));
    }

    #[test]
    fn test_window_reads_third_stack_node_and_lookahead() {
        let state = ParserState::new(
            vec![
                InputToken::new("a", "DT"),
                InputToken::new("big", "JJ"),
                InputToken::new("cat", "NN"),
            ],
            vec![node("x", "X", 0), node("y", "Y", 1), node("z", "Z", 2)],
        );
        let window = LatticeWindow::from_context(&state);
        assert_eq!(window.get(Field::S2w), Some("x"));
        assert_eq!(window.get(Field::S0t), Some("Z"));
        assert_eq!(window.get(Field::Q2w), Some("cat"));
        assert_eq!(window.get(Field::S0lc), None);
    }

    #[test]
    fn test_lattice_batch_preserves_order() {
        let extractor = TemplateExtractor::default();
        let states = vec![sample_state(), ParserState::default(), sample_state()];
        let batch = extractor.lattice_features_batch(&states);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0], extractor.lattice_features(&states[0]));
        assert_eq!(batch[1][0], "0:null");
        assert_eq!(batch[2], batch[0]);
    }

    #[test]
    fn test_sentence_boundary_features() {
        let tokens = vec![
            InputToken::new("the", "DT"),
            InputToken::new("dog", "NN"),
            InputToken::new("runs", "VBZ"),
        ];
        let features = TemplateExtractor::default().sentence_boundary_features(&tokens);
        assert_eq!(features.len(), 2);
        assert_eq!(features[1][0], "w1w2:dog_runs");
        assert!(TemplateExtractor::default().sentence_boundary_features(&tokens[..1]).is_empty());
    }
}
