//! # depfeat-core — Engenharia de Features para Parser de Dependências
//!
//! Camada de features de um parser de dependências baseado em transições (shift-reduce)
//! treinado com um classificador linear.
//!
//! ## Fluxo de Dados
//!
//! 1.  **Contexto** ([`context`]): configuração atual do parser (fila de entrada + pilha).
//! 2.  **Templates** ([`templates`]): o contexto vira uma lista ordenada de nomes de features
//!     (37 templates de lattice, 6 de fronteira).
//! 3.  **Dicionário** ([`dictionary`]): cada nome recebe um id estável, append-only.
//! 4.  **Codificação** ([`encoder`]): ids viram um vetor esparso 1-based, ordenado e sem duplicatas.
//! 5.  **Persistência** ([`persistence`]): os dicionários são congelados em arquivo após o treino
//!     e recarregados, idênticos, na inferência.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use depfeat_core::{FeatureSession, InputToken, ParserState, StackNode};
//!
//! let mut session = FeatureSession::default();
//!
//! let state = ParserState::new(
//!     vec![InputToken::new("runs", "VBZ")],
//!     vec![StackNode::new(InputToken::new("dog", "NN"), 1)],
//! );
//!
//! let features = session.lattice_features(&state);
//! assert_eq!(features[0], "0:dog");
//! assert_eq!(features[1], "1:null"); // pilha com um só nó
//!
//! let (label, vector) = session.encode_instance("SHIFT", &features).unwrap();
//! assert_eq!(label, 0);
//! assert!(vector.windows(2).all(|w| w[0].index < w[1].index));
//! ```

pub mod config;
pub mod context;
pub mod counter;
pub mod dictionary;
pub mod encoder;
pub mod errors;
pub mod persistence;
pub mod session;
pub mod templates;

pub use config::FeatureConfig;
pub use context::{ChildEdge, InputToken, ParseContext, ParserState, StackNode};
pub use counter::FeatureCounter;
pub use dictionary::{FeatureDictionary, LabelDictionary};
pub use encoder::FeatureNode;
pub use errors::{FeatureError, Result};
pub use session::FeatureSession;
pub use templates::{boundary_features, lattice_features, TemplateExtractor};
