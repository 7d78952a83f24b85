//! # Contexto do Parser
//!
//! Visão somente-leitura da configuração de um parser de transições (shift-reduce):
//! a fila de entrada (lookahead de até [`LOOKAHEAD`] tokens) e a pilha de nós
//! parcialmente construídos, cada um com seus filhos já ligados por arcos rotulados.
//!
//! O sistema de transições em si (quem empilha, reduz e cria arcos) fica fora deste crate:
//! aqui só é definido o contrato de leitura ([`ParseContext`]) e uma implementação
//! simples e serializável ([`ParserState`]).

use serde::{Deserialize, Serialize};

/// Quantos tokens da fila os templates enxergam.
pub const LOOKAHEAD: usize = 3;

/// Palavra e etiqueta morfossintática (POS tag) de um token de entrada.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputToken {
    pub word: String,
    pub tag: String,
}

impl InputToken {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
    }
}

/// Arco de dependência de um nó para um filho.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildEdge {
    /// Rótulo de dependência (ex: `nsubj`, `det`).
    pub label: String,
    pub node: StackNode,
}

/// Nó da pilha do parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackNode {
    pub token: InputToken,
    /// Posição do token na sentença; define quem é o filho mais à esquerda/direita.
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub children: Vec<ChildEdge>,
}

impl StackNode {
    pub fn new(token: InputToken, position: usize) -> Self {
        Self {
            token,
            position,
            children: Vec::new(),
        }
    }

    /// Adiciona um filho (estilo builder).
    pub fn with_child(mut self, label: impl Into<String>, child: StackNode) -> Self {
        self.children.push(ChildEdge {
            label: label.into(),
            node: child,
        });
        self
    }

    /// Filho de menor posição, se houver filhos.
    pub fn leftmost_child(&self) -> Option<&ChildEdge> {
        self.children.iter().min_by_key(|c| c.node.position)
    }

    /// Filho de maior posição, se houver filhos.
    pub fn rightmost_child(&self) -> Option<&ChildEdge> {
        self.children.iter().max_by_key(|c| c.node.position)
    }
}

/// Contrato de leitura que o extrator de templates espera do parser.
pub trait ParseContext {
    /// `i`-ésimo token ainda na fila (0 = próximo a ser lido).
    fn lookahead(&self, i: usize) -> Option<&InputToken>;

    /// Nó na profundidade `depth` da pilha (0 = topo).
    fn stack(&self, depth: usize) -> Option<&StackNode>;
}

/// Configuração concreta do parser: fila restante e pilha (topo no fim do vetor).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserState {
    #[serde(default)]
    pub input: Vec<InputToken>,
    #[serde(default)]
    pub stack: Vec<StackNode>,
}

impl ParserState {
    pub fn new(input: Vec<InputToken>, stack: Vec<StackNode>) -> Self {
        Self { input, stack }
    }
}

impl ParseContext for ParserState {
    fn lookahead(&self, i: usize) -> Option<&InputToken> {
        if i >= LOOKAHEAD {
            return None;
        }
        self.input.get(i)
    }

    fn stack(&self, depth: usize) -> Option<&StackNode> {
        let idx = self.stack.len().checked_sub(depth + 1)?;
        self.stack.get(idx)
    }
}

impl<T: ParseContext + ?Sized> ParseContext for &T {
    fn lookahead(&self, i: usize) -> Option<&InputToken> {
        (**self).lookahead(i)
    }

    fn stack(&self, depth: usize) -> Option<&StackNode> {
        (**self).stack(depth)
    }
}
