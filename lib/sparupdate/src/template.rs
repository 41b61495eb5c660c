//! Quad templates of `DELETE`/`INSERT`, instantiated once per solution.

use crate::dataset::rename_blank_node;
#[cfg(feature = "rdf-12")]
use oxrdf::Triple;
use oxrdf::{BlankNode, GraphName, Literal, NamedNode, NamedOrBlankNode, Quad, Term, Variable};
use rustc_hash::FxHashMap;
use sparexpr::BindingSource;
use std::fmt;

/// A term or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermTemplate {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    Variable(Variable),
    #[cfg(feature = "rdf-12")]
    Triple(Box<TripleTemplate>),
}

impl fmt::Display for TermTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::BlankNode(node) => node.fmt(f),
            Self::Literal(literal) => literal.fmt(f),
            Self::Variable(variable) => variable.fmt(f),
            #[cfg(feature = "rdf-12")]
            Self::Triple(triple) => write!(f, "<<( {triple} )>>"),
        }
    }
}

impl From<NamedNode> for TermTemplate {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<BlankNode> for TermTemplate {
    #[inline]
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

impl From<Literal> for TermTemplate {
    #[inline]
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Variable> for TermTemplate {
    #[inline]
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<Term> for TermTemplate {
    fn from(term: Term) -> Self {
        match term {
            Term::NamedNode(node) => node.into(),
            Term::BlankNode(node) => node.into(),
            Term::Literal(literal) => literal.into(),
            #[cfg(feature = "rdf-12")]
            Term::Triple(triple) => Self::Triple(Box::new((*triple).into())),
        }
    }
}

/// An IRI or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamedNodeTemplate {
    NamedNode(NamedNode),
    Variable(Variable),
}

impl fmt::Display for NamedNodeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::Variable(variable) => variable.fmt(f),
        }
    }
}

impl From<NamedNode> for NamedNodeTemplate {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<Variable> for NamedNodeTemplate {
    #[inline]
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

/// A graph name or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphNameTemplate {
    NamedNode(NamedNode),
    DefaultGraph,
    Variable(Variable),
}

impl From<NamedNode> for GraphNameTemplate {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<Variable> for GraphNameTemplate {
    #[inline]
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<GraphName> for GraphNameTemplate {
    fn from(graph_name: GraphName) -> Self {
        match graph_name {
            GraphName::NamedNode(node) => Self::NamedNode(node),
            // Blank node graph names can't be written in SPARQL
            GraphName::DefaultGraph | GraphName::BlankNode(_) => Self::DefaultGraph,
        }
    }
}

/// A triple template, only allowed as a quoted triple.
#[cfg(feature = "rdf-12")]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TripleTemplate {
    pub subject: TermTemplate,
    pub predicate: NamedNodeTemplate,
    pub object: TermTemplate,
}

#[cfg(feature = "rdf-12")]
impl From<Triple> for TripleTemplate {
    fn from(triple: Triple) -> Self {
        Self {
            subject: match triple.subject {
                NamedOrBlankNode::NamedNode(node) => node.into(),
                NamedOrBlankNode::BlankNode(node) => node.into(),
            },
            predicate: triple.predicate.into(),
            object: triple.object.into(),
        }
    }
}

#[cfg(feature = "rdf-12")]
impl fmt::Display for TripleTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// A quad template of `DELETE` or `INSERT`.
///
/// ```
/// use oxrdf::{NamedNode, Variable};
/// use sparupdate::{GraphNameTemplate, QuadTemplate};
///
/// let template = QuadTemplate::new(
///     Variable::new("s")?,
///     NamedNode::new("http://example.com/p")?,
///     Variable::new("o")?,
///     GraphNameTemplate::DefaultGraph,
/// );
/// assert_eq!(template.to_string(), "?s <http://example.com/p> ?o .");
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuadTemplate {
    pub subject: TermTemplate,
    pub predicate: NamedNodeTemplate,
    pub object: TermTemplate,
    pub graph_name: GraphNameTemplate,
}

impl QuadTemplate {
    pub fn new(
        subject: impl Into<TermTemplate>,
        predicate: impl Into<NamedNodeTemplate>,
        object: impl Into<TermTemplate>,
        graph_name: impl Into<GraphNameTemplate>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph_name: graph_name.into(),
        }
    }

    /// Instantiates the template with a solution.
    ///
    /// Returns `None` if a variable is unbound, bound to a term not allowed at its position,
    /// or if the template contains a blank node while no blank node mapping is given.
    /// Blank nodes are renamed through `bnodes`.
    pub(crate) fn instantiate(
        &self,
        bindings: &dyn BindingSource,
        binding: usize,
        mut bnodes: Option<&mut FxHashMap<BlankNode, BlankNode>>,
    ) -> Option<Quad> {
        Some(Quad {
            subject: fill_subject(&self.subject, bindings, binding, bnodes.as_deref_mut())?,
            predicate: fill_named_node(&self.predicate, bindings, binding)?,
            object: fill_term(&self.object, bindings, binding, bnodes)?,
            graph_name: fill_graph_name(&self.graph_name, bindings, binding)?,
        })
    }
}

impl fmt::Display for QuadTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.graph_name == GraphNameTemplate::DefaultGraph {
            write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
        } else {
            let graph_name = match &self.graph_name {
                GraphNameTemplate::NamedNode(node) => node.to_string(),
                GraphNameTemplate::Variable(variable) => variable.to_string(),
                GraphNameTemplate::DefaultGraph => String::new(),
            };
            write!(
                f,
                "GRAPH {graph_name} {{ {} {} {} }}",
                self.subject, self.predicate, self.object
            )
        }
    }
}

fn fill_term(
    term: &TermTemplate,
    bindings: &dyn BindingSource,
    binding: usize,
    bnodes: Option<&mut FxHashMap<BlankNode, BlankNode>>,
) -> Option<Term> {
    Some(match term {
        TermTemplate::NamedNode(node) => node.clone().into(),
        TermTemplate::BlankNode(node) => rename_blank_node(node, bnodes?).into(),
        TermTemplate::Literal(literal) => literal.clone().into(),
        TermTemplate::Variable(v) => bindings.value(v, binding)?.clone(),
        #[cfg(feature = "rdf-12")]
        TermTemplate::Triple(triple) => fill_triple(triple, bindings, binding, bnodes)?.into(),
    })
}

fn fill_subject(
    term: &TermTemplate,
    bindings: &dyn BindingSource,
    binding: usize,
    bnodes: Option<&mut FxHashMap<BlankNode, BlankNode>>,
) -> Option<NamedOrBlankNode> {
    match fill_term(term, bindings, binding, bnodes)? {
        Term::NamedNode(node) => Some(node.into()),
        Term::BlankNode(node) => Some(node.into()),
        Term::Literal(_) => None,
        #[cfg(feature = "rdf-12")]
        Term::Triple(_) => None,
    }
}

fn fill_named_node(
    term: &NamedNodeTemplate,
    bindings: &dyn BindingSource,
    binding: usize,
) -> Option<NamedNode> {
    Some(match term {
        NamedNodeTemplate::NamedNode(node) => node.clone(),
        NamedNodeTemplate::Variable(v) => {
            if let Term::NamedNode(node) = bindings.value(v, binding)? {
                node.clone()
            } else {
                return None;
            }
        }
    })
}

fn fill_graph_name(
    term: &GraphNameTemplate,
    bindings: &dyn BindingSource,
    binding: usize,
) -> Option<GraphName> {
    Some(match term {
        GraphNameTemplate::NamedNode(node) => node.clone().into(),
        GraphNameTemplate::DefaultGraph => GraphName::DefaultGraph,
        GraphNameTemplate::Variable(v) => match bindings.value(v, binding)? {
            Term::NamedNode(node) => node.clone().into(),
            Term::BlankNode(node) => node.clone().into(),
            _ => return None,
        },
    })
}

#[cfg(feature = "rdf-12")]
fn fill_triple(
    triple: &TripleTemplate,
    bindings: &dyn BindingSource,
    binding: usize,
    mut bnodes: Option<&mut FxHashMap<BlankNode, BlankNode>>,
) -> Option<Triple> {
    Some(Triple {
        subject: fill_subject(&triple.subject, bindings, binding, bnodes.as_deref_mut())?,
        predicate: fill_named_node(&triple.predicate, bindings, binding)?,
        object: fill_term(&triple.object, bindings, binding, bnodes)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparexpr::SolutionMultiset;

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn unbound_or_invalid_positions_are_skipped() {
        let s = Variable::new_unchecked("s");
        let g = Variable::new_unchecked("g");
        let mut solutions = SolutionMultiset::new();
        let complete = solutions.push([(s.clone(), ex("s").into()), (g.clone(), ex("g").into())]);
        let unbound = solutions.push(Vec::<(Variable, Term)>::new());
        let literal = solutions.push([(s.clone(), Literal::from(1).into())]);
        let template = QuadTemplate::new(s, ex("p"), ex("o"), g);
        assert_eq!(
            template.instantiate(&solutions, complete, None),
            Some(Quad::new(ex("s"), ex("p"), ex("o"), ex("g")))
        );
        assert_eq!(template.instantiate(&solutions, unbound, None), None);
        assert_eq!(template.instantiate(&solutions, literal, None), None);
    }

    #[test]
    fn blank_nodes_need_a_mapping() {
        let b = BlankNode::default();
        let mut solutions = SolutionMultiset::new();
        solutions.push(Vec::<(Variable, Term)>::new());
        let template = QuadTemplate::new(
            b.clone(),
            ex("p"),
            b.clone(),
            GraphNameTemplate::DefaultGraph,
        );
        assert_eq!(template.instantiate(&solutions, 0, None), None);
        let mut bnodes = FxHashMap::default();
        let quad = template
            .instantiate(&solutions, 0, Some(&mut bnodes))
            .unwrap();
        assert_ne!(quad.subject, NamedOrBlankNode::from(b));
        assert_eq!(Term::from(quad.subject), quad.object);
    }
}
