use oxrdf::{BlankNode, Graph, GraphName, NamedOrBlankNode, Quad, Term, Triple, TripleRef};
use rustc_hash::FxHashMap;
use std::convert::Infallible;
use std::error::Error;

/// A mutable collection of graphs the update commands are executed against.
///
/// To execute updates against your own storage, implement this trait.
/// The default graph is identified by [`GraphName::DefaultGraph`].
/// Creating a missing graph is never implied: [`graph_mut`](Self::graph_mut) returns `None` for unknown graphs.
pub trait UpdatableDataset {
    type Error: Error + Send + Sync + 'static;

    fn has_graph(&self, name: &GraphName) -> Result<bool, Self::Error>;

    /// Read access to a graph, `None` if it does not exist.
    fn graph(&self, name: &GraphName) -> Result<Option<&NamedGraph>, Self::Error>;

    /// Write access to a graph, `None` if it does not exist.
    fn graph_mut(&mut self, name: &GraphName) -> Result<Option<&mut NamedGraph>, Self::Error>;

    /// Adds the graph to the dataset, replacing any graph with the same name.
    fn add_graph(&mut self, graph: NamedGraph) -> Result<(), Self::Error>;

    /// Removes the graph. Returns `false` if it did not exist.
    fn remove_graph(&mut self, name: &GraphName) -> Result<bool, Self::Error>;

    /// The names of all the graphs of the dataset except the default graph.
    fn named_graphs(&self) -> Result<Vec<GraphName>, Self::Error>;
}

/// A graph tagged with its name.
#[derive(Debug, PartialEq, Eq)]
pub struct NamedGraph {
    name: GraphName,
    triples: Graph,
}

impl NamedGraph {
    /// Creates an empty graph.
    pub fn new(name: impl Into<GraphName>) -> Self {
        Self {
            name: name.into(),
            triples: Graph::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &GraphName {
        &self.name
    }

    #[inline]
    pub fn set_name(&mut self, name: impl Into<GraphName>) {
        self.name = name.into();
    }

    pub fn insert<'a>(&mut self, triple: impl Into<TripleRef<'a>>) -> bool {
        self.triples.insert(triple)
    }

    pub fn remove<'a>(&mut self, triple: impl Into<TripleRef<'a>>) -> bool {
        self.triples.remove(triple)
    }

    pub fn contains<'a>(&self, triple: impl Into<TripleRef<'a>>) -> bool {
        self.triples.contains(triple)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TripleRef<'_>> {
        self.triples.iter()
    }

    pub fn clear(&mut self) {
        self.triples.clear();
    }

    /// Copies the triples of the graph.
    pub fn snapshot(&self) -> Vec<Triple> {
        self.triples.iter().map(TripleRef::into_owned).collect()
    }

    /// Adds the triples to the graph.
    ///
    /// Blank nodes get fresh identities: the same blank node is mapped to the same fresh node within one merge,
    /// two merges of the same triples never share blank nodes.
    pub fn merge(&mut self, triples: impl IntoIterator<Item = Triple>) {
        let mut bnodes = FxHashMap::default();
        for triple in triples {
            self.triples
                .insert(&rename_triple_blank_nodes(triple, &mut bnodes));
        }
    }

    #[inline]
    pub fn as_graph(&self) -> &Graph {
        &self.triples
    }

    #[inline]
    pub fn into_graph(self) -> Graph {
        self.triples
    }
}

pub(crate) fn rename_blank_node(
    node: &BlankNode,
    bnodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> BlankNode {
    bnodes.entry(node.clone()).or_default().clone()
}

pub(crate) fn rename_triple_blank_nodes(
    triple: Triple,
    bnodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Triple {
    Triple {
        subject: match triple.subject {
            NamedOrBlankNode::BlankNode(node) => rename_blank_node(&node, bnodes).into(),
            subject @ NamedOrBlankNode::NamedNode(_) => subject,
        },
        predicate: triple.predicate,
        object: match triple.object {
            Term::BlankNode(node) => rename_blank_node(&node, bnodes).into(),
            #[cfg(feature = "rdf-12")]
            Term::Triple(triple) => rename_triple_blank_nodes(*triple, bnodes).into(),
            object => object,
        },
    }
}

/// An in-memory [`UpdatableDataset`].
///
/// The default graph always exists.
///
/// ```
/// use oxrdf::{GraphName, NamedNode, Quad};
/// use sparupdate::{MemoryDataset, UpdatableDataset};
///
/// let ex = NamedNode::new("http://example.com")?;
/// let dataset = MemoryDataset::from_iter([Quad::new(
///     ex.clone(),
///     ex.clone(),
///     ex.clone(),
///     ex.clone(),
/// )]);
/// assert!(dataset.has_graph(&GraphName::DefaultGraph)?);
/// assert!(dataset.has_graph(&ex.into())?);
/// assert_eq!(dataset.quads().len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug)]
pub struct MemoryDataset {
    default_graph: NamedGraph,
    named_graphs: FxHashMap<GraphName, NamedGraph>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self {
            default_graph: NamedGraph::new(GraphName::DefaultGraph),
            named_graphs: FxHashMap::default(),
        }
    }

    /// Inserts a quad, creating its graph if needed.
    pub fn insert(&mut self, quad: Quad) -> bool {
        let graph = if quad.graph_name.is_default_graph() {
            &mut self.default_graph
        } else {
            self.named_graphs
                .entry(quad.graph_name.clone())
                .or_insert_with(|| NamedGraph::new(quad.graph_name.clone()))
        };
        graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object))
    }

    /// All the quads of the dataset.
    pub fn quads(&self) -> Vec<Quad> {
        let mut quads = Vec::with_capacity(self.len());
        for graph in [&self.default_graph]
            .into_iter()
            .chain(self.named_graphs.values())
        {
            quads.extend(
                graph
                    .iter()
                    .map(|triple| triple.into_owned().in_graph(graph.name().clone())),
            );
        }
        quads
    }

    /// The number of triples in all graphs.
    pub fn len(&self) -> usize {
        self.default_graph.len() + self.named_graphs.values().map(NamedGraph::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Quad> for MemoryDataset {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        let mut dataset = Self::new();
        for quad in iter {
            dataset.insert(quad);
        }
        dataset
    }
}

impl UpdatableDataset for MemoryDataset {
    type Error = Infallible;

    fn has_graph(&self, name: &GraphName) -> Result<bool, Infallible> {
        Ok(name.is_default_graph() || self.named_graphs.contains_key(name))
    }

    fn graph(&self, name: &GraphName) -> Result<Option<&NamedGraph>, Infallible> {
        Ok(if name.is_default_graph() {
            Some(&self.default_graph)
        } else {
            self.named_graphs.get(name)
        })
    }

    fn graph_mut(&mut self, name: &GraphName) -> Result<Option<&mut NamedGraph>, Infallible> {
        Ok(if name.is_default_graph() {
            Some(&mut self.default_graph)
        } else {
            self.named_graphs.get_mut(name)
        })
    }

    fn add_graph(&mut self, graph: NamedGraph) -> Result<(), Infallible> {
        if graph.name().is_default_graph() {
            self.default_graph = graph;
        } else {
            self.named_graphs.insert(graph.name().clone(), graph);
        }
        Ok(())
    }

    /// The default graph is never removed, only cleared.
    fn remove_graph(&mut self, name: &GraphName) -> Result<bool, Infallible> {
        Ok(if name.is_default_graph() {
            self.default_graph.clear();
            true
        } else {
            self.named_graphs.remove(name).is_some()
        })
    }

    fn named_graphs(&self) -> Result<Vec<GraphName>, Infallible> {
        Ok(self.named_graphs.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{NamedNode, NamedOrBlankNodeRef, TermRef};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn merge_mints_fresh_blank_nodes() {
        let b = BlankNode::default();
        let triples = vec![
            Triple::new(b.clone(), ex("p"), ex("o")),
            Triple::new(ex("s"), ex("p"), b.clone()),
        ];
        let mut graph = NamedGraph::new(ex("g"));
        graph.merge(triples.clone());
        graph.merge(triples);
        assert_eq!(graph.len(), 4);
        let subjects = graph
            .iter()
            .filter_map(|t| match t.subject {
                NamedOrBlankNodeRef::BlankNode(b) => Some(b.into_owned()),
                NamedOrBlankNodeRef::NamedNode(_) => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(subjects.len(), 2);
        assert_ne!(subjects[0], subjects[1]);
        assert!(!subjects.contains(&b));
        for subject in subjects {
            assert!(graph.iter().any(|t| t.object == TermRef::from(subject.as_ref())));
        }
    }

    #[test]
    fn default_graph_always_exists() -> Result<(), Infallible> {
        let mut dataset = MemoryDataset::new();
        dataset.insert(Quad::new(ex("s"), ex("p"), ex("o"), GraphName::DefaultGraph));
        assert!(dataset.remove_graph(&GraphName::DefaultGraph)?);
        assert!(dataset.has_graph(&GraphName::DefaultGraph)?);
        assert!(dataset.is_empty());
        assert!(dataset.named_graphs()?.is_empty());
        Ok(())
    }

    #[test]
    fn quads_round_trip() {
        let quads = vec![
            Quad::new(ex("s"), ex("p"), ex("o"), GraphName::DefaultGraph),
            Quad::new(ex("s"), ex("p"), ex("o"), ex("g1")),
            Quad::new(ex("s"), ex("p"), ex("o2"), ex("g2")),
        ];
        let dataset = quads.iter().cloned().collect::<MemoryDataset>();
        let mut actual = dataset.quads();
        actual.sort_by_key(ToString::to_string);
        let mut expected = quads;
        expected.sort_by_key(ToString::to_string);
        assert_eq!(actual, expected);
    }
}
