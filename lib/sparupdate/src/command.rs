use crate::template::{GraphNameTemplate, QuadTemplate};
use oxrdf::{GraphName, NamedNode, Quad};
use std::fmt;

/// The graphs targeted by `CLEAR` and `DROP`.
///
/// Could be a specific graph, all named graphs or the complete dataset.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum GraphTarget {
    NamedNode(NamedNode),
    DefaultGraph,
    NamedGraphs,
    AllGraphs,
}

impl GraphTarget {
    /// Checks if the graph is one of the targeted graphs.
    pub fn contains(&self, graph_name: &GraphName) -> bool {
        match self {
            Self::NamedNode(node) => matches!(graph_name, GraphName::NamedNode(n) if n == node),
            Self::DefaultGraph => graph_name.is_default_graph(),
            Self::NamedGraphs => !graph_name.is_default_graph(),
            Self::AllGraphs => true,
        }
    }
}

impl fmt::Display for GraphTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => write!(f, "GRAPH {node}"),
            Self::DefaultGraph => f.write_str("DEFAULT"),
            Self::NamedGraphs => f.write_str("NAMED"),
            Self::AllGraphs => f.write_str("ALL"),
        }
    }
}

impl From<NamedNode> for GraphTarget {
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<GraphName> for GraphTarget {
    fn from(graph_name: GraphName) -> Self {
        match graph_name {
            GraphName::NamedNode(node) => Self::NamedNode(node),
            GraphName::DefaultGraph => Self::DefaultGraph,
            // Not expressible in SPARQL, the closest target containing it
            GraphName::BlankNode(_) => Self::NamedGraphs,
        }
    }
}

/// A [SPARQL 1.1 Update](https://www.w3.org/TR/sparql11-update/) command.
///
/// `MOVE`, `COPY` and `ADD` are kept as first-class commands and not desugared into `DROP` and `INSERT`.
///
/// ```
/// use oxrdf::{GraphName, NamedNode};
/// use sparupdate::UpdateCommand;
///
/// let command = UpdateCommand::Move {
///     source: NamedNode::new("http://example.com/a")?.into(),
///     destination: GraphName::DefaultGraph,
///     silent: true,
/// };
/// assert_eq!(command.to_string(), "MOVE SILENT <http://example.com/a> TO DEFAULT");
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum UpdateCommand {
    /// [insert data](https://www.w3.org/TR/sparql11-update/#defn_insertDataOperation).
    InsertData { data: Vec<Quad> },
    /// [delete data](https://www.w3.org/TR/sparql11-update/#defn_deleteDataOperation).
    DeleteData { data: Vec<Quad> },
    /// [delete insert](https://www.w3.org/TR/sparql11-update/#defn_deleteInsertOperation).
    ///
    /// The solutions of the `WHERE` clause are given by [`UpdateContext::with_solutions`](crate::UpdateContext::with_solutions).
    DeleteInsert {
        delete: Vec<QuadTemplate>,
        insert: Vec<QuadTemplate>,
    },
    /// [clear](https://www.w3.org/TR/sparql11-update/#defn_clearOperation).
    Clear { graph: GraphTarget, silent: bool },
    /// [create](https://www.w3.org/TR/sparql11-update/#defn_createOperation).
    Create { graph: NamedNode, silent: bool },
    /// [drop](https://www.w3.org/TR/sparql11-update/#defn_dropOperation).
    Drop { graph: GraphTarget, silent: bool },
    /// [add](https://www.w3.org/TR/sparql11-update/#add).
    Add {
        source: GraphName,
        destination: GraphName,
        silent: bool,
    },
    /// [copy](https://www.w3.org/TR/sparql11-update/#copy).
    ///
    /// The destination content is replaced, including when it is the default graph.
    /// [`Move`](Self::Move) is the only transfer that keeps the existing default graph triples.
    Copy {
        source: GraphName,
        destination: GraphName,
        silent: bool,
    },
    /// [move](https://www.w3.org/TR/sparql11-update/#move).
    ///
    /// A default graph destination is merged into and keeps its existing triples.
    Move {
        source: GraphName,
        destination: GraphName,
        silent: bool,
    },
}

impl UpdateCommand {
    /// Whether failures of this command are suppressed.
    pub fn is_silent(&self) -> bool {
        match self {
            Self::InsertData { .. } | Self::DeleteData { .. } | Self::DeleteInsert { .. } => false,
            Self::Clear { silent, .. }
            | Self::Create { silent, .. }
            | Self::Drop { silent, .. }
            | Self::Add { silent, .. }
            | Self::Copy { silent, .. }
            | Self::Move { silent, .. } => *silent,
        }
    }

    /// The graphs this command may modify.
    ///
    /// Templates with a variable in graph position may modify any named graph.
    pub fn affected_graphs(&self) -> Vec<GraphTarget> {
        let mut targets = Vec::new();
        match self {
            Self::InsertData { data } | Self::DeleteData { data } => {
                for quad in data {
                    push_target(&mut targets, quad.graph_name.clone().into());
                }
            }
            Self::DeleteInsert { delete, insert } => {
                for template in delete.iter().chain(insert) {
                    push_target(
                        &mut targets,
                        match &template.graph_name {
                            GraphNameTemplate::NamedNode(node) => node.clone().into(),
                            GraphNameTemplate::DefaultGraph => GraphTarget::DefaultGraph,
                            GraphNameTemplate::Variable(_) => GraphTarget::NamedGraphs,
                        },
                    );
                }
            }
            Self::Clear { graph, .. } | Self::Drop { graph, .. } => {
                targets.push(graph.clone());
            }
            Self::Create { graph, .. } => targets.push(graph.clone().into()),
            Self::Add { destination, .. } | Self::Copy { destination, .. } => {
                targets.push(destination.clone().into());
            }
            Self::Move {
                source,
                destination,
                ..
            } => {
                push_target(&mut targets, source.clone().into());
                push_target(&mut targets, destination.clone().into());
            }
        }
        targets
    }

    /// Checks if the command may modify the given graph.
    pub fn affects_graph(&self, graph_name: &GraphName) -> bool {
        self.affected_graphs()
            .iter()
            .any(|target| target.contains(graph_name))
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::InsertData { .. } => "INSERT DATA",
            Self::DeleteData { .. } => "DELETE DATA",
            Self::DeleteInsert { .. } => "DELETE/INSERT",
            Self::Clear { .. } => "CLEAR",
            Self::Create { .. } => "CREATE",
            Self::Drop { .. } => "DROP",
            Self::Add { .. } => "ADD",
            Self::Copy { .. } => "COPY",
            Self::Move { .. } => "MOVE",
        }
    }
}

fn push_target(targets: &mut Vec<GraphTarget>, target: GraphTarget) {
    if !targets.contains(&target) {
        targets.push(target);
    }
}

impl fmt::Display for UpdateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsertData { data } => {
                writeln!(f, "INSERT DATA {{")?;
                write_quads(data, f)?;
                f.write_str("}")
            }
            Self::DeleteData { data } => {
                writeln!(f, "DELETE DATA {{")?;
                write_quads(data, f)?;
                f.write_str("}")
            }
            Self::DeleteInsert { delete, insert } => {
                if !delete.is_empty() {
                    writeln!(f, "DELETE {{")?;
                    for template in delete {
                        writeln!(f, "\t{template}")?;
                    }
                    writeln!(f, "}}")?;
                }
                if !insert.is_empty() {
                    writeln!(f, "INSERT {{")?;
                    for template in insert {
                        writeln!(f, "\t{template}")?;
                    }
                    writeln!(f, "}}")?;
                }
                f.write_str("WHERE { ... }")
            }
            Self::Clear { graph, silent } => {
                f.write_str("CLEAR ")?;
                if *silent {
                    f.write_str("SILENT ")?;
                }
                write!(f, "{graph}")
            }
            Self::Create { graph, silent } => {
                f.write_str("CREATE ")?;
                if *silent {
                    f.write_str("SILENT ")?;
                }
                write!(f, "GRAPH {graph}")
            }
            Self::Drop { graph, silent } => {
                f.write_str("DROP ")?;
                if *silent {
                    f.write_str("SILENT ")?;
                }
                write!(f, "{graph}")
            }
            Self::Add {
                source,
                destination,
                silent,
            }
            | Self::Copy {
                source,
                destination,
                silent,
            }
            | Self::Move {
                source,
                destination,
                silent,
            } => {
                write!(f, "{} ", self.name())?;
                if *silent {
                    f.write_str("SILENT ")?;
                }
                write!(f, "{source} TO {destination}")
            }
        }
    }
}

fn write_quads(quads: &[Quad], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for quad in quads {
        if quad.graph_name.is_default_graph() {
            writeln!(f, "\t{} {} {} .", quad.subject, quad.predicate, quad.object)?;
        } else {
            writeln!(
                f,
                "\tGRAPH {} {{ {} {} {} }}",
                quad.graph_name, quad.subject, quad.predicate, quad.object
            )?;
        }
    }
    Ok(())
}
