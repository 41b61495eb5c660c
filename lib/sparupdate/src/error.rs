use oxrdf::GraphName;
use std::convert::Infallible;
use std::error::Error;

/// An error raised while executing an update command.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum UpdateEvaluationError {
    /// The source graph of `ADD`, `COPY` or `MOVE` does not exist
    #[error("{}", missing_graph_message(.0, "source"))]
    SourceGraphMissing(GraphName),
    /// The target graph of `CLEAR` or `DROP` does not exist
    #[error("{}", missing_graph_message(.0, "target"))]
    GraphDoesNotExist(GraphName),
    /// The graph to `CREATE` already exists
    #[error("The graph {0} already exists")]
    GraphAlreadyExists(GraphName),
    /// `DELETE`/`INSERT` has been executed without the solutions of its `WHERE` clause
    #[error("No solutions have been provided to instantiate the DELETE/INSERT templates")]
    MissingSolutions,
    /// Error from the underlying dataset
    #[error(transparent)]
    Dataset(Box<dyn Error + Send + Sync + 'static>),
}

impl UpdateEvaluationError {
    pub(crate) fn dataset(error: impl Error + Send + Sync + 'static) -> Self {
        Self::Dataset(Box::new(error))
    }
}

impl From<Infallible> for UpdateEvaluationError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}

fn missing_graph_message(graph_name: &GraphName, role: &str) -> String {
    match graph_name {
        GraphName::DefaultGraph => format!("The {role} default graph does not exist"),
        GraphName::NamedNode(_) | GraphName::BlankNode(_) => {
            format!("The {role} named graph {graph_name} does not exist")
        }
    }
}
