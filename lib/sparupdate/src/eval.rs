use crate::command::{GraphTarget, UpdateCommand};
use crate::dataset::{NamedGraph, UpdatableDataset, rename_triple_blank_nodes};
use crate::error::UpdateEvaluationError;
use crate::template::QuadTemplate;
use oxrdf::{GraphName, NamedNode, Quad, Triple};
use rustc_hash::FxHashMap;
use sparexpr::BindingSource;
use std::fmt;

/// The dataset the update commands are executed against, with the solutions of a `WHERE` clause if any.
pub struct UpdateContext<'a, D: UpdatableDataset> {
    dataset: &'a mut D,
    solutions: Option<&'a dyn BindingSource>,
}

impl<'a, D: UpdatableDataset> UpdateContext<'a, D> {
    pub fn new(dataset: &'a mut D) -> Self {
        Self {
            dataset,
            solutions: None,
        }
    }

    /// Sets the solutions used to instantiate the `DELETE`/`INSERT` templates.
    #[must_use]
    pub fn with_solutions(mut self, solutions: &'a dyn BindingSource) -> Self {
        self.solutions = Some(solutions);
        self
    }

    #[inline]
    pub fn dataset(&self) -> &D {
        self.dataset
    }
}

impl<D: UpdatableDataset> fmt::Debug for UpdateContext<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateContext")
            .field(
                "solutions",
                &self.solutions.map(BindingSource::binding_count),
            )
            .finish_non_exhaustive()
    }
}

/// The result of a command execution.
#[derive(Debug)]
#[must_use]
pub enum UpdateOutcome {
    /// The command completed.
    Applied,
    /// The command is silent and failed: the changes done before the failure are kept.
    Suppressed(UpdateEvaluationError),
}

impl UpdateOutcome {
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// The suppressed error, if any.
    #[inline]
    pub fn suppressed_error(&self) -> Option<&UpdateEvaluationError> {
        match self {
            Self::Applied => None,
            Self::Suppressed(error) => Some(error),
        }
    }
}

impl UpdateCommand {
    /// Executes the command against the context dataset.
    ///
    /// Failures of silent commands are returned as [`UpdateOutcome::Suppressed`].
    /// No rollback is done: a failing command keeps the changes it did before failing.
    ///
    /// ```
    /// use oxrdf::{GraphName, NamedNode, Quad};
    /// use sparupdate::{MemoryDataset, UpdatableDataset, UpdateCommand, UpdateContext};
    ///
    /// let a = NamedNode::new("http://example.com/a")?;
    /// let mut dataset = MemoryDataset::from_iter([Quad::new(
    ///     a.clone(),
    ///     a.clone(),
    ///     a.clone(),
    ///     a.clone(),
    /// )]);
    /// let command = UpdateCommand::Move {
    ///     source: a.clone().into(),
    ///     destination: GraphName::DefaultGraph,
    ///     silent: false,
    /// };
    /// assert!(command.execute(&mut UpdateContext::new(&mut dataset))?.is_applied());
    /// assert!(!dataset.has_graph(&a.into())?);
    /// assert_eq!(dataset.len(), 1);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn execute<D: UpdatableDataset>(
        &self,
        context: &mut UpdateContext<'_, D>,
    ) -> Result<UpdateOutcome, UpdateEvaluationError> {
        tracing::debug!(command = %self, "executing update command");
        match self.apply(context) {
            Ok(()) => Ok(UpdateOutcome::Applied),
            Err(error) if self.is_silent() => {
                tracing::warn!(command = %self, error = %error, "silent update command failed");
                Ok(UpdateOutcome::Suppressed(error))
            }
            Err(error) => Err(error),
        }
    }

    fn apply<D: UpdatableDataset>(
        &self,
        context: &mut UpdateContext<'_, D>,
    ) -> Result<(), UpdateEvaluationError> {
        let dataset = &mut *context.dataset;
        match self {
            Self::InsertData { data } => eval_insert_data(dataset, data),
            Self::DeleteData { data } => eval_delete_data(dataset, data),
            Self::DeleteInsert { delete, insert } => eval_delete_insert(
                dataset,
                delete,
                insert,
                context
                    .solutions
                    .ok_or(UpdateEvaluationError::MissingSolutions)?,
            ),
            Self::Clear { graph, .. } => eval_clear(dataset, graph),
            Self::Create { graph, .. } => eval_create(dataset, graph),
            Self::Drop { graph, .. } => eval_drop(dataset, graph),
            Self::Add {
                source,
                destination,
                ..
            } => eval_transfer(dataset, source, destination, Transfer::Add),
            Self::Copy {
                source,
                destination,
                ..
            } => eval_transfer(dataset, source, destination, Transfer::Copy),
            Self::Move {
                source,
                destination,
                ..
            } => eval_transfer(dataset, source, destination, Transfer::Move),
        }
    }
}

/// Executes a sequence of update commands.
///
/// ```
/// use oxrdf::{GraphName, NamedNode, Quad};
/// use sparupdate::{MemoryDataset, UpdateCommand, UpdateContext, UpdateEvaluator};
///
/// let ex = NamedNode::new("http://example.com")?;
/// let mut dataset = MemoryDataset::new();
/// let outcomes = UpdateEvaluator::new().execute(
///     &[
///         UpdateCommand::InsertData {
///             data: vec![Quad::new(ex.clone(), ex.clone(), ex.clone(), ex.clone())],
///         },
///         UpdateCommand::Copy {
///             source: ex.clone().into(),
///             destination: GraphName::DefaultGraph,
///             silent: false,
///         },
///     ],
///     &mut UpdateContext::new(&mut dataset),
/// )?;
/// assert_eq!(outcomes.len(), 2);
/// assert_eq!(dataset.len(), 2);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
#[must_use]
pub struct UpdateEvaluator {}

impl UpdateEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes the commands in order.
    ///
    /// Stops at the first error that is not suppressed by a silent command.
    /// Returns one outcome per command otherwise.
    pub fn execute<D: UpdatableDataset>(
        self,
        commands: &[UpdateCommand],
        context: &mut UpdateContext<'_, D>,
    ) -> Result<Vec<UpdateOutcome>, UpdateEvaluationError> {
        let mut outcomes = Vec::with_capacity(commands.len());
        for command in commands {
            outcomes.push(command.execute(context)?);
        }
        Ok(outcomes)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Add,
    Copy,
    Move,
}

fn eval_insert_data(
    dataset: &mut impl UpdatableDataset,
    data: &[Quad],
) -> Result<(), UpdateEvaluationError> {
    let mut bnodes = FxHashMap::default();
    for quad in data {
        let Quad {
            subject,
            predicate,
            object,
            graph_name,
        } = quad.clone();
        let triple =
            rename_triple_blank_nodes(Triple::new(subject, predicate, object), &mut bnodes);
        insert(dataset, &graph_name, &triple)?;
    }
    Ok(())
}

fn eval_delete_data(
    dataset: &mut impl UpdatableDataset,
    data: &[Quad],
) -> Result<(), UpdateEvaluationError> {
    for quad in data {
        remove(dataset, quad)?;
    }
    Ok(())
}

fn eval_delete_insert(
    dataset: &mut impl UpdatableDataset,
    delete: &[QuadTemplate],
    insert_templates: &[QuadTemplate],
    solutions: &dyn BindingSource,
) -> Result<(), UpdateEvaluationError> {
    let mut bnodes = FxHashMap::default();
    for binding in 0..solutions.binding_count() {
        for template in delete {
            // Blank nodes in delete templates never match
            if let Some(quad) = template.instantiate(solutions, binding, None) {
                remove(dataset, &quad)?;
            }
        }
        for template in insert_templates {
            if let Some(quad) = template.instantiate(solutions, binding, Some(&mut bnodes)) {
                let graph_name = quad.graph_name.clone();
                insert(dataset, &graph_name, &quad.into())?;
            }
        }
        bnodes.clear();
    }
    Ok(())
}

fn eval_create(
    dataset: &mut impl UpdatableDataset,
    graph_name: &NamedNode,
) -> Result<(), UpdateEvaluationError> {
    let graph_name = GraphName::from(graph_name.clone());
    if dataset
        .has_graph(&graph_name)
        .map_err(UpdateEvaluationError::dataset)?
    {
        return Err(UpdateEvaluationError::GraphAlreadyExists(graph_name));
    }
    dataset
        .add_graph(NamedGraph::new(graph_name))
        .map_err(UpdateEvaluationError::dataset)
}

fn eval_clear(
    dataset: &mut impl UpdatableDataset,
    graph: &GraphTarget,
) -> Result<(), UpdateEvaluationError> {
    match graph {
        GraphTarget::NamedNode(graph_name) => {
            let graph_name = GraphName::from(graph_name.clone());
            let Some(graph) = dataset
                .graph_mut(&graph_name)
                .map_err(UpdateEvaluationError::dataset)?
            else {
                return Err(UpdateEvaluationError::GraphDoesNotExist(graph_name));
            };
            graph.clear();
            Ok(())
        }
        GraphTarget::DefaultGraph => clear_graph(dataset, &GraphName::DefaultGraph),
        GraphTarget::NamedGraphs => {
            for graph_name in dataset
                .named_graphs()
                .map_err(UpdateEvaluationError::dataset)?
            {
                clear_graph(dataset, &graph_name)?;
            }
            Ok(())
        }
        GraphTarget::AllGraphs => {
            clear_graph(dataset, &GraphName::DefaultGraph)?;
            eval_clear(dataset, &GraphTarget::NamedGraphs)
        }
    }
}

fn eval_drop(
    dataset: &mut impl UpdatableDataset,
    graph: &GraphTarget,
) -> Result<(), UpdateEvaluationError> {
    match graph {
        GraphTarget::NamedNode(graph_name) => {
            let graph_name = GraphName::from(graph_name.clone());
            if dataset
                .remove_graph(&graph_name)
                .map_err(UpdateEvaluationError::dataset)?
            {
                Ok(())
            } else {
                Err(UpdateEvaluationError::GraphDoesNotExist(graph_name))
            }
        }
        GraphTarget::DefaultGraph => clear_graph(dataset, &GraphName::DefaultGraph),
        GraphTarget::NamedGraphs => {
            for graph_name in dataset
                .named_graphs()
                .map_err(UpdateEvaluationError::dataset)?
            {
                dataset
                    .remove_graph(&graph_name)
                    .map_err(UpdateEvaluationError::dataset)?;
            }
            Ok(())
        }
        GraphTarget::AllGraphs => {
            clear_graph(dataset, &GraphName::DefaultGraph)?;
            eval_drop(dataset, &GraphTarget::NamedGraphs)
        }
    }
}

/// `ADD`, `COPY` and `MOVE`.
fn eval_transfer(
    dataset: &mut impl UpdatableDataset,
    source: &GraphName,
    destination: &GraphName,
    transfer: Transfer,
) -> Result<(), UpdateEvaluationError> {
    if !dataset
        .has_graph(source)
        .map_err(UpdateEvaluationError::dataset)?
    {
        return Err(UpdateEvaluationError::SourceGraphMissing(source.clone()));
    }
    if source == destination {
        return Ok(());
    }
    let triples = dataset
        .graph(source)
        .map_err(UpdateEvaluationError::dataset)?
        .map(NamedGraph::snapshot)
        .unwrap_or_default();

    let has_destination = dataset
        .has_graph(destination)
        .map_err(UpdateEvaluationError::dataset)?;
    if has_destination && transfer != Transfer::Add && !destination.is_default_graph() {
        // The named destination is replaced by a fresh graph
        dataset
            .remove_graph(destination)
            .map_err(UpdateEvaluationError::dataset)?;
        dataset
            .add_graph(NamedGraph::new(destination.clone()))
            .map_err(UpdateEvaluationError::dataset)?;
    }
    if let Some(graph) = dataset
        .graph_mut(destination)
        .map_err(UpdateEvaluationError::dataset)?
    {
        // The default graph is never replaced, only MOVE keeps its triples
        if transfer == Transfer::Copy && destination.is_default_graph() {
            graph.clear();
        }
        graph.merge(triples);
    } else {
        let mut graph = NamedGraph::new(destination.clone());
        graph.merge(triples);
        dataset
            .add_graph(graph)
            .map_err(UpdateEvaluationError::dataset)?;
    }

    if transfer == Transfer::Move {
        if source.is_default_graph() {
            clear_graph(dataset, source)?;
        } else {
            dataset
                .remove_graph(source)
                .map_err(UpdateEvaluationError::dataset)?;
        }
    }
    Ok(())
}

fn clear_graph(
    dataset: &mut impl UpdatableDataset,
    graph_name: &GraphName,
) -> Result<(), UpdateEvaluationError> {
    if let Some(graph) = dataset
        .graph_mut(graph_name)
        .map_err(UpdateEvaluationError::dataset)?
    {
        graph.clear();
    }
    Ok(())
}

/// Inserts into the graph, creating it if needed.
fn insert(
    dataset: &mut impl UpdatableDataset,
    graph_name: &GraphName,
    triple: &Triple,
) -> Result<(), UpdateEvaluationError> {
    if let Some(graph) = dataset
        .graph_mut(graph_name)
        .map_err(UpdateEvaluationError::dataset)?
    {
        graph.insert(triple);
        return Ok(());
    }
    let mut graph = NamedGraph::new(graph_name.clone());
    graph.insert(triple);
    dataset
        .add_graph(graph)
        .map_err(UpdateEvaluationError::dataset)
}

fn remove(dataset: &mut impl UpdatableDataset, quad: &Quad) -> Result<(), UpdateEvaluationError> {
    if let Some(graph) = dataset
        .graph_mut(&quad.graph_name)
        .map_err(UpdateEvaluationError::dataset)?
    {
        graph.remove(quad.as_ref());
    }
    Ok(())
}
