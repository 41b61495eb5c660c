#![cfg(test)]

use oxrdf::{BlankNode, GraphName, Literal, NamedNode, NamedOrBlankNode, Quad, Term, Variable};
use sparexpr::SolutionMultiset;
use sparupdate::{
    GraphNameTemplate, GraphTarget, MemoryDataset, NamedGraph, QuadTemplate, UpdatableDataset,
    UpdateCommand, UpdateContext, UpdateEvaluationError, UpdateEvaluator, UpdateOutcome,
};
use std::error::Error;
use std::io;

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

fn quad(s: &str, o: &str, graph_name: impl Into<GraphName>) -> Quad {
    Quad::new(ex(s), ex("p"), ex(o), graph_name)
}

fn graph_len(dataset: &impl UpdatableDataset, graph_name: impl Into<GraphName>) -> Option<usize> {
    dataset
        .graph(&graph_name.into())
        .ok()
        .flatten()
        .map(NamedGraph::len)
}

fn run(
    dataset: &mut MemoryDataset,
    command: &UpdateCommand,
) -> Result<UpdateOutcome, UpdateEvaluationError> {
    command.execute(&mut UpdateContext::new(dataset))
}

fn dataset_with_a() -> MemoryDataset {
    [
        quad("s1", "o1", ex("a")),
        quad("s2", "o2", ex("a")),
        quad("s3", "o3", ex("a")),
    ]
    .into_iter()
    .collect()
}

fn sorted_quads(dataset: &MemoryDataset) -> Vec<Quad> {
    let mut quads = dataset.quads();
    quads.sort_by_key(ToString::to_string);
    quads
}

fn move_command(source: impl Into<GraphName>, destination: impl Into<GraphName>) -> UpdateCommand {
    UpdateCommand::Move {
        source: source.into(),
        destination: destination.into(),
        silent: false,
    }
}

#[test]
fn test_move_to_absent_graph() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    assert!(run(&mut dataset, &move_command(ex("a"), ex("b")))?.is_applied());
    assert!(!dataset.has_graph(&ex("a").into())?);
    assert_eq!(graph_len(&dataset, ex("b")), Some(3));
    Ok(())
}

#[test]
fn test_move_missing_source() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    let before = sorted_quads(&dataset);
    let error = run(&mut dataset, &move_command(ex("c"), ex("b"))).unwrap_err();
    assert!(matches!(
        error,
        UpdateEvaluationError::SourceGraphMissing(GraphName::NamedNode(ref g)) if *g == ex("c")
    ));
    assert_eq!(
        error.to_string(),
        "The source named graph <http://example.com/c> does not exist"
    );
    assert_eq!(sorted_quads(&dataset), before);
    assert!(!dataset.has_graph(&ex("b").into())?);
    Ok(())
}

#[test]
fn test_move_missing_source_silent() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    let before = sorted_quads(&dataset);
    let outcome = run(
        &mut dataset,
        &UpdateCommand::Move {
            source: ex("c").into(),
            destination: ex("b").into(),
            silent: true,
        },
    )?;
    assert!(matches!(
        outcome,
        UpdateOutcome::Suppressed(UpdateEvaluationError::SourceGraphMissing(_))
    ));
    assert_eq!(sorted_quads(&dataset), before);
    Ok(())
}

#[test]
fn test_move_to_default_graph() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    dataset.insert(quad("d1", "o1", GraphName::DefaultGraph));
    dataset.insert(quad("d2", "o2", GraphName::DefaultGraph));
    run(&mut dataset, &move_command(ex("a"), GraphName::DefaultGraph))?;
    assert_eq!(graph_len(&dataset, GraphName::DefaultGraph), Some(5));
    assert!(!dataset.has_graph(&ex("a").into())?);
    Ok(())
}

#[test]
fn test_move_default_graph_to_named_graph() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    dataset.insert(quad("d1", "o1", GraphName::DefaultGraph));
    dataset.insert(quad("d2", "o2", GraphName::DefaultGraph));
    run(&mut dataset, &move_command(GraphName::DefaultGraph, ex("a")))?;
    assert_eq!(graph_len(&dataset, ex("a")), Some(2));
    assert!(dataset.has_graph(&GraphName::DefaultGraph)?);
    assert_eq!(graph_len(&dataset, GraphName::DefaultGraph), Some(0));
    Ok(())
}

#[test]
fn test_move_merges_without_previous_destination_content() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    dataset.insert(quad("x", "y", ex("b")));
    run(&mut dataset, &move_command(ex("a"), ex("b")))?;
    assert_eq!(graph_len(&dataset, ex("b")), Some(3));
    assert!(!dataset.quads().contains(&quad("x", "y", ex("b"))));
    Ok(())
}

#[test]
fn test_move_to_itself_is_noop() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    let before = sorted_quads(&dataset);
    assert!(run(&mut dataset, &move_command(ex("a"), ex("a")))?.is_applied());
    assert_eq!(sorted_quads(&dataset), before);
    Ok(())
}

#[test]
fn test_move_renames_blank_nodes() -> Result<(), Box<dyn Error>> {
    let b = BlankNode::default();
    let mut dataset = MemoryDataset::new();
    dataset.insert(Quad::new(b.clone(), ex("p"), ex("o"), ex("a")));
    run(&mut dataset, &move_command(ex("a"), ex("b")))?;
    let quads = dataset.quads();
    assert_eq!(quads.len(), 1);
    assert_ne!(quads[0].subject, NamedOrBlankNode::from(b));
    Ok(())
}

#[test]
fn test_copy_replaces_named_destination() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    dataset.insert(quad("x", "y", ex("b")));
    run(
        &mut dataset,
        &UpdateCommand::Copy {
            source: ex("a").into(),
            destination: ex("b").into(),
            silent: false,
        },
    )?;
    assert_eq!(graph_len(&dataset, ex("a")), Some(3));
    assert_eq!(graph_len(&dataset, ex("b")), Some(3));
    assert!(!dataset.quads().contains(&quad("x", "y", ex("b"))));
    Ok(())
}

#[test]
fn test_copy_to_default_graph_replaces_its_triples() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    dataset.insert(quad("x", "y", GraphName::DefaultGraph));
    run(
        &mut dataset,
        &UpdateCommand::Copy {
            source: ex("a").into(),
            destination: GraphName::DefaultGraph,
            silent: false,
        },
    )?;
    assert_eq!(graph_len(&dataset, ex("a")), Some(3));
    assert_eq!(graph_len(&dataset, GraphName::DefaultGraph), Some(3));
    assert!(dataset.has_graph(&GraphName::DefaultGraph)?);
    assert!(!dataset.quads().contains(&quad("x", "y", GraphName::DefaultGraph)));
    Ok(())
}

#[test]
fn test_add_keeps_destination() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    dataset.insert(quad("x", "y", ex("b")));
    run(
        &mut dataset,
        &UpdateCommand::Add {
            source: ex("a").into(),
            destination: ex("b").into(),
            silent: false,
        },
    )?;
    assert_eq!(graph_len(&dataset, ex("a")), Some(3));
    assert_eq!(graph_len(&dataset, ex("b")), Some(4));
    Ok(())
}

#[test]
fn test_add_to_absent_graph() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    run(
        &mut dataset,
        &UpdateCommand::Add {
            source: ex("a").into(),
            destination: ex("c").into(),
            silent: false,
        },
    )?;
    assert_eq!(graph_len(&dataset, ex("c")), Some(3));
    Ok(())
}

#[test]
fn test_clear() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    dataset.insert(quad("x", "y", GraphName::DefaultGraph));
    run(
        &mut dataset,
        &UpdateCommand::Clear {
            graph: ex("a").into(),
            silent: false,
        },
    )?;
    assert_eq!(graph_len(&dataset, ex("a")), Some(0));
    assert_eq!(graph_len(&dataset, GraphName::DefaultGraph), Some(1));

    let error = run(
        &mut dataset,
        &UpdateCommand::Clear {
            graph: ex("c").into(),
            silent: false,
        },
    )
    .unwrap_err();
    assert!(matches!(error, UpdateEvaluationError::GraphDoesNotExist(_)));

    run(
        &mut dataset,
        &UpdateCommand::Clear {
            graph: GraphTarget::AllGraphs,
            silent: false,
        },
    )?;
    assert!(dataset.is_empty());
    assert!(dataset.has_graph(&ex("a").into())?);
    Ok(())
}

#[test]
fn test_drop() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    dataset.insert(quad("x", "y", ex("b")));
    dataset.insert(quad("x", "y", GraphName::DefaultGraph));
    run(
        &mut dataset,
        &UpdateCommand::Drop {
            graph: ex("a").into(),
            silent: false,
        },
    )?;
    assert!(!dataset.has_graph(&ex("a").into())?);

    let outcome = run(
        &mut dataset,
        &UpdateCommand::Drop {
            graph: ex("a").into(),
            silent: true,
        },
    )?;
    assert!(!outcome.is_applied());

    run(
        &mut dataset,
        &UpdateCommand::Drop {
            graph: GraphTarget::NamedGraphs,
            silent: false,
        },
    )?;
    assert!(dataset.named_graphs()?.is_empty());
    assert_eq!(graph_len(&dataset, GraphName::DefaultGraph), Some(1));
    Ok(())
}

#[test]
fn test_create() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    run(
        &mut dataset,
        &UpdateCommand::Create {
            graph: ex("c"),
            silent: false,
        },
    )?;
    assert_eq!(graph_len(&dataset, ex("c")), Some(0));
    let error = run(
        &mut dataset,
        &UpdateCommand::Create {
            graph: ex("a"),
            silent: false,
        },
    )
    .unwrap_err();
    assert!(matches!(error, UpdateEvaluationError::GraphAlreadyExists(_)));
    assert_eq!(graph_len(&dataset, ex("a")), Some(3));
    Ok(())
}

#[test]
fn test_insert_and_delete_data() -> Result<(), Box<dyn Error>> {
    let mut dataset = MemoryDataset::new();
    let b = BlankNode::default();
    run(
        &mut dataset,
        &UpdateCommand::InsertData {
            data: vec![
                quad("s", "o", ex("g")),
                Quad::new(b.clone(), ex("p"), b.clone(), GraphName::DefaultGraph),
            ],
        },
    )?;
    assert!(dataset.has_graph(&ex("g").into())?);
    assert_eq!(dataset.len(), 2);
    let inserted = dataset
        .quads()
        .into_iter()
        .find(|q| q.graph_name.is_default_graph())
        .unwrap();
    assert_ne!(inserted.subject, NamedOrBlankNode::from(b));
    assert_eq!(Term::from(inserted.subject), inserted.object);

    run(
        &mut dataset,
        &UpdateCommand::DeleteData {
            data: vec![quad("s", "o", ex("g")), quad("s", "o", ex("missing"))],
        },
    )?;
    assert_eq!(graph_len(&dataset, ex("g")), Some(0));
    assert!(!dataset.has_graph(&ex("missing").into())?);
    Ok(())
}

#[test]
fn test_delete_insert() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    let s = Variable::new("s")?;
    let o = Variable::new("o")?;
    let mut solutions = SolutionMultiset::new();
    for (subject, object) in [("s1", "o1"), ("s2", "o2")] {
        solutions.push([(s.clone(), ex(subject).into()), (o.clone(), ex(object).into())]);
    }
    // Literal subjects are skipped
    solutions.push([(s.clone(), Literal::from(1).into()), (o.clone(), ex("o3").into())]);
    let b = BlankNode::default();
    let command = UpdateCommand::DeleteInsert {
        delete: vec![QuadTemplate::new(s.clone(), ex("p"), o.clone(), ex("a"))],
        insert: vec![
            QuadTemplate::new(s.clone(), ex("q"), o.clone(), GraphNameTemplate::DefaultGraph),
            QuadTemplate::new(b.clone(), ex("q"), s.clone(), GraphNameTemplate::DefaultGraph),
        ],
    };
    let outcome =
        command.execute(&mut UpdateContext::new(&mut dataset).with_solutions(&solutions))?;
    assert!(outcome.is_applied());
    assert_eq!(graph_len(&dataset, ex("a")), Some(1));
    let default_quads = dataset
        .quads()
        .into_iter()
        .filter(|q| q.graph_name.is_default_graph())
        .collect::<Vec<_>>();
    assert_eq!(default_quads.len(), 5);
    let fresh_subjects = default_quads
        .iter()
        .filter(|q| matches!(q.subject, NamedOrBlankNode::BlankNode(_)))
        .map(|q| q.subject.clone())
        .collect::<Vec<_>>();
    // one fresh blank node per solution
    assert_eq!(fresh_subjects.len(), 3);
    assert_ne!(fresh_subjects[0], fresh_subjects[1]);
    assert_ne!(fresh_subjects[1], fresh_subjects[2]);
    assert_ne!(fresh_subjects[0], fresh_subjects[2]);
    Ok(())
}

#[test]
fn test_delete_insert_without_solutions() {
    let mut dataset = dataset_with_a();
    let error = run(
        &mut dataset,
        &UpdateCommand::DeleteInsert {
            delete: Vec::new(),
            insert: Vec::new(),
        },
    )
    .unwrap_err();
    assert!(matches!(error, UpdateEvaluationError::MissingSolutions));
}

#[test]
fn test_evaluator_stops_at_first_error() -> Result<(), Box<dyn Error>> {
    let mut dataset = dataset_with_a();
    let commands = [
        UpdateCommand::Clear {
            graph: ex("missing").into(),
            silent: true,
        },
        move_command(ex("missing"), ex("b")),
        UpdateCommand::Drop {
            graph: ex("a").into(),
            silent: false,
        },
    ];
    let error = UpdateEvaluator::new()
        .execute(&commands, &mut UpdateContext::new(&mut dataset))
        .unwrap_err();
    assert!(matches!(error, UpdateEvaluationError::SourceGraphMissing(_)));
    assert!(dataset.has_graph(&ex("a").into())?);

    let outcomes = UpdateEvaluator::new()
        .execute(&commands[..1], &mut UpdateContext::new(&mut dataset))?;
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes[0].suppressed_error(),
        Some(UpdateEvaluationError::GraphDoesNotExist(_))
    ));
    Ok(())
}

/// A dataset refusing to remove graphs
struct NoRemovalDataset(MemoryDataset);

impl UpdatableDataset for NoRemovalDataset {
    type Error = io::Error;

    fn has_graph(&self, name: &GraphName) -> Result<bool, io::Error> {
        let Ok(result) = self.0.has_graph(name);
        Ok(result)
    }

    fn graph(&self, name: &GraphName) -> Result<Option<&NamedGraph>, io::Error> {
        let Ok(graph) = self.0.graph(name);
        Ok(graph)
    }

    fn graph_mut(&mut self, name: &GraphName) -> Result<Option<&mut NamedGraph>, io::Error> {
        let Ok(graph) = self.0.graph_mut(name);
        Ok(graph)
    }

    fn add_graph(&mut self, graph: NamedGraph) -> Result<(), io::Error> {
        let Ok(()) = self.0.add_graph(graph);
        Ok(())
    }

    fn remove_graph(&mut self, _: &GraphName) -> Result<bool, io::Error> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read only"))
    }

    fn named_graphs(&self) -> Result<Vec<GraphName>, io::Error> {
        let Ok(graphs) = self.0.named_graphs();
        Ok(graphs)
    }
}

#[test]
fn test_silent_partial_failure_keeps_changes() -> Result<(), Box<dyn Error>> {
    let mut dataset = NoRemovalDataset(dataset_with_a());
    let outcome = UpdateCommand::Move {
        source: ex("a").into(),
        destination: ex("b").into(),
        silent: true,
    }
    .execute(&mut UpdateContext::new(&mut dataset))?;
    let error = outcome.suppressed_error().unwrap();
    assert!(matches!(error, UpdateEvaluationError::Dataset(_)));
    assert_eq!(error.to_string(), "read only");
    // The destination has been populated before the source removal failed
    assert_eq!(dataset.0.graph(&ex("b").into())?.map(NamedGraph::len), Some(3));
    assert_eq!(dataset.0.graph(&ex("a").into())?.map(NamedGraph::len), Some(3));
    Ok(())
}

#[test]
fn test_dataset_error_is_propagated() {
    let mut dataset = NoRemovalDataset(dataset_with_a());
    let error = UpdateCommand::Drop {
        graph: ex("a").into(),
        silent: false,
    }
    .execute(&mut UpdateContext::new(&mut dataset))
    .unwrap_err();
    assert!(matches!(error, UpdateEvaluationError::Dataset(_)));
    assert!(dataset.0.has_graph(&ex("a").into()).is_ok_and(|exists| exists));
}
