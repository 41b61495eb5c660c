use oxiri::{Iri, IriParseError};
use oxrdf::{NamedNode, Term, Variable};
use rustc_hash::FxHashMap;
use std::error::Error;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// A multiset of solutions: variable values addressed by an integer binding identifier.
///
/// Binding identifiers are the integers `0..binding_count()`.
pub trait BindingSource: Send + Sync {
    /// The value of the variable in the given binding, `None` if unbound or if the binding does not exist.
    fn value(&self, variable: &Variable, binding: usize) -> Option<&Term>;

    /// The number of bindings available.
    fn binding_count(&self) -> usize;
}

/// A [`BindingSource`] backed by in-memory solutions.
///
/// ```
/// use oxrdf::{Literal, Variable};
/// use sparexpr::{BindingSource, SolutionMultiset};
///
/// let x = Variable::new("x")?;
/// let mut solutions = SolutionMultiset::new();
/// let first = solutions.push([(x.clone(), Literal::from(1).into())]);
/// let second = solutions.push([]);
/// assert_eq!(solutions.value(&x, first), Some(&Literal::from(1).into()));
/// assert_eq!(solutions.value(&x, second), None);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionMultiset {
    solutions: Vec<FxHashMap<Variable, Term>>,
}

impl SolutionMultiset {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a solution and returns its binding identifier.
    pub fn push(&mut self, solution: impl IntoIterator<Item = (Variable, Term)>) -> usize {
        self.solutions.push(solution.into_iter().collect());
        self.solutions.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// The identifiers of all bindings, in insertion order.
    pub fn binding_ids(&self) -> Range<usize> {
        0..self.solutions.len()
    }

    /// The variables bound in the given solution.
    pub fn solution(&self, binding: usize) -> impl Iterator<Item = (&Variable, &Term)> {
        self.solutions.get(binding).into_iter().flatten()
    }
}

impl BindingSource for SolutionMultiset {
    #[inline]
    fn value(&self, variable: &Variable, binding: usize) -> Option<&Term> {
        self.solutions.get(binding)?.get(variable)
    }

    #[inline]
    fn binding_count(&self) -> usize {
        self.solutions.len()
    }
}

impl<S: IntoIterator<Item = (Variable, Term)>> FromIterator<S> for SolutionMultiset {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            solutions: iter
                .into_iter()
                .map(|solution| solution.into_iter().collect())
                .collect(),
        }
    }
}

/// A graph pattern wrapped by a [`GraphPattern`](crate::Expression::GraphPattern) expression.
///
/// This crate does not evaluate graph patterns itself.
/// It only needs the variables they mention, and a [`PatternEvaluator`] to evaluate `EXISTS`.
pub trait QueryPattern: fmt::Debug + fmt::Display + Send + Sync {
    /// The variables referenced by the pattern.
    fn variables(&self) -> Vec<Variable>;
}

/// Evaluates the graph patterns of `EXISTS` and `NOT EXISTS`.
pub trait PatternEvaluator: Send + Sync {
    /// Returns whether the pattern has at least one solution compatible with the given binding.
    fn exists(
        &self,
        pattern: &dyn QueryPattern,
        bindings: &dyn BindingSource,
        binding: usize,
    ) -> Result<bool, Box<dyn Error + Send + Sync>>;
}

pub(crate) type CustomFunction = Arc<dyn (Fn(&[Term]) -> Option<Term>) + Send + Sync>;

/// Engine-wide options of the expression evaluator.
///
/// ```
/// use oxrdf::{Literal, NamedNode};
/// use sparexpr::EvaluationOptions;
///
/// let options = EvaluationOptions::new()
///     .with_base_iri("http://example.com/")?
///     .with_custom_function(NamedNode::new("http://example.com/one")?, |_| {
///         Some(Literal::from(1).into())
///     });
/// assert_eq!(options.base_iri(), Some("http://example.com/"));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, Default)]
#[must_use]
pub struct EvaluationOptions {
    base_iri: Option<Arc<Iri<String>>>,
    custom_functions: FxHashMap<NamedNode, CustomFunction>,
}

impl EvaluationOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the IRI used to resolve the relative IRIs built by the `IRI` function.
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base_iri = Some(Arc::new(Iri::parse(base_iri.into())?));
        Ok(self)
    }

    /// Registers a custom function callable from [`Functor::Custom`](crate::Functor::Custom).
    ///
    /// The function gets the values of its operands and returns `None` on failure.
    pub fn with_custom_function(
        mut self,
        name: NamedNode,
        evaluator: impl Fn(&[Term]) -> Option<Term> + Send + Sync + 'static,
    ) -> Self {
        self.custom_functions.insert(name, Arc::new(evaluator));
        self
    }

    pub fn base_iri(&self) -> Option<&str> {
        self.base_iri.as_deref().map(Iri::as_str)
    }

    pub(crate) fn parsed_base_iri(&self) -> Option<&Iri<String>> {
        self.base_iri.as_deref()
    }

    pub(crate) fn custom_function(&self, name: &NamedNode) -> Option<&CustomFunction> {
        self.custom_functions.get(name)
    }
}

impl fmt::Debug for EvaluationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationOptions")
            .field("base_iri", &self.base_iri())
            .field("custom_functions", &self.custom_functions.keys())
            .finish()
    }
}

/// Everything an expression needs to be evaluated: the bindings, the options and optionally an `EXISTS` evaluator.
///
/// The context is read-only and can be shared between threads.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    bindings: &'a dyn BindingSource,
    options: &'a EvaluationOptions,
    pattern_evaluator: Option<&'a dyn PatternEvaluator>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(bindings: &'a dyn BindingSource, options: &'a EvaluationOptions) -> Self {
        Self {
            bindings,
            options,
            pattern_evaluator: None,
        }
    }

    #[must_use]
    pub fn with_pattern_evaluator(mut self, pattern_evaluator: &'a dyn PatternEvaluator) -> Self {
        self.pattern_evaluator = Some(pattern_evaluator);
        self
    }

    #[inline]
    pub fn bindings(&self) -> &'a dyn BindingSource {
        self.bindings
    }

    #[inline]
    pub fn options(&self) -> &'a EvaluationOptions {
        self.options
    }

    #[inline]
    pub fn pattern_evaluator(&self) -> Option<&'a dyn PatternEvaluator> {
        self.pattern_evaluator
    }
}

impl fmt::Debug for EvaluationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("binding_count", &self.bindings.binding_count())
            .field("options", self.options)
            .field("pattern_evaluator", &self.pattern_evaluator.is_some())
            .finish()
    }
}
