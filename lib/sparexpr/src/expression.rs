use crate::context::{EvaluationContext, QueryPattern};
use crate::error::ExpressionEvaluationError;
use crate::functor::Functor;
use crate::numeric::{Numeric, NumericKind};
use crate::transform::ExpressionTransformer;
use crate::value::{self, boolean_term};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNode, Term, Variable};
use oxsdatatypes::{Boolean, Decimal, Double, Float, Integer};
use rustc_hash::FxHashSet;
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Not, Sub};
use std::sync::Arc;

/// The shape of an [`Expression`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionType {
    /// A variable or a constant term
    Primary,
    UnaryOperator,
    BinaryOperator,
    Function,
    /// `EXISTS` and `NOT EXISTS`
    GraphOperator,
}

/// A SPARQL expression tree.
///
/// Trees are immutable once built and can be evaluated against many bindings, concurrently if needed.
///
/// ```
/// use oxrdf::Variable;
/// use sparexpr::{EvaluationContext, EvaluationOptions, Expression, NumericKind, SolutionMultiset};
///
/// let mut solutions = SolutionMultiset::new();
/// let binding = solutions.push([(Variable::new("x")?, oxrdf::Literal::from(2).into())]);
/// let options = EvaluationOptions::new();
/// let context = EvaluationContext::new(&solutions, &options);
///
/// let expression = Expression::variable("?x") * Expression::from(1.5);
/// assert_eq!(expression.numeric_kind(context, binding), NumericKind::Double);
/// assert!(expression.effective_boolean_value(context, binding)?);
/// assert_eq!(expression.to_string(), "(?x * \"1.5\"^^<http://www.w3.org/2001/XMLSchema#double>)");
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A reference to a variable, resolved through the [`BindingSource`](crate::BindingSource).
    Variable(Variable),
    /// A constant RDF term.
    Node(NodeTerm),
    /// A constant `xsd:boolean`.
    Boolean(bool),
    /// A constant number.
    Numeric(NumericTerm),
    /// A graph pattern, only meaningful as the operand of `EXISTS` and `NOT EXISTS`.
    GraphPattern(PatternTerm),
    /// An operator or function call.
    Composite(Functor, Vec<Self>),
}

impl Expression {
    /// Builds a variable reference.
    ///
    /// A single leading `?` or `$` is removed from the name. The name is not validated.
    ///
    /// ```
    /// use sparexpr::Expression;
    ///
    /// assert_eq!(Expression::variable("?x"), Expression::variable("x"));
    /// assert_eq!(Expression::variable("$x"), Expression::variable("x"));
    /// assert_ne!(Expression::variable("??x"), Expression::variable("x"));
    /// ```
    pub fn variable(name: &str) -> Self {
        let name = name.strip_prefix(['?', '$']).unwrap_or(name);
        Self::Variable(Variable::new_unchecked(name))
    }

    /// Builds a constant term without looking at its value.
    ///
    /// Use [`Expression::constant`] to get [`Boolean`](Self::Boolean) or [`Numeric`](Self::Numeric) nodes for valid literals.
    pub fn node(term: impl Into<Term>) -> Self {
        Self::Node(NodeTerm::new(term.into()))
    }

    pub fn numeric(value: impl Into<Numeric>) -> Self {
        Self::Numeric(NumericTerm::new(value.into()))
    }

    pub fn graph_pattern(pattern: impl QueryPattern + 'static) -> Self {
        Self::GraphPattern(PatternTerm(Arc::new(pattern)))
    }

    /// Builds an operator or function call.
    ///
    /// The operand count is only checked during evaluation.
    pub fn call(functor: Functor, operands: impl IntoIterator<Item = Self>) -> Self {
        Self::Composite(functor, operands.into_iter().collect())
    }

    /// Builds the most specific constant for the term.
    ///
    /// Well-formed `xsd:boolean` literals become [`Boolean`](Self::Boolean),
    /// well-formed numeric literals become [`Numeric`](Self::Numeric) and everything else a [`Node`](Self::Node).
    pub fn constant(term: impl Into<Term>) -> Self {
        let term = term.into();
        if let Term::Literal(literal) = &term {
            if literal.datatype() == xsd::BOOLEAN {
                if let Ok(value) = literal.value().parse::<Boolean>() {
                    return Self::Boolean(value.into());
                }
            } else if let Ok(value) = Numeric::parse(literal) {
                return Self::numeric(value);
            }
        }
        Self::node(term)
    }

    pub fn expression_type(&self) -> ExpressionType {
        match self {
            Self::Variable(_)
            | Self::Node(_)
            | Self::Boolean(_)
            | Self::Numeric(_)
            | Self::GraphPattern(_) => ExpressionType::Primary,
            Self::Composite(functor, _) => functor.expression_type(),
        }
    }

    #[inline]
    pub fn is_primary(&self) -> bool {
        self.expression_type() == ExpressionType::Primary
    }

    /// The name of the operator or function, the empty string for primary expressions.
    pub fn functor(&self) -> &str {
        if let Self::Composite(functor, _) = self {
            functor.name()
        } else {
            ""
        }
    }

    /// The operands of a composite expression, empty for primary expressions.
    pub fn operands(&self) -> &[Self] {
        if let Self::Composite(_, operands) = self {
            operands
        } else {
            &[]
        }
    }

    /// The variables the expression depends on.
    pub fn free_variables(&self) -> FxHashSet<Variable> {
        let mut variables = FxHashSet::default();
        self.lookup_free_variables(&mut |v| {
            variables.insert(v.clone());
        });
        variables
    }

    pub fn lookup_free_variables(&self, callback: &mut impl FnMut(&Variable)) {
        match self {
            Self::Variable(v) => callback(v),
            Self::Node(_) | Self::Boolean(_) | Self::Numeric(_) => {}
            Self::GraphPattern(pattern) => {
                for v in pattern.0.variables() {
                    callback(&v);
                }
            }
            Self::Composite(_, operands) => {
                for operand in operands {
                    operand.lookup_free_variables(callback);
                }
            }
        }
    }

    /// Evaluates the expression to an RDF term.
    ///
    /// Returns `Ok(None)` if the expression is an unbound variable
    /// or a composite like `COALESCE` that did not select any value.
    pub fn value(
        &self,
        context: EvaluationContext<'_>,
        binding: usize,
    ) -> Result<Option<Term>, ExpressionEvaluationError> {
        match self {
            Self::Variable(v) => Ok(context.bindings().value(v, binding).cloned()),
            Self::Node(node) => Ok(Some(node.term.clone())),
            Self::Boolean(value) => Ok(Some(boolean_term(*value))),
            Self::Numeric(numeric) => Ok(Some(numeric.value.to_literal().into())),
            Self::GraphPattern(_) => Err(ExpressionEvaluationError::NotApplicableToGraphPattern),
            Self::Composite(functor, operands) => functor.evaluate(operands, context, binding),
        }
    }

    /// Like [`value`](Self::value) but fails if there is no value.
    pub(crate) fn evaluate(
        &self,
        context: EvaluationContext<'_>,
        binding: usize,
    ) -> Result<Term, ExpressionEvaluationError> {
        self.value(context, binding)?.ok_or_else(|| match self {
            Self::Variable(v) => ExpressionEvaluationError::UnboundVariable(v.clone()),
            Self::Composite(functor, _) => ExpressionEvaluationError::NoValue(functor.clone()),
            Self::Node(_) | Self::Boolean(_) | Self::Numeric(_) | Self::GraphPattern(_) => {
                ExpressionEvaluationError::NotApplicableToGraphPattern
            }
        })
    }

    /// [Effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv) of the expression.
    pub fn effective_boolean_value(
        &self,
        context: EvaluationContext<'_>,
        binding: usize,
    ) -> Result<bool, ExpressionEvaluationError> {
        match self {
            Self::Node(node) => Ok(node.ebv),
            Self::Boolean(value) => Ok(*value),
            Self::Numeric(numeric) => Ok(numeric.value.effective_boolean_value()),
            Self::GraphPattern(_) => Err(ExpressionEvaluationError::NotApplicableToGraphPattern),
            Self::Variable(_) | Self::Composite(..) => {
                value::effective_boolean_value(&self.evaluate(context, binding)?)
            }
        }
    }

    /// The numeric value of the expression.
    pub fn numeric_value(
        &self,
        context: EvaluationContext<'_>,
        binding: usize,
    ) -> Result<Numeric, ExpressionEvaluationError> {
        match self {
            Self::Numeric(numeric) => Ok(numeric.value),
            Self::GraphPattern(_) => Err(ExpressionEvaluationError::NotApplicableToGraphPattern),
            Self::Variable(_) | Self::Node(_) | Self::Boolean(_) | Self::Composite(..) => {
                match self.evaluate(context, binding)? {
                    Term::Literal(literal) => Numeric::parse(&literal),
                    term => Err(ExpressionEvaluationError::NonLiteralNumericOperand(term)),
                }
            }
        }
    }

    /// The numeric kind of the expression value.
    ///
    /// Never fails: anything without a numeric value is [`NumericKind::NotANumber`].
    pub fn numeric_kind(&self, context: EvaluationContext<'_>, binding: usize) -> NumericKind {
        match self.numeric_value(context, binding) {
            Ok(value) => value.kind(),
            Err(_) => NumericKind::NotANumber,
        }
    }

    /// The value as an `xsd:integer`, truncating wider values.
    pub fn as_integer(
        &self,
        context: EvaluationContext<'_>,
        binding: usize,
    ) -> Result<Integer, ExpressionEvaluationError> {
        if let Self::Numeric(numeric) = self {
            return numeric.integer.ok_or_else(|| numeric.cast_error(NumericKind::Integer));
        }
        self.numeric_value(context, binding)?.to_integer()
    }

    pub fn as_decimal(
        &self,
        context: EvaluationContext<'_>,
        binding: usize,
    ) -> Result<Decimal, ExpressionEvaluationError> {
        if let Self::Numeric(numeric) = self {
            return numeric.decimal.ok_or_else(|| numeric.cast_error(NumericKind::Decimal));
        }
        self.numeric_value(context, binding)?.to_decimal()
    }

    pub fn as_float(
        &self,
        context: EvaluationContext<'_>,
        binding: usize,
    ) -> Result<Float, ExpressionEvaluationError> {
        if let Self::Numeric(numeric) = self {
            return Ok(numeric.float);
        }
        Ok(self.numeric_value(context, binding)?.to_float())
    }

    pub fn as_double(
        &self,
        context: EvaluationContext<'_>,
        binding: usize,
    ) -> Result<Double, ExpressionEvaluationError> {
        if let Self::Numeric(numeric) = self {
            return Ok(numeric.double);
        }
        Ok(self.numeric_value(context, binding)?.to_double())
    }

    /// Rebuilds the tree: composites are rebuilt from their operands passed through the transformer,
    /// primary expressions are returned unchanged.
    #[must_use]
    pub fn transform<T: ExpressionTransformer + ?Sized>(&self, transformer: &mut T) -> Self {
        match self {
            Self::Composite(functor, operands) => Self::Composite(
                functor.clone(),
                operands
                    .iter()
                    .map(|operand| transformer.transform(operand))
                    .collect(),
            ),
            _ => self.clone(),
        }
    }

    fn fmt_composite(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Composite(functor, operands) = self else {
            return fmt::Display::fmt(self, f);
        };
        match functor.expression_type() {
            ExpressionType::BinaryOperator if operands.len() == 2 => {
                write!(f, "({} {functor} {})", operands[0], operands[1])
            }
            ExpressionType::UnaryOperator if operands.len() == 1 => {
                write!(f, "{functor}{}", operands[0])
            }
            ExpressionType::GraphOperator if operands.len() == 1 => {
                write!(f, "{functor} {}", operands[0])
            }
            _ => {
                write!(f, "{functor}(")?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    operand.fmt(f)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Expression {
    /// Formats the expression using the SPARQL syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(v) => v.fmt(f),
            Self::Node(node) => node.term.fmt(f),
            Self::Boolean(value) => value.fmt(f),
            Self::Numeric(numeric) => match numeric.value {
                Numeric::Integer(value) => value.fmt(f),
                value => value.to_literal().fmt(f),
            },
            Self::GraphPattern(pattern) => write!(f, "{{ {} }}", pattern.0),
            Self::Composite(..) => self.fmt_composite(f),
        }
    }
}

/// A constant term with its effective boolean value computed once.
#[derive(Debug, Clone)]
pub struct NodeTerm {
    term: Term,
    ebv: bool,
}

impl NodeTerm {
    /// Terms without effective boolean value get `false`.
    pub fn new(term: Term) -> Self {
        let ebv = value::effective_boolean_value(&term).unwrap_or(false);
        Self { term, ebv }
    }

    #[inline]
    pub fn term(&self) -> &Term {
        &self.term
    }

    #[inline]
    pub fn into_term(self) -> Term {
        self.term
    }
}

impl PartialEq for NodeTerm {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term
    }
}

/// A constant number, kept in all widths it can be represented in.
#[derive(Debug, Clone, Copy)]
pub struct NumericTerm {
    value: Numeric,
    integer: Option<Integer>,
    decimal: Option<Decimal>,
    float: Float,
    double: Double,
}

impl NumericTerm {
    pub fn new(value: Numeric) -> Self {
        Self {
            value,
            integer: value.to_integer().ok(),
            decimal: value.to_decimal().ok(),
            float: value.to_float(),
            double: value.to_double(),
        }
    }

    #[inline]
    pub fn value(&self) -> Numeric {
        self.value
    }

    #[inline]
    pub fn kind(&self) -> NumericKind {
        self.value.kind()
    }

    fn cast_error(&self, target: NumericKind) -> ExpressionEvaluationError {
        ExpressionEvaluationError::NumericCast {
            value: self.value,
            target,
        }
    }
}

impl PartialEq for NumericTerm {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// A shared graph pattern. Two pattern terms are equal if they share the same pattern.
#[derive(Debug, Clone)]
pub struct PatternTerm(Arc<dyn QueryPattern>);

impl PatternTerm {
    #[inline]
    pub fn pattern(&self) -> &dyn QueryPattern {
        &*self.0
    }
}

impl PartialEq for PatternTerm {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Variable> for Expression {
    #[inline]
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<NamedNode> for Expression {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::node(node)
    }
}

impl From<Literal> for Expression {
    #[inline]
    fn from(literal: Literal) -> Self {
        Self::constant(literal)
    }
}

impl From<Term> for Expression {
    #[inline]
    fn from(term: Term) -> Self {
        Self::constant(term)
    }
}

impl From<bool> for Expression {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Numeric> for Expression {
    #[inline]
    fn from(value: Numeric) -> Self {
        Self::numeric(value)
    }
}

impl From<i64> for Expression {
    #[inline]
    fn from(value: i64) -> Self {
        Self::numeric(value)
    }
}

impl From<f64> for Expression {
    #[inline]
    fn from(value: f64) -> Self {
        Self::numeric(value)
    }
}

impl BitAnd for Expression {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self::Composite(Functor::And, vec![self, rhs])
    }
}

impl BitOr for Expression {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self::Composite(Functor::Or, vec![self, rhs])
    }
}

impl Not for Expression {
    type Output = Self;

    fn not(self) -> Self {
        Self::Composite(Functor::Not, vec![self])
    }
}

impl Add for Expression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::Composite(Functor::Add, vec![self, rhs])
    }
}

impl Sub for Expression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::Composite(Functor::Subtract, vec![self, rhs])
    }
}

impl Mul for Expression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::Composite(Functor::Multiply, vec![self, rhs])
    }
}

impl Div for Expression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::Composite(Functor::Divide, vec![self, rhs])
    }
}

impl Neg for Expression {
    type Output = Self;

    fn neg(self) -> Self {
        Self::Composite(Functor::UnaryMinus, vec![self])
    }
}
