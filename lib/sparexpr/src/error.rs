use crate::functor::Functor;
use crate::numeric::{Numeric, NumericKind};
use oxiri::IriParseError;
use oxrdf::{Literal, NamedNode, Term, Variable};
use std::convert::Infallible;
use std::error::Error;
use std::fmt;
use std::ops::RangeInclusive;

/// An error raised while evaluating a SPARQL expression against a binding.
///
/// The evaluator never recovers from these locally: the caller decides if an erroring expression
/// leaves its solution unbound or aborts the whole evaluation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExpressionEvaluationError {
    /// A numeric or effective boolean value was requested from a variable without value
    #[error("The variable {0} is not bound")]
    UnboundVariable(Variable),
    /// The literal is language-tagged or untyped
    #[error("{literal} has no numeric value: {reason}")]
    NoNumericValue {
        literal: Literal,
        reason: NoNumericValueReason,
    },
    /// The literal datatype is not one of `xsd:integer`, `xsd:decimal`, `xsd:float` and `xsd:double`
    #[error("The datatype {0} is not a recognized numeric datatype")]
    UnrecognizedNumericType(NamedNode),
    /// The lexical form is not valid for the literal numeric datatype
    #[error("{value} is not a valid lexical form for {datatype}")]
    MalformedNumericLiteral {
        value: String,
        datatype: NamedNode,
        #[source]
        source: Box<dyn Error + Send + Sync + 'static>,
    },
    /// A numeric value was requested from an IRI or a blank node
    #[error("{0} is not a literal and has no numeric value")]
    NonLiteralNumericOperand(Term),
    /// The effective boolean value is not defined for this term
    #[error("The effective boolean value of {0} is not defined")]
    EbvNotApplicable(Term),
    /// Graph pattern terms have no value and no effective boolean value of their own
    #[error("A graph pattern has no value on its own, it must be wrapped in EXISTS or NOT EXISTS")]
    NotApplicableToGraphPattern,
    /// An explicit narrowing conversion to a smaller numeric type failed
    #[error("{value} can not be represented as a {target} value")]
    NumericCast { value: Numeric, target: NumericKind },
    /// An integer or decimal operation overflowed
    #[error("Numeric overflow")]
    NumericOverflow,
    /// An integer or decimal division by zero
    #[error("Division by zero")]
    DivisionByZero,
    /// The two operands can not be compared with each other
    #[error("{0} and {1} can not be compared")]
    IncomparableOperands(Term, Term),
    /// The functor has been given a wrong number of operands
    #[error("{functor} requires between {} and {} operands, but {actual} were given", .expected.start(), .expected.end())]
    InvalidArity {
        functor: Functor,
        expected: RangeInclusive<usize>,
        actual: usize,
    },
    /// The composite expression has been evaluated but produced no value, e.g. `COALESCE` without bound operand
    #[error("{0} did not produce any value")]
    NoValue(Functor),
    /// An operand is of a kind the functor does not accept
    #[error("{functor} expects {expected}")]
    UnexpectedOperand {
        functor: Functor,
        expected: &'static str,
    },
    /// The given custom function is not registered
    #[error("The custom function {0} is not supported")]
    UnsupportedFunction(NamedNode),
    /// The given custom function has not returned any value
    #[error("The custom function {0} failed to return a value")]
    FunctionFailed(NamedNode),
    /// An IRI built by the IRI function is not valid
    #[error(transparent)]
    InvalidIri(#[from] IriParseError),
    /// EXISTS was evaluated without a pattern evaluator in the context
    #[error("No graph pattern evaluator has been provided to evaluate EXISTS")]
    MissingPatternEvaluator,
    /// Error from the graph pattern evaluator
    #[error("{0}")]
    PatternEvaluation(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl From<Infallible> for ExpressionEvaluationError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}

/// Why a literal has no numeric value, see [`ExpressionEvaluationError::NoNumericValue`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum NoNumericValueReason {
    LanguageTagged,
    Untyped,
}

impl fmt::Display for NoNumericValueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LanguageTagged => "literal with a language specifier has no numeric value",
            Self::Untyped => "untyped literal",
        })
    }
}
