use crate::context::EvaluationContext;
use crate::error::ExpressionEvaluationError;
use crate::expression::{Expression, ExpressionType};
use crate::numeric::Numeric;
use crate::value::{self, boolean_term};
use oxiri::Iri;
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNode, Term};
use std::cmp::Ordering;
use std::fmt;
use std::ops::RangeInclusive;

/// The operator or function applied by a [`Composite`](Expression::Composite) expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Functor {
    /// [Logical-or](https://www.w3.org/TR/sparql11-query/#func-logical-or).
    Or,
    /// [Logical-and](https://www.w3.org/TR/sparql11-query/#func-logical-and).
    And,
    /// [fn:not](https://www.w3.org/TR/xpath-functions-31/#func-not).
    Not,
    /// [RDFterm-equal](https://www.w3.org/TR/sparql11-query/#func-RDFterm-equal) and the XSD value equalities.
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    /// [op:numeric-add](https://www.w3.org/TR/xpath-functions-31/#func-numeric-add).
    Add,
    /// [op:numeric-subtract](https://www.w3.org/TR/xpath-functions-31/#func-numeric-subtract).
    Subtract,
    /// [op:numeric-multiply](https://www.w3.org/TR/xpath-functions-31/#func-numeric-multiply).
    Multiply,
    /// [op:numeric-divide](https://www.w3.org/TR/xpath-functions-31/#func-numeric-divide).
    Divide,
    UnaryPlus,
    UnaryMinus,
    /// [BOUND](https://www.w3.org/TR/sparql11-query/#func-bound).
    Bound,
    /// [IF](https://www.w3.org/TR/sparql11-query/#func-if).
    If,
    /// [COALESCE](https://www.w3.org/TR/sparql11-query/#func-coalesce).
    Coalesce,
    /// [EXISTS](https://www.w3.org/TR/sparql11-query/#func-filter-exists).
    Exists,
    NotExists,
    /// [sameTerm](https://www.w3.org/TR/sparql11-query/#func-sameTerm).
    SameTerm,
    /// [STR](https://www.w3.org/TR/sparql11-query/#func-str).
    Str,
    /// [LANG](https://www.w3.org/TR/sparql11-query/#func-lang).
    Lang,
    /// [DATATYPE](https://www.w3.org/TR/sparql11-query/#func-datatype).
    Datatype,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    /// [IRI](https://www.w3.org/TR/sparql11-query/#func-iri).
    Iri,
    /// A function registered with [`EvaluationOptions::with_custom_function`](crate::EvaluationOptions::with_custom_function).
    Custom(NamedNode),
}

impl Functor {
    /// The SPARQL name of the operator or function.
    pub fn name(&self) -> &str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Not => "!",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Add | Self::UnaryPlus => "+",
            Self::Subtract | Self::UnaryMinus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Bound => "BOUND",
            Self::If => "IF",
            Self::Coalesce => "COALESCE",
            Self::Exists => "EXISTS",
            Self::NotExists => "NOT EXISTS",
            Self::SameTerm => "sameTerm",
            Self::Str => "STR",
            Self::Lang => "LANG",
            Self::Datatype => "DATATYPE",
            Self::IsIri => "isIRI",
            Self::IsBlank => "isBLANK",
            Self::IsLiteral => "isLITERAL",
            Self::IsNumeric => "isNUMERIC",
            Self::Iri => "IRI",
            Self::Custom(name) => name.as_str(),
        }
    }

    pub fn expression_type(&self) -> ExpressionType {
        match self {
            Self::Or
            | Self::And
            | Self::Equal
            | Self::NotEqual
            | Self::Less
            | Self::LessOrEqual
            | Self::Greater
            | Self::GreaterOrEqual
            | Self::Add
            | Self::Subtract
            | Self::Multiply
            | Self::Divide => ExpressionType::BinaryOperator,
            Self::Not | Self::UnaryPlus | Self::UnaryMinus => ExpressionType::UnaryOperator,
            Self::Exists | Self::NotExists => ExpressionType::GraphOperator,
            Self::Bound
            | Self::If
            | Self::Coalesce
            | Self::SameTerm
            | Self::Str
            | Self::Lang
            | Self::Datatype
            | Self::IsIri
            | Self::IsBlank
            | Self::IsLiteral
            | Self::IsNumeric
            | Self::Iri
            | Self::Custom(_) => ExpressionType::Function,
        }
    }

    /// The number of operands the functor accepts.
    pub fn arity(&self) -> RangeInclusive<usize> {
        match self.expression_type() {
            ExpressionType::BinaryOperator => 2..=2,
            ExpressionType::UnaryOperator | ExpressionType::GraphOperator => 1..=1,
            ExpressionType::Primary | ExpressionType::Function => match self {
                Self::If => 3..=3,
                Self::SameTerm => 2..=2,
                Self::Coalesce | Self::Custom(_) => 0..=usize::MAX,
                _ => 1..=1,
            },
        }
    }

    pub(crate) fn evaluate(
        &self,
        operands: &[Expression],
        context: EvaluationContext<'_>,
        binding: usize,
    ) -> Result<Option<Term>, ExpressionEvaluationError> {
        if !self.arity().contains(&operands.len()) {
            return Err(ExpressionEvaluationError::InvalidArity {
                functor: self.clone(),
                expected: self.arity(),
                actual: operands.len(),
            });
        }
        let term = match self {
            Self::Or => {
                let mut error = None;
                for operand in operands {
                    match operand.effective_boolean_value(context, binding) {
                        Ok(true) => return Ok(Some(boolean_term(true))),
                        Ok(false) => (),
                        Err(e) => error = error.or(Some(e)),
                    }
                }
                if let Some(error) = error {
                    return Err(error);
                }
                boolean_term(false)
            }
            Self::And => {
                let mut error = None;
                for operand in operands {
                    match operand.effective_boolean_value(context, binding) {
                        Ok(true) => (),
                        Ok(false) => return Ok(Some(boolean_term(false))),
                        Err(e) => error = error.or(Some(e)),
                    }
                }
                if let Some(error) = error {
                    return Err(error);
                }
                boolean_term(true)
            }
            Self::Not => boolean_term(!operands[0].effective_boolean_value(context, binding)?),
            Self::Equal => boolean_term(value::equals(
                &operands[0].evaluate(context, binding)?,
                &operands[1].evaluate(context, binding)?,
            )?),
            Self::NotEqual => boolean_term(!value::equals(
                &operands[0].evaluate(context, binding)?,
                &operands[1].evaluate(context, binding)?,
            )?),
            Self::Less | Self::LessOrEqual | Self::Greater | Self::GreaterOrEqual => {
                let ordering = value::compare(
                    &operands[0].evaluate(context, binding)?,
                    &operands[1].evaluate(context, binding)?,
                )?;
                boolean_term(match self {
                    Self::Less => ordering == Ordering::Less,
                    Self::LessOrEqual => ordering != Ordering::Greater,
                    Self::Greater => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                })
            }
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide => {
                let a = operands[0].numeric_value(context, binding)?;
                let b = operands[1].numeric_value(context, binding)?;
                let result = match self {
                    Self::Add => a.add(b),
                    Self::Subtract => a.subtract(b),
                    Self::Multiply => a.multiply(b),
                    _ => a.divide(b),
                }?;
                result.to_literal().into()
            }
            Self::UnaryPlus => operands[0]
                .numeric_value(context, binding)?
                .to_literal()
                .into(),
            Self::UnaryMinus => operands[0]
                .numeric_value(context, binding)?
                .negate()?
                .to_literal()
                .into(),
            Self::Bound => {
                let Expression::Variable(variable) = &operands[0] else {
                    return Err(self.unexpected_operand("a variable"));
                };
                boolean_term(context.bindings().value(variable, binding).is_some())
            }
            Self::If => {
                return if operands[0].effective_boolean_value(context, binding)? {
                    operands[1].value(context, binding)
                } else {
                    operands[2].value(context, binding)
                };
            }
            Self::Coalesce => {
                return Ok(operands
                    .iter()
                    .find_map(|operand| operand.value(context, binding).ok().flatten()));
            }
            Self::Exists | Self::NotExists => {
                let Expression::GraphPattern(pattern) = &operands[0] else {
                    return Err(self.unexpected_operand("a graph pattern"));
                };
                let evaluator = context
                    .pattern_evaluator()
                    .ok_or(ExpressionEvaluationError::MissingPatternEvaluator)?;
                let exists = evaluator
                    .exists(pattern.pattern(), context.bindings(), binding)
                    .map_err(ExpressionEvaluationError::PatternEvaluation)?;
                boolean_term(exists == (*self == Self::Exists))
            }
            Self::SameTerm => boolean_term(
                operands[0].evaluate(context, binding)? == operands[1].evaluate(context, binding)?,
            ),
            Self::Str => match operands[0].evaluate(context, binding)? {
                Term::NamedNode(node) => Literal::new_simple_literal(node.into_string()).into(),
                Term::Literal(literal) => Literal::new_simple_literal(literal.value()).into(),
                Term::BlankNode(_) => return Err(self.unexpected_operand("an IRI or a literal")),
                #[cfg(feature = "rdf-12")]
                Term::Triple(_) => return Err(self.unexpected_operand("an IRI or a literal")),
            },
            Self::Lang => {
                let Term::Literal(literal) = operands[0].evaluate(context, binding)? else {
                    return Err(self.unexpected_operand("a literal"));
                };
                Literal::new_simple_literal(literal.language().unwrap_or_default()).into()
            }
            Self::Datatype => {
                let Term::Literal(literal) = operands[0].evaluate(context, binding)? else {
                    return Err(self.unexpected_operand("a literal"));
                };
                literal.datatype().into_owned().into()
            }
            Self::IsIri => boolean_term(matches!(
                operands[0].evaluate(context, binding)?,
                Term::NamedNode(_)
            )),
            Self::IsBlank => boolean_term(matches!(
                operands[0].evaluate(context, binding)?,
                Term::BlankNode(_)
            )),
            Self::IsLiteral => boolean_term(matches!(
                operands[0].evaluate(context, binding)?,
                Term::Literal(_)
            )),
            Self::IsNumeric => boolean_term(match operands[0].evaluate(context, binding)? {
                Term::Literal(literal) => Numeric::parse(&literal).is_ok(),
                _ => false,
            }),
            Self::Iri => match operands[0].evaluate(context, binding)? {
                Term::NamedNode(node) => node.into(),
                Term::Literal(literal) if literal.datatype() == xsd::STRING => {
                    let iri = if let Some(base_iri) = context.options().parsed_base_iri() {
                        base_iri.resolve(literal.value())?
                    } else {
                        Iri::parse(literal.value().to_owned())?
                    };
                    NamedNode::new_unchecked(iri.into_inner()).into()
                }
                _ => return Err(self.unexpected_operand("an IRI or a simple literal")),
            },
            Self::Custom(name) => {
                let function = context
                    .options()
                    .custom_function(name)
                    .ok_or_else(|| ExpressionEvaluationError::UnsupportedFunction(name.clone()))?;
                let arguments = operands
                    .iter()
                    .map(|operand| operand.evaluate(context, binding))
                    .collect::<Result<Vec<_>, _>>()?;
                function(&arguments)
                    .ok_or_else(|| ExpressionEvaluationError::FunctionFailed(name.clone()))?
            }
        };
        Ok(Some(term))
    }

    fn unexpected_operand(&self, expected: &'static str) -> ExpressionEvaluationError {
        ExpressionEvaluationError::UnexpectedOperand {
            functor: self.clone(),
            expected,
        }
    }
}

impl fmt::Display for Functor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(name) => name.fmt(f),
            _ => f.write_str(self.name()),
        }
    }
}
