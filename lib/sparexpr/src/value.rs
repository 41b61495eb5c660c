use crate::error::ExpressionEvaluationError;
use crate::numeric::{Numeric, NumericKind};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, Term};
use oxsdatatypes::Boolean;
use std::cmp::Ordering;

/// A term seen through the lens of the SPARQL operators.
#[derive(Debug, Clone, Copy)]
enum TypedValue<'a> {
    NonLiteral,
    String(&'a str),
    LangString { value: &'a str, language: &'a str },
    Boolean(bool),
    Numeric(Numeric),
    /// Numeric or boolean datatype with an invalid lexical form
    IllFormed,
    Other(&'a Literal),
}

impl<'a> TypedValue<'a> {
    fn new(term: &'a Term) -> Self {
        let Term::Literal(literal) = term else {
            return Self::NonLiteral;
        };
        if let Some(language) = literal.language() {
            return Self::LangString {
                value: literal.value(),
                language,
            };
        }
        let datatype = literal.datatype();
        if datatype == xsd::STRING {
            Self::String(literal.value())
        } else if datatype == xsd::BOOLEAN {
            literal
                .value()
                .parse::<Boolean>()
                .map_or(Self::IllFormed, |v| Self::Boolean(v.into()))
        } else if NumericKind::from_datatype(datatype) == NumericKind::NotANumber {
            Self::Other(literal)
        } else {
            Numeric::parse(literal).map_or(Self::IllFormed, Self::Numeric)
        }
    }
}

/// Computes the term [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv).
pub(crate) fn effective_boolean_value(term: &Term) -> Result<bool, ExpressionEvaluationError> {
    match TypedValue::new(term) {
        TypedValue::Boolean(value) => Ok(value),
        TypedValue::String(value) | TypedValue::LangString { value, .. } => Ok(!value.is_empty()),
        TypedValue::Numeric(value) => Ok(value.effective_boolean_value()),
        TypedValue::IllFormed => Ok(false),
        TypedValue::NonLiteral | TypedValue::Other(_) => {
            Err(ExpressionEvaluationError::EbvNotApplicable(term.clone()))
        }
    }
}

/// The `=` operator: RDF term equality extended with value equality for known datatypes.
pub(crate) fn equals(a: &Term, b: &Term) -> Result<bool, ExpressionEvaluationError> {
    let (va, vb) = (TypedValue::new(a), TypedValue::new(b));
    if let (TypedValue::Numeric(x), TypedValue::Numeric(y)) = (va, vb) {
        // NaN is not equal to itself
        return Ok(x.equals(y));
    }
    if a == b {
        return Ok(true);
    }
    match (va, vb) {
        (TypedValue::Boolean(x), TypedValue::Boolean(y)) => Ok(x == y),
        (TypedValue::String(x), TypedValue::String(y)) => Ok(x == y),
        // Same literal would have been caught by term equality
        (
            TypedValue::Other(_) | TypedValue::IllFormed,
            TypedValue::Other(_) | TypedValue::IllFormed,
        )
        | (
            TypedValue::Other(_) | TypedValue::IllFormed,
            TypedValue::String(_) | TypedValue::Boolean(_) | TypedValue::Numeric(_),
        )
        | (
            TypedValue::String(_) | TypedValue::Boolean(_) | TypedValue::Numeric(_),
            TypedValue::Other(_) | TypedValue::IllFormed,
        ) => Err(ExpressionEvaluationError::IncomparableOperands(
            a.clone(),
            b.clone(),
        )),
        _ => Ok(false),
    }
}

/// Ordering used by `<`, `>`, `<=` and `>=`.
pub(crate) fn compare(a: &Term, b: &Term) -> Result<Ordering, ExpressionEvaluationError> {
    let ordering = match (TypedValue::new(a), TypedValue::new(b)) {
        (TypedValue::Numeric(x), TypedValue::Numeric(y)) => x.compare(y),
        (TypedValue::String(x), TypedValue::String(y)) => Some(x.cmp(y)),
        (
            TypedValue::LangString {
                value: x,
                language: lx,
            },
            TypedValue::LangString {
                value: y,
                language: ly,
            },
        ) if lx == ly => Some(x.cmp(y)),
        (TypedValue::Boolean(x), TypedValue::Boolean(y)) => Some(x.cmp(&y)),
        (TypedValue::Other(x), TypedValue::Other(y)) if x == y => Some(Ordering::Equal),
        _ => None,
    };
    ordering.ok_or_else(|| ExpressionEvaluationError::IncomparableOperands(a.clone(), b.clone()))
}

/// Builds an `xsd:boolean` literal.
pub(crate) fn boolean_term(value: bool) -> Term {
    Literal::from(value).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, NamedNode};

    fn typed(value: &str, datatype: oxrdf::NamedNodeRef<'_>) -> Term {
        Literal::new_typed_literal(value, datatype).into()
    }

    #[test]
    fn ebv_of_literals() -> Result<(), ExpressionEvaluationError> {
        assert!(!effective_boolean_value(&typed("", xsd::STRING))?);
        assert!(effective_boolean_value(&Literal::new_simple_literal("x").into())?);
        assert!(!effective_boolean_value(&typed("0", xsd::INTEGER))?);
        assert!(effective_boolean_value(&typed("1", xsd::INTEGER))?);
        assert!(!effective_boolean_value(&typed("0.0", xsd::DECIMAL))?);
        assert!(!effective_boolean_value(&typed("NaN", xsd::DOUBLE))?);
        assert!(!effective_boolean_value(&typed("false", xsd::BOOLEAN))?);
        assert!(effective_boolean_value(&typed("1", xsd::BOOLEAN))?);
        assert!(!effective_boolean_value(&typed("yes", xsd::BOOLEAN))?);
        assert!(!effective_boolean_value(&typed("abc", xsd::INTEGER))?);
        let tagged = Literal::new_language_tagged_literal_unchecked("a", "en");
        assert!(effective_boolean_value(&tagged.into())?);
        Ok(())
    }

    #[test]
    fn ebv_not_applicable() {
        for term in [
            Term::from(NamedNode::new_unchecked("http://example.com/s")),
            BlankNode::default().into(),
            typed("2020-01-01", xsd::DATE),
        ] {
            assert!(matches!(
                effective_boolean_value(&term),
                Err(ExpressionEvaluationError::EbvNotApplicable(_))
            ));
        }
    }

    #[test]
    fn value_equality() -> Result<(), ExpressionEvaluationError> {
        assert!(equals(&typed("1", xsd::INTEGER), &typed("1.0", xsd::DECIMAL))?);
        assert!(equals(&typed("1", xsd::BOOLEAN), &typed("true", xsd::BOOLEAN))?);
        assert!(!equals(
            &typed("1", xsd::INTEGER),
            &Literal::new_simple_literal("1").into()
        )?);
        assert!(!equals(
            &NamedNode::new_unchecked("http://example.com/s").into(),
            &typed("1", xsd::INTEGER)
        )?);
        assert!(equals(&typed("x", xsd::DATE), &typed("x", xsd::DATE))?);
        assert!(matches!(
            equals(&typed("x", xsd::DATE), &typed("y", xsd::DATE)),
            Err(ExpressionEvaluationError::IncomparableOperands(..))
        ));
        Ok(())
    }

    #[test]
    fn nan_is_not_equal_to_itself() -> Result<(), ExpressionEvaluationError> {
        let nan = typed("NaN", xsd::DOUBLE);
        assert!(!equals(&nan, &nan)?);
        assert!(!equals(&typed("NaN", xsd::FLOAT), &typed("NaN", xsd::FLOAT))?);
        assert!(!equals(&nan, &typed("NaN", xsd::FLOAT))?);
        assert!(equals(&typed("INF", xsd::DOUBLE), &typed("INF", xsd::DOUBLE))?);
        Ok(())
    }

    #[test]
    fn ordering() -> Result<(), ExpressionEvaluationError> {
        assert_eq!(
            compare(&typed("1", xsd::INTEGER), &typed("1.5", xsd::FLOAT))?,
            Ordering::Less
        );
        assert_eq!(
            compare(
                &Literal::new_simple_literal("b").into(),
                &Literal::new_simple_literal("a").into()
            )?,
            Ordering::Greater
        );
        assert!(
            compare(
                &typed("1", xsd::INTEGER),
                &Literal::new_simple_literal("1").into()
            )
            .is_err()
        );
        assert!(compare(
            &Literal::new_language_tagged_literal_unchecked("a", "en").into(),
            &Literal::new_language_tagged_literal_unchecked("a", "fr").into()
        )
        .is_err());
        Ok(())
    }
}
