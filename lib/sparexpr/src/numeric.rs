//! Numeric coercion: [`NumericKind`] promotion lattice and [`Numeric`] values.

use crate::error::{ExpressionEvaluationError, NoNumericValueReason};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNodeRef};
use oxsdatatypes::{Boolean, Decimal, Double, Float, Integer};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt;

/// The kind of a numeric value.
///
/// The variant order is the promotion order: `Integer < Decimal < Float < Double`.
/// [`NotANumber`](NumericKind::NotANumber) is greater than all of them so that promotion is absorbing.
///
/// ```
/// use sparexpr::NumericKind;
///
/// assert_eq!(NumericKind::Integer.promote(NumericKind::Float), NumericKind::Float);
/// assert_eq!(
///     NumericKind::Double.promote(NumericKind::NotANumber),
///     NumericKind::NotANumber
/// );
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum NumericKind {
    Integer,
    Decimal,
    Float,
    Double,
    NotANumber,
}

impl NumericKind {
    /// Maps a datatype IRI to its numeric kind.
    ///
    /// Only the four primitive numeric datatypes are recognized.
    pub fn from_datatype(datatype: NamedNodeRef<'_>) -> Self {
        if datatype == xsd::INTEGER {
            Self::Integer
        } else if datatype == xsd::DECIMAL {
            Self::Decimal
        } else if datatype == xsd::FLOAT {
            Self::Float
        } else if datatype == xsd::DOUBLE {
            Self::Double
        } else {
            Self::NotANumber
        }
    }

    /// The kind of a literal, looking only at its datatype.
    ///
    /// Language-tagged and untyped literals are [`NotANumber`](NumericKind::NotANumber).
    pub fn of_literal(literal: &Literal) -> Self {
        if literal.is_plain() {
            Self::NotANumber
        } else {
            Self::from_datatype(literal.datatype())
        }
    }

    /// The kind of the result of an operation combining values of the two kinds.
    #[inline]
    #[must_use]
    pub fn promote(self, other: Self) -> Self {
        self.max(other)
    }

    /// The XSD datatype of the kind, `None` for [`NotANumber`](NumericKind::NotANumber).
    pub fn datatype(self) -> Option<NamedNodeRef<'static>> {
        match self {
            Self::Integer => Some(xsd::INTEGER),
            Self::Decimal => Some(xsd::DECIMAL),
            Self::Float => Some(xsd::FLOAT),
            Self::Double => Some(xsd::DOUBLE),
            Self::NotANumber => None,
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "xsd:integer",
            Self::Decimal => "xsd:decimal",
            Self::Float => "xsd:float",
            Self::Double => "xsd:double",
            Self::NotANumber => "NaN",
        })
    }
}

/// A numeric value tagged with its [`NumericKind`].
///
/// The derived equality is structural: `1` and `1.0e0` are different [`Numeric`]s.
/// Use [`Numeric::equals`] for the XPath numeric equality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(Integer),
    Decimal(Decimal),
    Float(Float),
    Double(Double),
}

impl Numeric {
    /// Parses the numeric value of a literal.
    ///
    /// ```
    /// use oxrdf::Literal;
    /// use oxrdf::vocab::xsd;
    /// use sparexpr::{Numeric, NumericKind};
    ///
    /// let value = Numeric::parse(&Literal::new_typed_literal("1.5e1", xsd::DOUBLE))?;
    /// assert_eq!(value.kind(), NumericKind::Double);
    /// assert!(Numeric::parse(&Literal::new_simple_literal("1")).is_err());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn parse(literal: &Literal) -> Result<Self, ExpressionEvaluationError> {
        if literal.language().is_some() {
            return Err(ExpressionEvaluationError::NoNumericValue {
                literal: literal.clone(),
                reason: NoNumericValueReason::LanguageTagged,
            });
        }
        if literal.is_plain() {
            return Err(ExpressionEvaluationError::NoNumericValue {
                literal: literal.clone(),
                reason: NoNumericValueReason::Untyped,
            });
        }
        let value = literal.value();
        match NumericKind::from_datatype(literal.datatype()) {
            NumericKind::Integer => value
                .parse()
                .map(Self::Integer)
                .map_err(|e| malformed(literal, e)),
            NumericKind::Decimal => value
                .parse()
                .map(Self::Decimal)
                .map_err(|e| malformed(literal, e)),
            NumericKind::Float => value
                .parse()
                .map(Self::Float)
                .map_err(|e| malformed(literal, e)),
            NumericKind::Double => value
                .parse()
                .map(Self::Double)
                .map_err(|e| malformed(literal, e)),
            NumericKind::NotANumber => Err(ExpressionEvaluationError::UnrecognizedNumericType(
                literal.datatype().into_owned(),
            )),
        }
    }

    #[inline]
    pub fn kind(&self) -> NumericKind {
        match self {
            Self::Integer(_) => NumericKind::Integer,
            Self::Decimal(_) => NumericKind::Decimal,
            Self::Float(_) => NumericKind::Float,
            Self::Double(_) => NumericKind::Double,
        }
    }

    /// Converts the value up to the given kind.
    ///
    /// Returns `None` if the kind is narrower than the value kind: narrowing is never implicit.
    #[must_use]
    pub fn widen(self, kind: NumericKind) -> Option<Self> {
        Some(match (self, kind) {
            (Self::Integer(v), NumericKind::Integer) => Self::Integer(v),
            (Self::Integer(v), NumericKind::Decimal) => Self::Decimal(v.into()),
            (Self::Integer(v), NumericKind::Float) => Self::Float(v.into()),
            (Self::Integer(v), NumericKind::Double) => Self::Double(v.into()),
            (Self::Decimal(v), NumericKind::Decimal) => Self::Decimal(v),
            (Self::Decimal(v), NumericKind::Float) => Self::Float(v.into()),
            (Self::Decimal(v), NumericKind::Double) => Self::Double(v.into()),
            (Self::Float(v), NumericKind::Float) => Self::Float(v),
            (Self::Float(v), NumericKind::Double) => Self::Double(v.into()),
            (Self::Double(v), NumericKind::Double) => Self::Double(v),
            _ => return None,
        })
    }

    /// The value as an [`Integer`], truncating the fractional part of wider values.
    pub fn to_integer(self) -> Result<Integer, ExpressionEvaluationError> {
        match self {
            Self::Integer(v) => Ok(v),
            Self::Decimal(v) => {
                Integer::try_from(v).map_err(|_| self.cast_error(NumericKind::Integer))
            }
            Self::Float(v) => {
                Integer::try_from(v).map_err(|_| self.cast_error(NumericKind::Integer))
            }
            Self::Double(v) => {
                Integer::try_from(v).map_err(|_| self.cast_error(NumericKind::Integer))
            }
        }
    }

    /// The value as a [`Decimal`]. Fails for NaN, infinities and out of range floating values.
    pub fn to_decimal(self) -> Result<Decimal, ExpressionEvaluationError> {
        match self {
            Self::Integer(v) => Ok(v.into()),
            Self::Decimal(v) => Ok(v),
            Self::Float(v) => {
                Decimal::try_from(v).map_err(|_| self.cast_error(NumericKind::Decimal))
            }
            Self::Double(v) => {
                Decimal::try_from(v).map_err(|_| self.cast_error(NumericKind::Decimal))
            }
        }
    }

    /// The value as a [`Float`]. Doubles are rounded to the nearest float.
    pub fn to_float(self) -> Float {
        match self {
            Self::Integer(v) => v.into(),
            Self::Decimal(v) => v.into(),
            Self::Float(v) => v,
            Self::Double(v) => v.into(),
        }
    }

    pub fn to_double(self) -> Double {
        match self {
            Self::Integer(v) => v.into(),
            Self::Decimal(v) => v.into(),
            Self::Float(v) => v.into(),
            Self::Double(v) => v,
        }
    }

    /// [Effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv): false for zero and NaN.
    pub fn effective_boolean_value(self) -> bool {
        match self {
            Self::Integer(v) => Boolean::from(v),
            Self::Decimal(v) => Boolean::from(v),
            Self::Float(v) => Boolean::from(v),
            Self::Double(v) => Boolean::from(v),
        }
        .into()
    }

    /// [op:numeric-add](https://www.w3.org/TR/xpath-functions-31/#func-numeric-add)
    pub fn add(self, rhs: Self) -> Result<Self, ExpressionEvaluationError> {
        Ok(match NumericBinaryOperands::new(self, rhs) {
            NumericBinaryOperands::Integer(a, b) => {
                Self::Integer(a.checked_add(b).ok_or(ExpressionEvaluationError::NumericOverflow)?)
            }
            NumericBinaryOperands::Decimal(a, b) => {
                Self::Decimal(a.checked_add(b).ok_or(ExpressionEvaluationError::NumericOverflow)?)
            }
            NumericBinaryOperands::Float(a, b) => Self::Float(a + b),
            NumericBinaryOperands::Double(a, b) => Self::Double(a + b),
        })
    }

    /// [op:numeric-subtract](https://www.w3.org/TR/xpath-functions-31/#func-numeric-subtract)
    pub fn subtract(self, rhs: Self) -> Result<Self, ExpressionEvaluationError> {
        Ok(match NumericBinaryOperands::new(self, rhs) {
            NumericBinaryOperands::Integer(a, b) => {
                Self::Integer(a.checked_sub(b).ok_or(ExpressionEvaluationError::NumericOverflow)?)
            }
            NumericBinaryOperands::Decimal(a, b) => {
                Self::Decimal(a.checked_sub(b).ok_or(ExpressionEvaluationError::NumericOverflow)?)
            }
            NumericBinaryOperands::Float(a, b) => Self::Float(a - b),
            NumericBinaryOperands::Double(a, b) => Self::Double(a - b),
        })
    }

    /// [op:numeric-multiply](https://www.w3.org/TR/xpath-functions-31/#func-numeric-multiply)
    pub fn multiply(self, rhs: Self) -> Result<Self, ExpressionEvaluationError> {
        Ok(match NumericBinaryOperands::new(self, rhs) {
            NumericBinaryOperands::Integer(a, b) => {
                Self::Integer(a.checked_mul(b).ok_or(ExpressionEvaluationError::NumericOverflow)?)
            }
            NumericBinaryOperands::Decimal(a, b) => {
                Self::Decimal(a.checked_mul(b).ok_or(ExpressionEvaluationError::NumericOverflow)?)
            }
            NumericBinaryOperands::Float(a, b) => Self::Float(a * b),
            NumericBinaryOperands::Double(a, b) => Self::Double(a * b),
        })
    }

    /// [op:numeric-divide](https://www.w3.org/TR/xpath-functions-31/#func-numeric-divide)
    ///
    /// Dividing two integers returns a decimal.
    pub fn divide(self, rhs: Self) -> Result<Self, ExpressionEvaluationError> {
        Ok(match NumericBinaryOperands::new(self, rhs) {
            NumericBinaryOperands::Integer(a, b) => {
                if b == Integer::from(0) {
                    return Err(ExpressionEvaluationError::DivisionByZero);
                }
                Self::Decimal(
                    Decimal::from(a)
                        .checked_div(b)
                        .ok_or(ExpressionEvaluationError::NumericOverflow)?,
                )
            }
            NumericBinaryOperands::Decimal(a, b) => {
                if b == Decimal::from(0) {
                    return Err(ExpressionEvaluationError::DivisionByZero);
                }
                Self::Decimal(
                    a.checked_div(b)
                        .ok_or(ExpressionEvaluationError::NumericOverflow)?,
                )
            }
            NumericBinaryOperands::Float(a, b) => Self::Float(a / b),
            NumericBinaryOperands::Double(a, b) => Self::Double(a / b),
        })
    }

    /// [op:numeric-unary-minus](https://www.w3.org/TR/xpath-functions-31/#func-numeric-unary-minus)
    pub fn negate(self) -> Result<Self, ExpressionEvaluationError> {
        Ok(match self {
            Self::Integer(v) => {
                Self::Integer(v.checked_neg().ok_or(ExpressionEvaluationError::NumericOverflow)?)
            }
            Self::Decimal(v) => Self::Decimal(
                Decimal::from(0)
                    .checked_sub(v)
                    .ok_or(ExpressionEvaluationError::NumericOverflow)?,
            ),
            Self::Float(v) => Self::Float(-v),
            Self::Double(v) => Self::Double(-v),
        })
    }

    /// [op:numeric-equal](https://www.w3.org/TR/xpath-functions-31/#func-numeric-equal) after promotion.
    pub fn equals(self, other: Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Compares the two values after promotion. `None` if one of them is NaN.
    pub fn compare(self, other: Self) -> Option<Ordering> {
        match NumericBinaryOperands::new(self, other) {
            NumericBinaryOperands::Integer(a, b) => a.partial_cmp(&b),
            NumericBinaryOperands::Decimal(a, b) => a.partial_cmp(&b),
            NumericBinaryOperands::Float(a, b) => a.partial_cmp(&b),
            NumericBinaryOperands::Double(a, b) => a.partial_cmp(&b),
        }
    }

    /// Materializes the value as a literal of the matching XSD datatype.
    pub fn to_literal(self) -> Literal {
        match self {
            Self::Integer(v) => Literal::new_typed_literal(v.to_string(), xsd::INTEGER),
            Self::Decimal(v) => Literal::new_typed_literal(v.to_string(), xsd::DECIMAL),
            Self::Float(v) => Literal::new_typed_literal(v.to_string(), xsd::FLOAT),
            Self::Double(v) => Literal::new_typed_literal(v.to_string(), xsd::DOUBLE),
        }
    }

    fn cast_error(self, target: NumericKind) -> ExpressionEvaluationError {
        ExpressionEvaluationError::NumericCast {
            value: self,
            target,
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => v.fmt(f),
            Self::Decimal(v) => v.fmt(f),
            Self::Float(v) => v.fmt(f),
            Self::Double(v) => v.fmt(f),
        }
    }
}

impl From<Integer> for Numeric {
    #[inline]
    fn from(value: Integer) -> Self {
        Self::Integer(value)
    }
}

impl From<i64> for Numeric {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Integer(value.into())
    }
}

impl From<Decimal> for Numeric {
    #[inline]
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<Float> for Numeric {
    #[inline]
    fn from(value: Float) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for Numeric {
    #[inline]
    fn from(value: f32) -> Self {
        Self::Float(value.into())
    }
}

impl From<Double> for Numeric {
    #[inline]
    fn from(value: Double) -> Self {
        Self::Double(value)
    }
}

impl From<f64> for Numeric {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Double(value.into())
    }
}

impl From<Numeric> for Literal {
    #[inline]
    fn from(value: Numeric) -> Self {
        value.to_literal()
    }
}

/// Two numeric operands promoted to their common kind.
pub enum NumericBinaryOperands {
    Integer(Integer, Integer),
    Decimal(Decimal, Decimal),
    Float(Float, Float),
    Double(Double, Double),
}

impl NumericBinaryOperands {
    pub fn new(a: Numeric, b: Numeric) -> Self {
        match (a, b) {
            (Numeric::Integer(v1), Numeric::Integer(v2)) => Self::Integer(v1, v2),
            (Numeric::Integer(v1), Numeric::Decimal(v2)) => Self::Decimal(v1.into(), v2),
            (Numeric::Integer(v1), Numeric::Float(v2)) => Self::Float(v1.into(), v2),
            (Numeric::Integer(v1), Numeric::Double(v2)) => Self::Double(v1.into(), v2),
            (Numeric::Decimal(v1), Numeric::Integer(v2)) => Self::Decimal(v1, v2.into()),
            (Numeric::Decimal(v1), Numeric::Decimal(v2)) => Self::Decimal(v1, v2),
            (Numeric::Decimal(v1), Numeric::Float(v2)) => Self::Float(v1.into(), v2),
            (Numeric::Decimal(v1), Numeric::Double(v2)) => Self::Double(v1.into(), v2),
            (Numeric::Float(v1), Numeric::Integer(v2)) => Self::Float(v1, v2.into()),
            (Numeric::Float(v1), Numeric::Decimal(v2)) => Self::Float(v1, v2.into()),
            (Numeric::Float(v1), Numeric::Float(v2)) => Self::Float(v1, v2),
            (Numeric::Float(v1), Numeric::Double(v2)) => Self::Double(v1.into(), v2),
            (Numeric::Double(v1), Numeric::Integer(v2)) => Self::Double(v1, v2.into()),
            (Numeric::Double(v1), Numeric::Decimal(v2)) => Self::Double(v1, v2.into()),
            (Numeric::Double(v1), Numeric::Float(v2)) => Self::Double(v1, v2.into()),
            (Numeric::Double(v1), Numeric::Double(v2)) => Self::Double(v1, v2),
        }
    }

    pub fn kind(&self) -> NumericKind {
        match self {
            Self::Integer(..) => NumericKind::Integer,
            Self::Decimal(..) => NumericKind::Decimal,
            Self::Float(..) => NumericKind::Float,
            Self::Double(..) => NumericKind::Double,
        }
    }
}

fn malformed(
    literal: &Literal,
    error: impl Error + Send + Sync + 'static,
) -> ExpressionEvaluationError {
    ExpressionEvaluationError::MalformedNumericLiteral {
        value: literal.value().into(),
        datatype: literal.datatype().into_owned(),
        source: Box::new(error),
    }
}
