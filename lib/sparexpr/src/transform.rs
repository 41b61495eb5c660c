use crate::context::BindingSource;
use crate::expression::Expression;
use crate::functor::Functor;

/// Rewrites expression trees.
///
/// [`transform`](Self::transform) is called once for each visited node.
/// The default implementation rebuilds composites from their transformed operands
/// and keeps primary expressions unchanged.
///
/// ```
/// use sparexpr::{Expression, ExpressionTransformer};
///
/// /// Swaps `+` and `-` everywhere in the tree
/// struct SwapSigns;
///
/// impl ExpressionTransformer for SwapSigns {
///     fn transform(&mut self, expression: &Expression) -> Expression {
///         match expression {
///             Expression::Composite(sparexpr::Functor::Add, operands) => {
///                 self.transform(&operands[0]) - self.transform(&operands[1])
///             }
///             _ => expression.transform(self),
///         }
///     }
/// }
///
/// let expression = Expression::from(1) + (Expression::from(2) + Expression::from(3));
/// assert_eq!(SwapSigns.transform(&expression).to_string(), "(1 - (2 - 3))");
/// ```
pub trait ExpressionTransformer {
    fn transform(&mut self, expression: &Expression) -> Expression {
        expression.transform(self)
    }
}

/// Rebuilds an identical tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransformer;

impl ExpressionTransformer for IdentityTransformer {}

/// Replacement of the primary expressions of a tree, see [`PrimarySubstituter`].
pub trait PrimaryExpressionSubstitution {
    fn substitute_primary_expression(&mut self, expression: &Expression) -> Expression;
}

/// A transformer that only replaces the [primary](crate::ExpressionType::Primary) expressions.
///
/// Composite nodes are rebuilt around the substituted leaves.
#[derive(Debug, Clone, Default)]
pub struct PrimarySubstituter<S> {
    substitution: S,
}

impl<S: PrimaryExpressionSubstitution> PrimarySubstituter<S> {
    pub fn new(substitution: S) -> Self {
        Self { substitution }
    }

    pub fn into_inner(self) -> S {
        self.substitution
    }
}

impl<S: PrimaryExpressionSubstitution> ExpressionTransformer for PrimarySubstituter<S> {
    fn transform(&mut self, expression: &Expression) -> Expression {
        match expression {
            e if e.is_primary() => self.substitution.substitute_primary_expression(e),
            e => e.transform(self),
        }
    }
}

impl<F: FnMut(&Expression) -> Expression> PrimaryExpressionSubstitution for F {
    fn substitute_primary_expression(&mut self, expression: &Expression) -> Expression {
        self(expression)
    }
}

/// Replaces the bound variables by the constant they are bound to in a given binding.
///
/// Unbound variables are kept as references.
/// `BOUND(?v)` calls are folded into the boolean they evaluate to in the binding.
///
/// ```
/// use oxrdf::{Literal, Variable};
/// use sparexpr::{BindingSubstituter, Expression, ExpressionTransformer, SolutionMultiset};
///
/// let mut solutions = SolutionMultiset::new();
/// let binding = solutions.push([(Variable::new("x")?, Literal::from(2).into())]);
/// let expression = Expression::variable("x") + Expression::variable("y");
/// let substituted = BindingSubstituter::new(&solutions, binding).transform(&expression);
/// assert_eq!(substituted.to_string(), "(2 + ?y)");
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, Copy)]
pub struct BindingSubstituter<'a> {
    bindings: &'a dyn BindingSource,
    binding: usize,
}

impl<'a> BindingSubstituter<'a> {
    pub fn new(bindings: &'a dyn BindingSource, binding: usize) -> Self {
        Self { bindings, binding }
    }
}

impl ExpressionTransformer for BindingSubstituter<'_> {
    fn transform(&mut self, expression: &Expression) -> Expression {
        match expression {
            Expression::Variable(variable) => self
                .bindings
                .value(variable, self.binding)
                .map_or_else(|| expression.clone(), |term| Expression::constant(term.clone())),
            Expression::Composite(Functor::Bound, operands) => match operands.as_slice() {
                [Expression::Variable(variable)] => {
                    Expression::from(self.bindings.value(variable, self.binding).is_some())
                }
                // Ill-formed call, keeps failing at evaluation
                _ => expression.clone(),
            },
            e => e.transform(self),
        }
    }
}
