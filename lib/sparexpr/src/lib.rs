#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

mod context;
mod error;
mod expression;
mod functor;
mod numeric;
mod transform;
mod value;

pub use crate::context::{
    BindingSource, EvaluationContext, EvaluationOptions, PatternEvaluator, QueryPattern,
    SolutionMultiset,
};
pub use crate::error::{ExpressionEvaluationError, NoNumericValueReason};
pub use crate::expression::{Expression, ExpressionType, NodeTerm, NumericTerm, PatternTerm};
pub use crate::functor::Functor;
pub use crate::numeric::{Numeric, NumericBinaryOperands, NumericKind};
pub use crate::transform::{
    BindingSubstituter, ExpressionTransformer, IdentityTransformer, PrimaryExpressionSubstitution,
    PrimarySubstituter,
};
