#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

mod command;
mod dataset;
mod error;
mod eval;
mod template;

pub use crate::command::{GraphTarget, UpdateCommand};
pub use crate::dataset::{MemoryDataset, NamedGraph, UpdatableDataset};
pub use crate::error::UpdateEvaluationError;
pub use crate::eval::{UpdateContext, UpdateEvaluator, UpdateOutcome};
#[cfg(feature = "rdf-12")]
pub use crate::template::TripleTemplate;
pub use crate::template::{GraphNameTemplate, NamedNodeTemplate, QuadTemplate, TermTemplate};
