//! Web front-end serving birth weight predictions from a pre-trained
//! regression model.
//!
//! A form submission is parsed into a [`PredictionInput`], fed to a model
//! loaded from disk and the normalized [`PredictionResult`] is rendered back
//! into the form page.

pub mod api;
pub mod config;
pub mod core;
pub mod form;
pub mod ml;
pub mod monitoring;
pub mod templates;

pub use crate::core::{PredictResult, PredictionInput, PredictionResult, PredictorError};
