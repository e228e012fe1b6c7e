pub mod server;

pub use server::{routes, status_for, AppState, PredictorServer, MAX_FORM_BYTES};
