//! Browser-side state: admin login gate, review form and video recorder.
//!
//! Nothing here talks to the network. A front end drives these objects and
//! renders their results.

pub mod form;
pub mod recorder;
pub mod session;
