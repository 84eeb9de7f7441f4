// Evergreen: feature sweeps for the StumbleUpon evergreen classification task
//
// This is the library root. Each module corresponds to one stage of the
// pipeline, from raw tables to blended submissions.

pub mod config;
pub mod data;
pub mod db;
pub mod evaluate;
pub mod extract;
pub mod featureset;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod reduce;
pub mod status;
pub mod text;
