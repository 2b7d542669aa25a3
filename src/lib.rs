pub mod config;
pub mod event_log;
pub mod game;
pub mod matrix;
pub mod pieces;
pub mod scoring;
