pub mod app;
pub mod bind;
pub mod braille;
pub mod color;
pub mod config;
pub mod data;
pub mod interaction;
pub mod legend;
pub mod map;
pub mod scale;
pub mod svg;
pub mod ui;
