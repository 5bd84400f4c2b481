//! Text width & line-fit engine for the evaluation form's narrative field.

pub mod analysis;
pub mod display;
pub mod handlers;
pub mod line_break;
pub mod optimize;
pub mod render;
pub mod width_table;
