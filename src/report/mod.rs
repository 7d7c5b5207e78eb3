// Console rendering of query outputs. Formatting only; no signal logic.
mod tables;

pub use tables::{render_current_spikes, render_opportunities, render_order_book};
