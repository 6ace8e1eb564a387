pub mod breakdown;
pub mod engagement;
pub mod hot_score;
pub mod legacy;
pub mod signals;

pub use breakdown::{
    compute_breakdown, stored_or_computed, BountyBreakdown, ComponentBreakdown, SignalBreakdown,
    SimulationOverrides,
};
pub use engagement::{get_freshness_multiplier, Components};
pub use hot_score::{calculate_hot_score, time_denominator};
pub use legacy::calculate_hot_score_legacy;
pub use signals::{extract_signals, SignalSet};
