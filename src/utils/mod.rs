mod maths_utils;
mod time_utils;

pub use time_utils::{
    Clock, SystemClock, TimeUtils, epoch_ms_to_time_string, format_time_since, system_clock,
};

#[cfg(test)]
pub use time_utils::ManualClock;

pub(crate) use maths_utils::{clamp_unit, mean};
