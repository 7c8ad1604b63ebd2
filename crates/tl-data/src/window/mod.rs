//! Adaptive time windows for backward message search

use tl_core::Time;
use crate::config::WindowConfig;

/// Window size (ms) expected to hold `config.target_messages` messages of a
/// topic with `num_messages` spread over `[first, last]`.
///
/// Falls back to the default window when the topic has no measurable
/// duration or no messages.
pub fn calculate_optimal_window_ms(
    num_messages: usize,
    first: Time,
    last: Time,
    config: &WindowConfig,
) -> f64 {
    let duration_sec = last.as_secs_f64() - first.as_secs_f64();
    if duration_sec <= 0.0 || num_messages == 0 {
        return config.default_window_ms;
    }

    let messages_per_sec = num_messages as f64 / duration_sec;
    let window_sec = config.target_messages as f64 / messages_per_sec;

    (window_sec * 1000.0).clamp(config.min_window_ms, config.max_window_ms)
}

/// Progressively larger windows starting at `initial_ms`
pub fn create_window_sizes(initial_ms: f64, config: &WindowConfig) -> Vec<f64> {
    let mut windows = Vec::with_capacity(config.max_windows);
    windows.push(initial_ms);
    for i in 1..config.max_windows {
        let grown = initial_ms * config.growth_factor.powi(i as i32);
        windows.push(grown.min(config.window_cap_ms));
    }
    windows
}

/// Whether a window of `window_ms` ending at `current` starts at or before `boundary`
pub fn would_reach_boundary(current: Time, window_ms: f64, boundary: Option<Time>) -> bool {
    match boundary {
        Some(boundary) => current.saturating_sub_millis(window_ms) <= boundary,
        None => false,
    }
}
