//! Three-stage easing: slow activation, fast transport, decelerated approach.

/// End of the activation stage
const ACTIVATION_END: f64 = 0.1;
/// End of the transport stage
const TRANSPORT_END: f64 = 0.7;
/// Eased value at the end of activation (`2 * 0.1²`)
const ACTIVATION_VALUE: f64 = 0.02;
/// Eased value at the end of transport
const TRANSPORT_VALUE: f64 = 0.82;

/// Map linear progress `t` in [0, 1] to eased progress in [0, 1].
///
/// - `t < 0.1`: quadratic ramp `2t²`
/// - `0.1 <= t < 0.7`: cubic ease-in-out scaled into [0.02, 0.82]
/// - `t >= 0.7`: quadratic deceleration into [0.82, 1.0]
///
/// Continuous at both stage boundaries; input outside [0, 1] is clamped.
pub fn ease(t: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

    if t < ACTIVATION_END {
        2.0 * t * t
    } else if t < TRANSPORT_END {
        let u = (t - ACTIVATION_END) / (TRANSPORT_END - ACTIVATION_END);
        ACTIVATION_VALUE + (TRANSPORT_VALUE - ACTIVATION_VALUE) * cubic_in_out(u)
    } else {
        let u = (t - TRANSPORT_END) / (1.0 - TRANSPORT_END);
        TRANSPORT_VALUE + (1.0 - TRANSPORT_VALUE) * quadratic_out(u)
    }
}

fn cubic_in_out(u: f64) -> f64 {
    if u < 0.5 {
        4.0 * u * u * u
    } else {
        let v = -2.0 * u + 2.0;
        1.0 - v * v * v / 2.0
    }
}

fn quadratic_out(u: f64) -> f64 {
    1.0 - (1.0 - u) * (1.0 - u)
}
