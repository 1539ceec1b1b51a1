//! Easing functions for keyframe segments
//!
//! Every keyframe names the easing used when transitioning *to* it. Ids travel
//! over the wire as camelCase strings (`"easeInOutCubic"`); anything we do not
//! recognise decodes as [`Easing::Linear`].

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;
const ELASTIC_C4: f64 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f64 = (2.0 * PI) / 4.5;
const BOUNCE_N1: f64 = 7.5625;
const BOUNCE_D1: f64 = 2.75;

/// Default number of samples in an easing preview curve
pub const PREVIEW_SAMPLES: usize = 48;

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Easing {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
    EaseInBounce,
    EaseOutBounce,
    EaseInOutBounce,
}

impl Easing {
    /// Every easing, linear first, in the order an easing picker lists them
    pub const ALL: [Easing; 31] = [
        Easing::Linear,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInQuint,
        Easing::EaseOutQuint,
        Easing::EaseInOutQuint,
        Easing::EaseInSine,
        Easing::EaseOutSine,
        Easing::EaseInOutSine,
        Easing::EaseInExpo,
        Easing::EaseOutExpo,
        Easing::EaseInOutExpo,
        Easing::EaseInCirc,
        Easing::EaseOutCirc,
        Easing::EaseInOutCirc,
        Easing::EaseInBack,
        Easing::EaseOutBack,
        Easing::EaseInOutBack,
        Easing::EaseInElastic,
        Easing::EaseOutElastic,
        Easing::EaseInOutElastic,
        Easing::EaseInBounce,
        Easing::EaseOutBounce,
        Easing::EaseInOutBounce,
    ];

    /// Apply the easing function to a progress value.
    ///
    /// The input is clamped to `[0, 1]` and the endpoints map exactly to 0 and
    /// 1. Back and elastic curves overshoot in between, so the result is not
    /// bounded to `[0, 1]`.
    pub fn apply(&self, t: f64) -> f64 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }

        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInQuart => t * t * t * t,
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::EaseInQuint => t.powi(5),
            Easing::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::EaseInOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::EaseOutSine => (t * PI / 2.0).sin(),
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::EaseInExpo => 2f64.powf(10.0 * t - 10.0),
            Easing::EaseOutExpo => 1.0 - 2f64.powf(-10.0 * t),
            Easing::EaseInOutExpo => {
                if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Easing::EaseInCirc => 1.0 - (1.0 - t * t).sqrt(),
            Easing::EaseOutCirc => (1.0 - (t - 1.0).powi(2)).sqrt(),
            Easing::EaseInOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }
            Easing::EaseInBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Easing::EaseOutBack => {
                1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
            }
            Easing::EaseInOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        / 2.0
                }
            }
            Easing::EaseInElastic => {
                -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
            }
            Easing::EaseOutElastic => {
                2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
            }
            Easing::EaseInOutElastic => {
                if t < 0.5 {
                    -(2f64.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                } else {
                    (2f64.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                        + 1.0
                }
            }
            Easing::EaseInBounce => 1.0 - bounce_out(1.0 - t),
            Easing::EaseOutBounce => bounce_out(t),
            Easing::EaseInOutBounce => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
        }
    }

    /// Wire id of this easing (`"linear"`, `"easeInOutCubic"`, ...)
    pub fn id(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseInQuad => "easeInQuad",
            Easing::EaseOutQuad => "easeOutQuad",
            Easing::EaseInOutQuad => "easeInOutQuad",
            Easing::EaseInCubic => "easeInCubic",
            Easing::EaseOutCubic => "easeOutCubic",
            Easing::EaseInOutCubic => "easeInOutCubic",
            Easing::EaseInQuart => "easeInQuart",
            Easing::EaseOutQuart => "easeOutQuart",
            Easing::EaseInOutQuart => "easeInOutQuart",
            Easing::EaseInQuint => "easeInQuint",
            Easing::EaseOutQuint => "easeOutQuint",
            Easing::EaseInOutQuint => "easeInOutQuint",
            Easing::EaseInSine => "easeInSine",
            Easing::EaseOutSine => "easeOutSine",
            Easing::EaseInOutSine => "easeInOutSine",
            Easing::EaseInExpo => "easeInExpo",
            Easing::EaseOutExpo => "easeOutExpo",
            Easing::EaseInOutExpo => "easeInOutExpo",
            Easing::EaseInCirc => "easeInCirc",
            Easing::EaseOutCirc => "easeOutCirc",
            Easing::EaseInOutCirc => "easeInOutCirc",
            Easing::EaseInBack => "easeInBack",
            Easing::EaseOutBack => "easeOutBack",
            Easing::EaseInOutBack => "easeInOutBack",
            Easing::EaseInElastic => "easeInElastic",
            Easing::EaseOutElastic => "easeOutElastic",
            Easing::EaseInOutElastic => "easeInOutElastic",
            Easing::EaseInBounce => "easeInBounce",
            Easing::EaseOutBounce => "easeOutBounce",
            Easing::EaseInOutBounce => "easeInOutBounce",
        }
    }

    /// Look up an easing by id.
    ///
    /// Matching ignores case, `-` and `_`, so `"ease-in-out-cubic"` resolves
    /// too. Unknown ids fall back to linear.
    pub fn from_id(id: &str) -> Easing {
        let wanted: String = id
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Easing::ALL
            .iter()
            .copied()
            .find(|easing| easing.id().eq_ignore_ascii_case(&wanted))
            .unwrap_or_else(|| {
                if !wanted.is_empty() && wanted != "linear" {
                    tracing::debug!("unknown easing {:?}, using linear", id);
                }
                Easing::Linear
            })
    }

    /// Whether the curve leaves `[0, 1]` somewhere in between the endpoints
    pub fn overshoots(&self) -> bool {
        matches!(
            self,
            Easing::EaseInBack
                | Easing::EaseOutBack
                | Easing::EaseInOutBack
                | Easing::EaseInElastic
                | Easing::EaseOutElastic
                | Easing::EaseInOutElastic
        )
    }

    /// Build a preview polyline of this easing inside a `width` x `height` box.
    ///
    /// Only used for visualization; playback always calls [`Easing::apply`].
    pub fn preview(&self, samples: usize, width: f64, height: f64) -> EasingCurve {
        let samples = samples.max(2);
        let values: Vec<f64> = (0..samples)
            .map(|i| self.apply(i as f64 / (samples - 1) as f64))
            .collect();

        let mut min = values.iter().copied().fold(0.0_f64, f64::min);
        let mut max = values.iter().copied().fold(1.0_f64, f64::max);
        if min < 0.0 || max > 1.0 {
            let pad = (max - min) * 0.1;
            min -= pad;
            max += pad;
        }
        let range = max - min;

        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let x = i as f64 / (samples - 1) as f64 * width;
                // SVG-style box: y grows downwards
                let y = height - (v - min) / range * height;
                [x, y]
            })
            .collect();

        EasingCurve {
            points,
            min,
            max,
            width,
            height,
        }
    }
}

/// Standard four-region bounce
fn bounce_out(t: f64) -> f64 {
    if t < 1.0 / BOUNCE_D1 {
        BOUNCE_N1 * t * t
    } else if t < 2.0 / BOUNCE_D1 {
        let t = t - 1.5 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.75
    } else if t < 2.5 / BOUNCE_D1 {
        let t = t - 2.25 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.984375
    }
}

/// Apply `kind` to `t`, linear when no easing is set
pub fn ease(t: f64, kind: Option<Easing>) -> f64 {
    kind.unwrap_or_default().apply(t)
}

impl From<String> for Easing {
    fn from(id: String) -> Self {
        Easing::from_id(&id)
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.id().to_string()
    }
}

impl std::fmt::Display for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Sampled preview of an easing curve
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EasingCurve {
    /// Polyline vertices in box coordinates (x right, y down)
    pub points: Vec<[f64; 2]>,
    /// Value mapped to the bottom edge
    pub min: f64,
    /// Value mapped to the top edge
    pub max: f64,
    pub width: f64,
    pub height: f64,
}

impl EasingCurve {
    /// Render as an SVG `points` attribute (`"x,y x,y ..."`)
    pub fn to_svg_points(&self) -> String {
        self.points
            .iter()
            .map(|[x, y]| format!("{:.2},{:.2}", x, y))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_exact() {
        for easing in Easing::ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing} at 0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing} at 1");
        }
    }

    #[test]
    fn test_input_clamped() {
        assert_eq!(Easing::EaseInQuad.apply(-3.0), 0.0);
        assert_eq!(Easing::EaseOutBounce.apply(7.0), 1.0);
        assert_eq!(Easing::Linear.apply(f64::NAN), 0.0);
    }

    #[test]
    fn test_known_midpoints() {
        assert!((Easing::Linear.apply(0.25) - 0.25).abs() < 1e-12);
        assert!((Easing::EaseInQuad.apply(0.5) - 0.25).abs() < 1e-12);
        assert!((Easing::EaseOutQuad.apply(0.5) - 0.75).abs() < 1e-12);
        assert!((Easing::EaseInOutCubic.apply(0.5) - 0.5).abs() < 1e-12);
        assert!((Easing::EaseInOutSine.apply(0.5) - 0.5).abs() < 1e-12);
        assert!((Easing::EaseInOutElastic.apply(0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bounce_regions() {
        // Region boundaries of the piecewise bounce land on the floor values
        assert!((bounce_out(1.0 / BOUNCE_D1) - 1.0).abs() < 1e-9);
        assert!((bounce_out(1.5 / BOUNCE_D1) - 0.75).abs() < 1e-9);
        assert!((bounce_out(2.25 / BOUNCE_D1) - 0.9375).abs() < 1e-9);
        assert!((bounce_out(2.625 / BOUNCE_D1) - 0.984375).abs() < 1e-9);
    }

    #[test]
    fn test_back_and_elastic_overshoot() {
        assert!(Easing::EaseInBack.apply(0.2) < 0.0);
        assert!(Easing::EaseOutBack.apply(0.8) > 1.0);
        let samples: Vec<f64> = (1..100)
            .map(|i| Easing::EaseOutElastic.apply(i as f64 / 100.0))
            .collect();
        assert!(samples.iter().any(|v| *v > 1.0));
    }

    #[test]
    fn test_id_round_trip_and_fallback() {
        for easing in Easing::ALL {
            assert_eq!(Easing::from_id(easing.id()), easing);
        }
        assert_eq!(Easing::from_id("ease-in-out-cubic"), Easing::EaseInOutCubic);
        assert_eq!(Easing::from_id("wobble"), Easing::Linear);
        assert_eq!(Easing::from_id(""), Easing::Linear);
    }

    #[test]
    fn test_serde_unknown_is_linear() {
        let easing: Easing = serde_json::from_str("\"springy\"").unwrap();
        assert_eq!(easing, Easing::Linear);
        let json = serde_json::to_string(&Easing::EaseOutBounce).unwrap();
        assert_eq!(json, "\"easeOutBounce\"");
    }

    #[test]
    fn test_preview_bounded_curve() {
        let curve = Easing::Linear.preview(PREVIEW_SAMPLES, 100.0, 60.0);
        assert_eq!(curve.points.len(), PREVIEW_SAMPLES);
        assert_eq!(curve.min, 0.0);
        assert_eq!(curve.max, 1.0);
        assert_eq!(curve.points[0], [0.0, 60.0]);
        assert_eq!(curve.points[PREVIEW_SAMPLES - 1], [100.0, 0.0]);
    }

    #[test]
    fn test_preview_pads_overshoot() {
        let curve = Easing::EaseInOutBack.preview(PREVIEW_SAMPLES, 100.0, 60.0);
        assert!(curve.min < 0.0);
        assert!(curve.max > 1.0);
        for [x, y] in &curve.points {
            assert!((0.0..=100.0).contains(x));
            assert!(*y > 0.0 && *y < 60.0);
        }
        assert!(curve.to_svg_points().starts_with("0.00,"));
    }
}
