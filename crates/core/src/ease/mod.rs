use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::AnimError;

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 32;
const SOLVE_EPSILON: f64 = 1e-6;

/// Handle point of a cubic bezier easing curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Cubic bezier easing curve running from `(0, 0)` to `(1, 1)`.
///
/// Only the two inner handles are stored. Equality is structural, so a custom
/// curve built from the same points as a preset compares equal to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ease {
    p1: Point,
    p2: Point,
}

macro_rules! presets {
    ($($name:ident = $key:literal ($x1:expr, $y1:expr, $x2:expr, $y2:expr);)*) => {
        impl Ease {
            $(
                #[doc = concat!("<http://easings.net/#", $key, ">")]
                pub const $name: Ease = Ease::from_coords($x1, $y1, $x2, $y2);
            )*
        }

        const PRESETS: &[(&str, Ease)] = &[$(($key, Ease::$name)),*];
    };
}

presets! {
    EASE_IN_SINE = "easeInSine" (0.47, 0.0, 0.745, 0.715);
    EASE_OUT_SINE = "easeOutSine" (0.39, 0.575, 0.565, 1.0);
    EASE_IN_OUT_SINE = "easeInOutSine" (0.445, 0.05, 0.55, 0.95);

    EASE_IN_QUAD = "easeInQuad" (0.55, 0.085, 0.68, 0.53);
    EASE_OUT_QUAD = "easeOutQuad" (0.25, 0.46, 0.45, 0.94);
    EASE_IN_OUT_QUAD = "easeInOutQuad" (0.455, 0.03, 0.515, 0.955);

    EASE_IN_CUBIC = "easeInCubic" (0.55, 0.055, 0.675, 0.19);
    EASE_OUT_CUBIC = "easeOutCubic" (0.215, 0.61, 0.355, 1.0);
    EASE_IN_OUT_CUBIC = "easeInOutCubic" (0.645, 0.045, 0.355, 1.0);

    EASE_IN_QUART = "easeInQuart" (0.895, 0.03, 0.685, 0.22);
    EASE_OUT_QUART = "easeOutQuart" (0.165, 0.84, 0.44, 1.0);
    EASE_IN_OUT_QUART = "easeInOutQuart" (0.77, 0.0, 0.175, 1.0);

    EASE_IN_QUINT = "easeInQuint" (0.755, 0.05, 0.855, 0.06);
    EASE_OUT_QUINT = "easeOutQuint" (0.23, 1.0, 0.32, 1.0);
    EASE_IN_OUT_QUINT = "easeInOutQuint" (0.86, 0.0, 0.07, 1.0);

    EASE_IN_EXPO = "easeInExpo" (0.95, 0.05, 0.795, 0.035);
    EASE_OUT_EXPO = "easeOutExpo" (0.19, 1.0, 0.22, 1.0);
    EASE_IN_OUT_EXPO = "easeInOutExpo" (1.0, 0.0, 0.0, 1.0);

    EASE_IN_CIRC = "easeInCirc" (0.6, 0.04, 0.98, 0.335);
    EASE_OUT_CIRC = "easeOutCirc" (0.075, 0.82, 0.165, 1.0);
    EASE_IN_OUT_CIRC = "easeInOutCirc" (0.785, 0.135, 0.15, 0.86);

    EASE_IN_BACK = "easeInBack" (0.6, -0.28, 0.735, 0.045);
    EASE_OUT_BACK = "easeOutBack" (0.175, 0.885, 0.32, 1.275);
    EASE_IN_OUT_BACK = "easeInOutBack" (0.68, -0.55, 0.265, 1.55);
}

impl Ease {
    /// Straight line, progress equals time.
    pub const LINEAR: Ease = Ease::from_coords(0.0, 0.0, 1.0, 1.0);

    const fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            p1: Point::new(x1, y1),
            p2: Point::new(x2, y2),
        }
    }

    /// Creates a custom curve from its two handles.
    pub fn custom(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    pub fn p1(&self) -> Point {
        self.p1
    }

    pub fn p2(&self) -> Point {
        self.p2
    }

    /// Flattened `[x1, y1, x2, y2]`, the shape most timing-function backends take.
    pub fn control_points(&self) -> [f64; 4] {
        [self.p1.x, self.p1.y, self.p2.x, self.p2.y]
    }

    /// Name of the matching preset, if this curve is one.
    pub fn preset_name(&self) -> Option<&'static str> {
        if *self == Self::LINEAR {
            return Some("linear");
        }
        PRESETS
            .iter()
            .find(|(_, ease)| ease == self)
            .map(|(name, _)| *name)
    }

    /// Names accepted by [`Ease::from_str`], in table order.
    pub fn preset_names() -> impl Iterator<Item = &'static str> {
        std::iter::once("linear").chain(PRESETS.iter().map(|(name, _)| *name))
    }

    /// Eased progress for a time fraction `t`, clamped to `[0, 1]`.
    ///
    /// The bezier is solved for the curve parameter whose x equals `t` and the
    /// matching y is returned. Back curves may overshoot outside `[0, 1]`.
    pub fn solve(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        let u = self.parameter_for_x(t);
        cubic_axis(u, self.p1.y, self.p2.y)
    }

    fn parameter_for_x(&self, x_target: f64) -> f64 {
        let (x1, x2) = (self.p1.x, self.p2.x);

        let mut u = x_target;
        for _ in 0..NEWTON_ITERATIONS {
            let error = cubic_axis(u, x1, x2) - x_target;
            if error.abs() < SOLVE_EPSILON {
                return u;
            }
            let slope = cubic_derivative(u, x1, x2);
            if slope.abs() < SOLVE_EPSILON {
                break;
            }
            u -= error / slope;
        }

        // Newton stalled on a flat section; bisection always converges since x(u) is monotonic
        // for handles inside the unit square.
        let (mut lo, mut hi) = (0.0, 1.0);
        u = x_target;
        for _ in 0..BISECTION_ITERATIONS {
            let x = cubic_axis(u, x1, x2);
            if (x - x_target).abs() < SOLVE_EPSILON {
                break;
            }
            if x < x_target {
                lo = u;
            } else {
                hi = u;
            }
            u = (lo + hi) * 0.5;
        }
        u
    }
}

impl Default for Ease {
    fn default() -> Self {
        Self::EASE_OUT_QUINT
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.preset_name() {
            Some(name) => f.write_str(name),
            None => write!(
                f,
                "bezier({}, {}, {}, {})",
                self.p1.x, self.p1.y, self.p2.x, self.p2.y
            ),
        }
    }
}

impl FromStr for Ease {
    type Err = AnimError;

    /// Accepts the easings.net spelling (`easeOutQuint`) as well as snake or
    /// kebab case (`ease_out_quint`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        if wanted == "linear" {
            return Ok(Self::LINEAR);
        }
        PRESETS
            .iter()
            .find(|(name, _)| normalize(name) == wanted)
            .map(|(_, ease)| *ease)
            .ok_or_else(|| AnimError::UnknownEase(s.to_string()))
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn cubic_axis(u: f64, p1: f64, p2: f64) -> f64 {
    let v = 1.0 - u;
    3.0 * v * v * u * p1 + 3.0 * v * u * u * p2 + u * u * u
}

fn cubic_derivative(u: f64, p1: f64, p2: f64) -> f64 {
    let v = 1.0 - u;
    3.0 * v * v * p1 + 6.0 * v * u * (p2 - p1) + 3.0 * u * u * (1.0 - p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        let custom = Ease::custom(Point::new(0.23, 1.0), Point::new(0.32, 1.0));
        assert_eq!(custom, Ease::EASE_OUT_QUINT);
        assert_ne!(custom, Ease::EASE_IN_QUINT);
        assert_eq!(Ease::default(), Ease::EASE_OUT_QUINT);
    }

    #[test]
    fn looks_up_presets_by_name() {
        assert_eq!("easeInOutBack".parse::<Ease>().unwrap(), Ease::EASE_IN_OUT_BACK);
        assert_eq!("ease_in_circ".parse::<Ease>().unwrap(), Ease::EASE_IN_CIRC);
        assert_eq!("Linear".parse::<Ease>().unwrap(), Ease::LINEAR);

        let err = "wobble".parse::<Ease>().unwrap_err();
        assert!(matches!(err, AnimError::UnknownEase(ref name) if name == "wobble"));
    }

    #[test]
    fn preset_table_is_complete() {
        // linear plus eight families with in/out/in-out variants
        assert_eq!(Ease::preset_names().count(), 25);
        for name in Ease::preset_names() {
            let ease: Ease = name.parse().unwrap();
            assert_eq!(ease.preset_name(), Some(name));
        }
    }

    #[test]
    fn solves_endpoints_and_linear() {
        for name in Ease::preset_names() {
            let ease: Ease = name.parse().unwrap();
            assert_eq!(ease.solve(0.0), 0.0);
            assert_eq!(ease.solve(1.0), 1.0);
        }
        for t in [0.1, 0.25, 0.5, 0.9] {
            assert!((Ease::LINEAR.solve(t) - t).abs() < 1e-4);
        }
    }

    #[test]
    fn ease_out_runs_ahead_of_ease_in() {
        let t = 0.3;
        assert!(Ease::EASE_OUT_CUBIC.solve(t) > t);
        assert!(Ease::EASE_IN_CUBIC.solve(t) < t);
        assert!(Ease::EASE_OUT_BACK.solve(0.7) > 1.0);
    }

    #[test]
    fn displays_custom_curves_as_points() {
        let ease = Ease::custom(Point::new(0.1, 0.2), Point::new(0.3, 0.4));
        assert_eq!(ease.to_string(), "bezier(0.1, 0.2, 0.3, 0.4)");
        assert_eq!(ease.control_points(), [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(Ease::EASE_IN_SINE.to_string(), "easeInSine");
    }
}
