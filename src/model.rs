use serde::{Deserialize, Serialize};

pub const DEFAULT_STEP_NAME: &str = "Step";

/// Upper bound for either delay, in seconds.
pub const MAX_DELAY_SECS: f64 = 60.0;

fn default_step_name() -> String {
    DEFAULT_STEP_NAME.to_string()
}

/// A single click definition: a target disc plus the delay that follows it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Step {
    /// Display label for this step.
    #[serde(default = "default_step_name")]
    pub name: String,
    pub x: i32,
    pub y: i32,
    /// Tolerance around `(x, y)` in pixels.
    pub radius: u32,
    /// Delay bounds in seconds applied after the click.
    pub delay_min: f64,
    pub delay_max: f64,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            name: default_step_name(),
            x: 100,
            y: 100,
            radius: 20,
            delay_min: 0.5,
            delay_max: 1.5,
        }
    }
}

impl Step {
    /// Delay bounds ordered low to high, with negative or non-finite values
    /// treated as zero and anything above `MAX_DELAY_SECS` capped.
    pub fn delay_range(&self) -> (f64, f64) {
        let clean = |v: f64| if v.is_finite() && v > 0.0 { v.min(MAX_DELAY_SECS) } else { 0.0 };
        let (a, b) = (clean(self.delay_min), clean(self.delay_max));
        if a <= b { (a, b) } else { (b, a) }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        for (field, v) in [("delay_min", self.delay_min), ("delay_max", self.delay_max)] {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("step '{}': {field} must be a non-negative number, got {v}", self.name));
            }
            if v > MAX_DELAY_SECS {
                return Err(format!("step '{}': {field} must be at most {MAX_DELAY_SECS} seconds, got {v}", self.name));
            }
        }
        Ok(())
    }

    pub fn summary(&self, index: usize) -> String {
        format!(
            "{} {}: x={}, y={}, r={}, delay=({}-{})",
            index + 1,
            self.name,
            self.x,
            self.y,
            self.radius,
            self.delay_min,
            self.delay_max
        )
    }
}

/// A named, ordered sequence of steps. Step order is playback order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Config {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), steps: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_defaults() {
        let step = Step::default();
        assert_eq!(step.name, "Step");
        assert_eq!((step.x, step.y, step.radius), (100, 100, 20));
        assert_eq!(step.delay_range(), (0.5, 1.5));
    }

    #[test]
    fn test_delay_range_swaps_and_clamps() {
        let mut step = Step { delay_min: 3.0, delay_max: 1.0, ..Step::default() };
        assert_eq!(step.delay_range(), (1.0, 3.0));

        step.delay_min = -2.0;
        step.delay_max = f64::NAN;
        assert_eq!(step.delay_range(), (0.0, 0.0));

        step.delay_min = 1e20;
        step.delay_max = 0.5;
        assert_eq!(step.delay_range(), (0.5, MAX_DELAY_SECS));
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"[{"name": "Farm", "steps": [{"x": 5, "y": 6, "radius": 0, "delay_min": 0.0, "delay_max": 0.2}]}, {"name": "Empty"}]"#;
        let list: Vec<Config> = serde_json::from_str(json).unwrap();
        assert_eq!(list[0].steps[0].name, "Step");
        assert_eq!(list[0].steps[0].x, 5);
        assert!(list[1].steps.is_empty());
    }

    #[test]
    fn test_negative_radius_is_rejected_by_schema() {
        let json = r#"{"x": 1, "y": 1, "radius": -4, "delay_min": 0.0, "delay_max": 0.0}"#;
        assert!(serde_json::from_str::<Step>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_delay() {
        let step = Step { delay_min: -0.5, ..Step::default() };
        assert!(step.validate().is_err());
        assert!(Step::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_delay_above_limit() {
        let step = Step { delay_max: 60.5, ..Step::default() };
        assert!(step.validate().is_err());
        let edge = Step { delay_min: 60.0, delay_max: 60.0, ..Step::default() };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_summary_format() {
        let step = Step::default();
        assert_eq!(step.summary(0), "1 Step: x=100, y=100, r=20, delay=(0.5-1.5)");
    }
}
