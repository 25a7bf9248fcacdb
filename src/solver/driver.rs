//! Wall-clock driving loop
//!
//! An interactive front end ticks at display rate and asks for a simulated
//! span proportional to the elapsed wall time. [`FrameDriver`] performs that
//! conversion, caps the work per frame and keeps running totals.

use serde::{Deserialize, Serialize};

use crate::solver::engine::MultiSpeciesLamm;

/// Default step budget per frame
pub const DEFAULT_MAX_STEPS_PER_FRAME: usize = 5000;

/// Simulated seconds per wall-clock second
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TimeScale {
    X1,
    X10,
    X100,
    #[default]
    X1000,
    X10000,
}

impl TimeScale {
    /// Every selectable scale, slowest first
    pub const ALL: [TimeScale; 5] = [
        TimeScale::X1,
        TimeScale::X10,
        TimeScale::X100,
        TimeScale::X1000,
        TimeScale::X10000,
    ];

    pub fn factor(self) -> f64 {
        f64::from(u32::from(self))
    }
}

impl From<TimeScale> for u32 {
    fn from(scale: TimeScale) -> Self {
        match scale {
            TimeScale::X1 => 1,
            TimeScale::X10 => 10,
            TimeScale::X100 => 100,
            TimeScale::X1000 => 1000,
            TimeScale::X10000 => 10000,
        }
    }
}

impl TryFrom<u32> for TimeScale {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|s| u32::from(*s) == value)
            .ok_or_else(|| format!("unsupported time scale ×{value}, expected one of 1, 10, 100, 1000, 10000"))
    }
}

/// Outcome of one [`FrameDriver::advance_frame`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Simulated span asked for **\[s\]**
    pub requested: f64,

    /// Simulated span covered **\[s\]**
    pub advanced: f64,

    pub steps: usize,

    /// The step budget ran out before `requested` was reached
    pub saturated: bool,
}

/// Converts wall-clock frames into engine advances
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDriver {
    pub time_scale: TimeScale,
    pub max_steps_per_frame: usize,
    simulated_time: f64,
    total_steps: usize,
    frames: usize,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(TimeScale::default())
    }
}

impl FrameDriver {
    pub fn new(time_scale: TimeScale) -> Self {
        Self {
            time_scale,
            max_steps_per_frame: DEFAULT_MAX_STEPS_PER_FRAME,
            simulated_time: 0.0,
            total_steps: 0,
            frames: 0,
        }
    }

    /// Builder pattern: set the per-frame step budget
    pub fn with_max_steps(mut self, max_steps_per_frame: usize) -> Self {
        self.max_steps_per_frame = max_steps_per_frame;
        self
    }

    /// Advances `engine` by `wall_dt · time_scale` simulated seconds
    ///
    /// Non-finite or negative `wall_dt` requests nothing. When the budget is
    /// exhausted first, the remainder of the frame is dropped (not carried
    /// over) and the report is flagged `saturated`.
    pub fn advance_frame(&mut self, engine: &mut MultiSpeciesLamm, wall_dt: f64) -> FrameReport {
        let requested = if wall_dt.is_finite() && wall_dt > 0.0 {
            wall_dt * self.time_scale.factor()
        } else {
            0.0
        };

        let result = engine.advance_by(requested, self.max_steps_per_frame);
        let saturated = result.advanced < requested;
        if saturated {
            log::debug!(
                "frame {} saturated: advanced {:.3e} of {:.3e} s in {} steps",
                self.frames,
                result.advanced,
                requested,
                result.steps
            );
        }

        self.simulated_time += result.advanced;
        self.total_steps += result.steps;
        self.frames += 1;

        FrameReport {
            requested,
            advanced: result.advanced,
            steps: result.steps,
            saturated,
        }
    }

    /// Simulated time accumulated over every frame **\[s\]**
    pub fn simulated_time(&self) -> f64 {
        self.simulated_time
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Zeroes the running totals, keeps scale and budget
    pub fn reset(&mut self) {
        self.simulated_time = 0.0;
        self.total_steps = 0;
        self.frames = 0;
    }
}
