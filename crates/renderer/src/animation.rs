use std::f32::consts::TAU;

use crate::error::PipelineError;
use crate::transform::Mat4;

/// Per-frame animation constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParams {
    /// Radians added to the rotation each frame; must lie in `[0, 2π)`.
    pub angular_increment: f32,
    /// Distance the offset moves each frame.
    pub linear_increment: f32,
    /// Offset magnitude at which the direction flips.
    pub max_offset: f32,
    /// Scale applied after the rotation in the transform chain.
    pub scale: [f32; 3],
    /// Translate by the oscillating offset between rotation and scale.
    pub apply_offset: bool,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            angular_increment: 0.01,
            linear_increment: 0.00058,
            max_offset: 0.7,
            scale: [0.4, 0.4, 0.0],
            apply_offset: false,
        }
    }
}

impl AnimationParams {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.angular_increment.is_finite() || !(0.0..TAU).contains(&self.angular_increment) {
            return Err(PipelineError::config(format!(
                "angular increment {} must lie in [0, 2π)",
                self.angular_increment
            )));
        }
        if !self.linear_increment.is_finite() || self.linear_increment <= 0.0 {
            return Err(PipelineError::config(format!(
                "linear increment {} must be positive",
                self.linear_increment
            )));
        }
        if !self.max_offset.is_finite() || self.max_offset <= 0.0 {
            return Err(PipelineError::config(format!(
                "max offset {} must be positive",
                self.max_offset
            )));
        }
        if self.scale.iter().any(|component| !component.is_finite()) {
            return Err(PipelineError::config("scale components must be finite"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

impl Direction {
    fn flipped(self) -> Self {
        match self {
            Direction::Increasing => Direction::Decreasing,
            Direction::Decreasing => Direction::Increasing,
        }
    }
}

/// Time-varying transform inputs, advanced once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    angle: f32,
    offset: f32,
    direction: Direction,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            angle: 0.0,
            offset: 0.0,
            direction: Direction::Increasing,
        }
    }
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotation in radians, always within `[0, 2π)`.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Steps the rotation and the oscillating offset by one frame.
    ///
    /// The angle wraps by subtracting a full turn. The direction flips on the
    /// step that carries `|offset|` to or past `max_offset`.
    pub fn advance(&mut self, params: &AnimationParams) {
        self.angle += params.angular_increment;
        if self.angle >= TAU {
            self.angle -= TAU;
        }

        self.offset += match self.direction {
            Direction::Increasing => params.linear_increment,
            Direction::Decreasing => -params.linear_increment,
        };
        if self.offset.abs() >= params.max_offset {
            self.direction = self.direction.flipped();
        }
    }

    /// Model transform for the current state: rotate, then scale.
    pub fn transform(&self, params: &AnimationParams) -> Mat4 {
        let rotated = Mat4::IDENTITY.rotate_z(self.angle);
        let placed = if params.apply_offset {
            rotated.translate([self.offset, 0.0, 0.0])
        } else {
            rotated
        };
        placed.scale(params.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(angular: f32, linear: f32, max_offset: f32) -> AnimationParams {
        AnimationParams {
            angular_increment: angular,
            linear_increment: linear,
            max_offset,
            ..AnimationParams::default()
        }
    }

    #[test]
    fn angle_wraps_after_a_full_turn() {
        let k = 8;
        let p = params(TAU / k as f32, 0.001, 0.7);
        let mut state = AnimationState::new();
        state.advance(&p);
        let after_one = state.angle();
        for _ in 0..k {
            state.advance(&p);
            assert!((0.0..TAU).contains(&state.angle()));
        }
        assert!((state.angle() - after_one).abs() < 1e-5);
    }

    #[test]
    fn angle_subtracts_rather_than_clamps() {
        let p = params(3.0, 0.001, 0.7);
        let mut state = AnimationState::new();
        state.advance(&p);
        state.advance(&p);
        state.advance(&p);
        assert!((state.angle() - (9.0 - TAU)).abs() < 1e-5);
    }

    #[test]
    fn offset_flips_on_reaching_the_bound() {
        let p = params(0.0, 0.25, 1.0);
        let mut state = AnimationState::new();
        let mut history = Vec::new();
        for _ in 0..14 {
            state.advance(&p);
            history.push((state.offset(), state.direction()));
        }

        // 0.25, 0.5, 0.75 rising, then 1.0 flips
        for (offset, direction) in &history[..3] {
            assert!(*offset < 1.0);
            assert_eq!(*direction, Direction::Increasing);
        }
        assert_eq!(history[3], (1.0, Direction::Decreasing));

        // strictly decreasing down to -1.0, where it flips back
        for pair in history[3..12].windows(2) {
            assert!(pair[1].0 < pair[0].0);
        }
        for (_, direction) in &history[4..11] {
            assert_eq!(*direction, Direction::Decreasing);
        }
        assert_eq!(history[11], (-1.0, Direction::Increasing));
        assert_eq!(history[12].0, -0.75);
    }

    #[test]
    fn offset_never_exceeds_bound_by_more_than_one_step() {
        let p = params(0.0, 0.00058, 0.7);
        let mut state = AnimationState::new();
        for _ in 0..10_000 {
            state.advance(&p);
            assert!(state.offset().abs() < p.max_offset + p.linear_increment + 1e-6);
        }
    }

    #[test]
    fn initial_transform_is_pure_scale() {
        let p = AnimationParams::default();
        let transform = AnimationState::new().transform(&p);
        assert!(transform.abs_diff_eq(&Mat4::IDENTITY.rotate_z(0.0).scale(p.scale), 1e-7));
        assert!(transform.abs_diff_eq(&Mat4::from_scale([0.4, 0.4, 0.0]), 1e-7));
    }

    #[test]
    fn offset_translation_is_opt_in() {
        let mut p = params(0.0, 0.5, 1.0);
        let mut state = AnimationState::new();
        state.advance(&p);
        assert_eq!(state.transform(&p).cols[3], [0.0, 0.0, 0.0, 1.0]);

        p.apply_offset = true;
        assert_eq!(state.transform(&p).cols[3], [0.5, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn rejects_out_of_range_params() {
        assert!(params(TAU, 0.1, 0.7).validate().is_err());
        assert!(params(-0.1, 0.1, 0.7).validate().is_err());
        assert!(params(0.1, 0.0, 0.7).validate().is_err());
        assert!(params(0.1, 0.1, f32::NAN).validate().is_err());
        assert!(AnimationParams::default().validate().is_ok());
    }
}
