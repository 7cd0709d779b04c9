//! Focus/return camera animation.
//!
//! ```text
//! Idle --focus_on--> Focusing --done--> Idle (held at focus)
//! Idle --clear_focus--> Returning --done--> Idle (free orbit)
//! ```
//!
//! Destinations are reached over wall-clock time with a cubic ease-in-out.
//! User orbit input is suspended for the length of every animation and comes
//! back afterwards unless the controls are externally locked. Until an
//! [`OrbitControls`] is attached the controller only records requests.

use atmos_animation::EasingFunction;
use glam::Vec3;
use tracing::debug;

use crate::orbit::OrbitControls;
use crate::pose::CameraPose;

/// Transition progress per second; a full transition takes 1.25 s.
pub const DEFAULT_ANIMATION_SPEED: f32 = 0.8;

/// Where the controller is in its animation cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraPhase {
    Idle,
    Focusing,
    Returning,
}

/// Programmatic animation state. `progress` only advances outside `Idle`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    pub phase: CameraPhase,
    pub progress: f32,
    pub start: CameraPose,
    pub target: CameraPose,
}

/// Emitted from [`CameraController::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraEvent {
    /// A transition reached its destination. Fired exactly once per transition.
    AnimationComplete(CameraPhase),
}

/// Owns the camera pose and drives it between free orbit and focus.
#[derive(Debug)]
pub struct CameraController {
    pose: CameraPose,
    controls: Option<OrbitControls>,
    animation: AnimationState,
    easing: EasingFunction,
    speed: f32,
    zoom_distance: f32,
    focus: Option<Vec3>,
    previous_view: Option<CameraPose>,
    controls_locked: bool,
    /// A focus change that arrived before controls were attached.
    deferred: bool,
}

impl CameraController {
    pub fn new(pose: CameraPose, zoom_distance: f32) -> Self {
        Self {
            pose,
            controls: None,
            animation: AnimationState {
                phase: CameraPhase::Idle,
                progress: 0.0,
                start: pose,
                target: pose,
            },
            easing: EasingFunction::EaseInOutCubic,
            speed: DEFAULT_ANIMATION_SPEED,
            zoom_distance,
            focus: None,
            previous_view: None,
            controls_locked: false,
            deferred: false,
        }
    }

    /// Override the progress-per-second rate.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.max(f32::EPSILON);
        self
    }

    /// Hand over the orbit control. Requests made before this are applied now.
    pub fn attach_controls(&mut self, mut controls: OrbitControls) {
        controls.target = self.pose.look_at;
        controls.enabled = !self.controls_locked && !self.is_animating();
        self.controls = Some(controls);

        if std::mem::take(&mut self.deferred) {
            match self.focus {
                Some(point) => self.start_focus(point),
                // The pose cannot have moved without controls.
                None => self.previous_view = None,
            }
        }
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.controls.as_mut()
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn phase(&self) -> CameraPhase {
        self.animation.phase
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn is_animating(&self) -> bool {
        self.animation.phase != CameraPhase::Idle
    }

    pub fn focus(&self) -> Option<Vec3> {
        self.focus
    }

    pub fn controls_locked(&self) -> bool {
        self.controls_locked
    }

    /// Change the height above the surface used for future focus requests.
    pub fn set_zoom_distance(&mut self, zoom_distance: f32) {
        self.zoom_distance = zoom_distance;
    }

    /// Pose that frames `point` (a point on the globe surface) from
    /// `zoom_distance` above it.
    pub fn destination_for(&self, point: Vec3) -> CameraPose {
        CameraPose {
            position: point + point.normalize_or_zero() * self.zoom_distance,
            look_at: point,
        }
    }

    /// Animate toward `point`. Re-requesting the current focus is a no-op.
    pub fn focus_on(&mut self, point: Vec3) {
        if self
            .focus
            .is_some_and(|current| current.distance_squared(point) < 1e-10)
        {
            return;
        }
        let from_free_orbit = self.focus.replace(point).is_none();
        if from_free_orbit && self.previous_view.is_none() {
            // Mid-return, the view being returned to is the one worth keeping.
            self.previous_view = Some(match self.animation.phase {
                CameraPhase::Returning => self.animation.target,
                _ => self.pose,
            });
        }
        if self.controls.is_none() {
            self.deferred = true;
            return;
        }
        self.start_focus(point);
    }

    /// Drop the focus and fly back to the view recorded before it, if any.
    pub fn clear_focus(&mut self) {
        if self.focus.take().is_none() {
            return;
        }
        if self.controls.is_none() {
            self.deferred = true;
            return;
        }
        self.start_return();
    }

    /// External request to suppress user control. Locking from free orbit
    /// remembers the view; unlocking without a focus flies back to it.
    pub fn set_controls_locked(&mut self, locked: bool) {
        if locked == self.controls_locked {
            return;
        }
        self.controls_locked = locked;
        if self.controls.is_none() {
            return;
        }

        if locked && self.focus.is_none() && self.previous_view.is_none() {
            self.previous_view = Some(self.pose);
        } else if !locked && self.focus.is_none() && self.previous_view.is_some() {
            self.start_return();
            return;
        }

        if self.animation.phase == CameraPhase::Idle
            && let Some(controls) = self.controls.as_mut()
        {
            controls.enabled = !locked;
        }
    }

    /// Advance one frame by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Option<CameraEvent> {
        let controls = self.controls.as_mut()?;

        if self.animation.phase == CameraPhase::Idle {
            controls.update(&mut self.pose);
            return None;
        }

        self.animation.progress += dt * self.speed;
        let mut event = None;
        if self.animation.progress >= 1.0 {
            self.animation.progress = 1.0;
            event = Some(CameraEvent::AnimationComplete(self.animation.phase));
            debug!(phase = ?self.animation.phase, "camera animation complete");
            self.animation.phase = CameraPhase::Idle;
            controls.enabled = !self.controls_locked;
        }

        let t = self.easing.apply(self.animation.progress);
        self.pose = self.animation.start.lerp(&self.animation.target, t);
        controls.target = self.pose.look_at;
        event
    }

    fn start_focus(&mut self, point: Vec3) {
        let destination = self.destination_for(point);
        self.begin(CameraPhase::Focusing, destination);
    }

    fn start_return(&mut self) {
        match self.previous_view.take() {
            Some(view) => self.begin(CameraPhase::Returning, view),
            None => {
                let idle = self.animation.phase == CameraPhase::Idle;
                let locked = self.controls_locked;
                if let Some(controls) = self.controls.as_mut()
                    && idle
                {
                    controls.enabled = !locked;
                }
            }
        }
    }

    fn begin(&mut self, phase: CameraPhase, target: CameraPose) {
        debug!(?phase, target = ?target.position, "camera animation start");
        self.animation = AnimationState {
            phase,
            progress: 0.0,
            start: self.pose,
            target,
        };
        if let Some(controls) = self.controls.as_mut() {
            controls.enabled = false;
            controls.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn attached() -> CameraController {
        let mut c = CameraController::new(CameraPose::default(), 0.5);
        c.attach_controls(OrbitControls::new(Vec3::ZERO, 2.1, 3.8));
        c
    }

    /// Run until the current animation completes; returns how many
    /// completion events were seen.
    fn run_for(c: &mut CameraController, seconds: f32) -> usize {
        let steps = (seconds / DT).ceil() as usize;
        (0..steps).filter(|_| c.update(DT).is_some()).count()
    }

    fn surface_point() -> Vec3 {
        // Any unit-sphere point will do.
        Vec3::new(0.3, 0.7, -0.648).normalize()
    }

    #[test]
    fn test_focus_reaches_destination() {
        let mut c = attached();
        c.focus_on(surface_point());
        assert_eq!(c.phase(), CameraPhase::Focusing);
        assert!(!c.controls().unwrap().enabled, "orbit suspended while animating");

        let events = run_for(&mut c, 2.0);
        assert_eq!(events, 1, "completion fires exactly once");
        assert_eq!(c.phase(), CameraPhase::Idle);

        let expected = c.destination_for(surface_point());
        assert!((c.pose().position - expected.position).length() < 1e-5);
        assert!((c.pose().look_at - surface_point()).length() < 1e-5);
        assert!(
            (expected.position.length() - 1.5).abs() < 1e-5,
            "destination sits zoom_distance above the surface"
        );
        assert!(c.controls().unwrap().enabled, "orbit restored when unlocked");
    }

    #[test]
    fn test_clear_focus_returns_to_recorded_view() {
        let mut c = attached();
        let before = *c.pose();
        c.focus_on(surface_point());
        run_for(&mut c, 2.0);

        c.clear_focus();
        assert_eq!(c.phase(), CameraPhase::Returning);
        let events = run_for(&mut c, 2.0);
        assert_eq!(events, 1);
        assert!((c.pose().position - before.position).length() < 1e-5);
        assert!((c.pose().look_at - before.look_at).length() < 1e-5);
    }

    #[test]
    fn test_transition_takes_wall_clock_time() {
        let mut c = attached();
        c.focus_on(surface_point());
        run_for(&mut c, 1.0);
        assert_eq!(c.phase(), CameraPhase::Focusing, "1.25 s transition still running at 1 s");
        assert!((c.animation().progress - 0.8).abs() < 0.02);

        let mut coarse = attached();
        coarse.focus_on(surface_point());
        assert!(coarse.update(0.5).is_none());
        assert!(coarse.update(0.5).is_none());
        assert!(coarse.update(0.5).is_some(), "same duration at a lower frame rate");
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut c = attached();
        c.focus_on(surface_point());
        let mut last = -1.0;
        for _ in 0..100 {
            c.update(DT);
            let p = c.animation().progress;
            assert!(p >= last && p <= 1.0, "progress {p} after {last}");
            last = p;
        }
    }

    #[test]
    fn test_no_controls_is_noop_until_attached() {
        let mut c = CameraController::new(CameraPose::default(), 0.5);
        c.focus_on(surface_point());
        assert!(c.update(DT).is_none());
        assert_eq!(c.phase(), CameraPhase::Idle);
        assert_eq!(*c.pose(), CameraPose::default(), "pose untouched without controls");

        c.attach_controls(OrbitControls::new(Vec3::ZERO, 2.1, 3.8));
        assert_eq!(c.phase(), CameraPhase::Focusing, "deferred focus applied on attach");
    }

    #[test]
    fn test_locked_controls_stay_disabled_after_animation() {
        let mut c = attached();
        c.set_controls_locked(true);
        assert!(!c.controls().unwrap().enabled);
        c.focus_on(surface_point());
        run_for(&mut c, 2.0);
        assert!(!c.controls().unwrap().enabled, "external lock wins");
    }

    #[test]
    fn test_unlock_restores_view_recorded_at_lock() {
        let mut c = attached();
        let before = *c.pose();
        c.set_controls_locked(true);
        c.focus_on(surface_point());
        run_for(&mut c, 2.0);

        c.clear_focus();
        c.set_controls_locked(false);
        run_for(&mut c, 2.0);
        assert!((c.pose().position - before.position).length() < 1e-5);
        assert!(c.controls().unwrap().enabled);
    }

    #[test]
    fn test_refocus_keeps_original_view() {
        let mut c = attached();
        let before = *c.pose();
        c.focus_on(surface_point());
        run_for(&mut c, 2.0);
        c.focus_on(Vec3::new(-1.0, 0.0, 0.0));
        run_for(&mut c, 2.0);
        c.clear_focus();
        run_for(&mut c, 2.0);
        assert!(
            (c.pose().position - before.position).length() < 1e-5,
            "return goes to the free-orbit view, not the first focus"
        );
    }

    #[test]
    fn test_same_focus_twice_is_ignored() {
        let mut c = attached();
        c.focus_on(surface_point());
        run_for(&mut c, 2.0);
        c.focus_on(surface_point());
        assert_eq!(c.phase(), CameraPhase::Idle);
    }
}
