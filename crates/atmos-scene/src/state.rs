//! Per-frame orchestration of the globe scene.

use atmos_assets::TextureAllocator;
use atmos_camera::{CameraController, CameraEvent, CameraPhase, CameraPose, OrbitControls};
use atmos_geo::{GeoPoint, GlobeDimensions};
use atmos_lighting::{
    DayNight, DynamicLighting, LIGHTNING_COLOR, LIGHTNING_POSITION, LIGHTNING_RANGE,
    LightingUniform, LightningFlash, PointLight, compute_day_night, lighting_target, srgb_hex,
};
use atmos_particles::{IntensityTier, RainField, SNOW_PARTICLE_COUNT, SnowField};
use glam::{Mat4, Vec3};
use tracing::{debug, info};

use crate::clouds::StormClouds;
use crate::debounce::EffectDebouncer;
use crate::globe::GlobeSurface;
use crate::instance::MeshInstance;
use crate::marker::LocationMarker;
use crate::stars::Starfield;
use crate::weather::WeatherCondition;

/// Everything the surrounding application tells the scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneInputs {
    /// Location the camera should frame, if any.
    pub focus: Option<GeoPoint>,
    /// Where the weather applies when nothing is focused.
    pub weather_location: Option<GeoPoint>,
    pub weather: Option<WeatherCondition>,
    /// Epoch milliseconds.
    pub sunrise_ms: Option<i64>,
    pub sunset_ms: Option<i64>,
    pub controls_locked: bool,
}

/// Fixed tuning for a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneSettings {
    pub dimensions: GlobeDimensions,
    /// Radians per second while nothing is focused.
    pub auto_rotate_speed: f32,
    pub camera_position: Vec3,
    pub animation_speed: f32,
    pub orbit_damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub star_seed: u32,
    pub lightning_seed: u32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            dimensions: GlobeDimensions::default(),
            auto_rotate_speed: 0.1,
            camera_position: Vec3::new(0.0, 0.0, 5.0),
            animation_speed: atmos_camera::DEFAULT_ANIMATION_SPEED,
            orbit_damping: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 0.5,
            star_seed: 0x5eed,
            lightning_seed: 0x1a7,
        }
    }
}

type CompletionCallback = Box<dyn FnMut(CameraPhase)>;

/// The whole scene. `T` is the renderer's texture handle.
pub struct SceneState<T> {
    settings: SceneSettings,
    dimensions: GlobeDimensions,
    inputs: SceneInputs,
    applied_focus: Option<GeoPoint>,
    globe: GlobeSurface<T>,
    camera: CameraController,
    lighting: DynamicLighting,
    day_night: DayNight,
    debouncer: EffectDebouncer,
    stars: Starfield,
    marker: Option<LocationMarker>,
    rain: Option<RainField>,
    snow: Option<SnowField>,
    lightning: Option<LightningFlash>,
    clouds: Option<StormClouds>,
    lightning_mounts: u32,
    elapsed: f32,
    on_animation_complete: Option<CompletionCallback>,
}

impl<T> SceneState<T> {
    pub fn new(settings: SceneSettings) -> Self {
        let dimensions = settings.dimensions;
        let pose = CameraPose::new(settings.camera_position, Vec3::ZERO);
        let mut camera = CameraController::new(pose, dimensions.zoom_distance)
            .with_speed(settings.animation_speed);
        let mut controls = OrbitControls::new(Vec3::ZERO, dimensions.orbit_min, dimensions.orbit_max);
        controls.damping = settings.orbit_damping;
        controls.rotate_speed = settings.rotate_speed;
        controls.zoom_speed = settings.zoom_speed;
        camera.attach_controls(controls);

        Self {
            stars: Starfield::new(settings.star_seed),
            globe: GlobeSurface::new(dimensions.radius),
            settings,
            dimensions,
            inputs: SceneInputs::default(),
            applied_focus: None,
            camera,
            lighting: DynamicLighting::new(),
            day_night: DayNight::default(),
            debouncer: EffectDebouncer::new(),
            marker: None,
            rain: None,
            snow: None,
            lightning: None,
            clouds: None,
            lightning_mounts: 0,
            elapsed: 0.0,
            on_animation_complete: None,
        }
    }

    /// Replace the application inputs. Takes effect on the next update.
    pub fn set_inputs(&mut self, inputs: SceneInputs) {
        self.inputs = inputs;
    }

    pub fn inputs(&self) -> &SceneInputs {
        &self.inputs
    }

    /// Called once each time a camera focus or return transition finishes.
    pub fn set_on_camera_animation_complete(&mut self, callback: impl FnMut(CameraPhase) + 'static) {
        self.on_animation_complete = Some(Box::new(callback));
    }

    /// Apply new globe dimensions, e.g. after a viewport resize.
    pub fn set_dimensions(&mut self, dimensions: GlobeDimensions) {
        if dimensions == self.dimensions {
            return;
        }
        info!(radius = dimensions.radius, "globe dimensions changed");
        self.dimensions = dimensions;
        self.globe.set_radius(dimensions.radius);
        self.camera.set_zoom_distance(dimensions.zoom_distance);
        if let Some(controls) = self.camera.controls_mut() {
            controls.min_distance = dimensions.orbit_min;
            controls.max_distance = dimensions.orbit_max;
        }
        if let Some(marker) = self.marker.as_mut() {
            *marker = LocationMarker::new(marker.location(), dimensions.radius);
        }
        self.clouds = None;
        // Re-frame the focused point at its new height.
        if self.applied_focus.take().is_some() {
            self.camera.clear_focus();
        }
    }

    pub fn dimensions(&self) -> GlobeDimensions {
        self.dimensions
    }

    /// Queue a drag on the orbit control.
    pub fn orbit_rotate(&mut self, dx: f32, dy: f32) {
        if let Some(controls) = self.camera.controls_mut() {
            controls.rotate(dx, dy);
        }
    }

    /// Queue a scroll on the orbit control.
    pub fn orbit_zoom(&mut self, lines: f32) {
        if let Some(controls) = self.camera.controls_mut() {
            controls.zoom(lines);
        }
    }

    /// Advance every system by `dt` seconds at wall-clock time `now_ms`.
    pub fn update(&mut self, dt: f32, now_ms: i64) -> Option<CameraEvent> {
        let dt = dt.max(0.0);
        self.elapsed += dt;

        // Derived targets first, so every system below sees the same inputs.
        self.debouncer.update(self.inputs.weather);
        let displayed = self.displayed_weather();
        let opacity = self.debouncer.opacity();
        self.day_night = compute_day_night(self.inputs.sunrise_ms, self.inputs.sunset_ms, now_ms);
        let target = lighting_target(
            self.day_night.progress,
            self.day_night.is_night,
            displayed.dimming(),
        );
        self.lighting.set_target(target);
        self.stars.set_opacity(target.stars_opacity);

        self.sync_focus();
        self.camera.set_controls_locked(self.inputs.controls_locked);

        if self.inputs.focus.is_none() {
            self.globe.rotate(dt * self.settings.auto_rotate_speed);
        }

        self.mount_effects(displayed, opacity);

        let event = self.camera.update(dt);
        if let (Some(CameraEvent::AnimationComplete(phase)), Some(callback)) =
            (event, self.on_animation_complete.as_mut())
        {
            callback(phase);
        }

        self.lighting.tick();

        let camera_local = self
            .globe
            .model_matrix()
            .inverse()
            .transform_point3(self.camera.pose().position);
        let anchor = self.effect_anchor();
        if let Some(rain) = self.rain.as_mut() {
            rain.update(dt, camera_local, anchor);
        }
        if let Some(snow) = self.snow.as_mut() {
            snow.update(dt, anchor.map(|a| camera_local.distance(a)));
        }
        if let Some(lightning) = self.lightning.as_mut() {
            lightning.set_power(opacity);
            lightning.update(dt);
        }
        if let Some(clouds) = self.clouds.as_mut() {
            clouds.update(dt, opacity);
        }
        if let Some(marker) = self.marker.as_mut() {
            marker.update(self.elapsed);
        }
        event
    }

    fn displayed_weather(&self) -> WeatherCondition {
        self.debouncer.displayed().unwrap_or(WeatherCondition::Other)
    }

    fn effect_location(&self) -> Option<GeoPoint> {
        self.inputs.focus.or(self.inputs.weather_location)
    }

    /// Globe-local surface point the weather effects centre on.
    fn effect_anchor(&self) -> Option<Vec3> {
        self.effect_location()
            .map(|location| location.to_surface(self.dimensions.radius))
    }

    fn sync_focus(&mut self) {
        if self.inputs.focus == self.applied_focus {
            return;
        }
        self.applied_focus = self.inputs.focus;
        let radius = self.dimensions.radius;
        match self.inputs.focus {
            Some(location) => {
                let world = self.globe.orientation() * location.to_surface(radius);
                info!(%location, "focusing location");
                self.camera.focus_on(world);
                self.marker = Some(LocationMarker::new(location, radius));
            }
            None => {
                info!("focus cleared");
                self.camera.clear_focus();
                self.marker = None;
            }
        }
    }

    fn mount_effects(&mut self, displayed: WeatherCondition, opacity: f32) {
        let visible = opacity > 0.0;

        let rain = displayed.rain_config();
        if rain.active && visible {
            let stale = self
                .rain
                .as_ref()
                .is_none_or(|r| r.capacity() != rain.particle_count || r.tier() != rain.tier);
            if stale {
                debug!(count = rain.particle_count, tier = %rain.tier, "mounting rain");
                self.rain = Some(RainField::new(rain.particle_count, rain.tier));
            }
        } else if self.rain.take().is_some() {
            debug!("rain unmounted");
        }

        if displayed == WeatherCondition::Snow && visible {
            if self.snow.is_none() {
                debug!("mounting snow");
                self.snow = Some(SnowField::new(SNOW_PARTICLE_COUNT, IntensityTier::Moderate));
            }
        } else if self.snow.take().is_some() {
            debug!("snow unmounted");
        }

        let storm = displayed.is_thunderstorm() && visible;
        if storm {
            if self.lightning.is_none() {
                let seed = self.settings.lightning_seed.wrapping_add(self.lightning_mounts);
                self.lightning_mounts = self.lightning_mounts.wrapping_add(1);
                self.lightning = Some(LightningFlash::new(seed));
            }
        } else {
            self.lightning = None;
        }

        match self.effect_location().filter(|_| storm) {
            Some(location) => {
                if self.clouds.as_ref().is_none_or(|c| c.location() != location) {
                    self.clouds = Some(StormClouds::new(location, self.dimensions.radius));
                }
            }
            None => self.clouds = None,
        }
    }

    /// Abort texture loading and release every GPU resource the scene owns.
    pub fn unmount<A>(&mut self, allocator: &mut A)
    where
        A: TextureAllocator<Texture = T>,
    {
        self.globe.unmount(allocator);
        self.rain = None;
        self.snow = None;
        self.lightning = None;
        self.clouds = None;
        self.marker = None;
    }

    pub fn globe(&self) -> &GlobeSurface<T> {
        &self.globe
    }

    pub fn globe_mut(&mut self) -> &mut GlobeSurface<T> {
        &mut self.globe
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn lighting(&self) -> &DynamicLighting {
        &self.lighting
    }

    pub fn day_night(&self) -> DayNight {
        self.day_night
    }

    pub fn stars(&self) -> &Starfield {
        &self.stars
    }

    pub fn marker(&self) -> Option<&LocationMarker> {
        self.marker.as_ref()
    }

    pub fn clouds(&self) -> Option<&StormClouds> {
        self.clouds.as_ref()
    }

    pub fn rain(&self) -> Option<&RainField> {
        self.rain.as_ref()
    }

    pub fn snow(&self) -> Option<&SnowField> {
        self.snow.as_ref()
    }

    pub fn lightning(&self) -> Option<&LightningFlash> {
        self.lightning.as_ref()
    }

    /// Condition whose effects are on screen.
    pub fn displayed_condition(&self) -> Option<WeatherCondition> {
        self.debouncer.displayed()
    }

    pub fn effect_opacity(&self) -> f32 {
        self.debouncer.opacity()
    }

    pub fn rain_opacity(&self) -> f32 {
        self.displayed_weather().rain_config().opacity_factor * self.effect_opacity()
    }

    pub fn snow_opacity(&self) -> f32 {
        self.displayed_weather().snow_opacity_target() * self.effect_opacity()
    }

    pub fn flash_overlay_opacity(&self) -> f32 {
        self.lightning.as_ref().map_or(0.0, |l| l.overlay_opacity())
    }

    /// Marker and cloud parts in world space.
    pub fn mesh_instances(&self, out: &mut Vec<MeshInstance>) {
        let globe = self.globe.model_matrix();
        if let Some(marker) = &self.marker {
            marker.instances(globe, out);
        }
        if let Some(clouds) = &self.clouds {
            clouds.instances(globe, out);
        }
    }

    /// Globe-local to world transform for effects that ride with the globe.
    pub fn globe_matrix(&self) -> Mat4 {
        self.globe.model_matrix()
    }

    pub fn point_lights(&self) -> Vec<PointLight> {
        let globe = self.globe.model_matrix();
        let mut lights = Vec::with_capacity(2);
        if let Some(marker) = &self.marker {
            lights.push(marker.light(globe));
        }
        if let Some(lightning) = &self.lightning {
            lights.push(PointLight {
                position: globe.transform_point3(LIGHTNING_POSITION),
                color: srgb_hex(LIGHTNING_COLOR),
                intensity: lightning.intensity(),
                range: LIGHTNING_RANGE,
            });
        }
        lights
    }

    pub fn lighting_uniform(&self) -> LightingUniform {
        LightingUniform::new(
            self.lighting.ambient(),
            self.lighting.directional(),
            &self.point_lights(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;
    const NOON: i64 = 1_700_000_000_000;

    fn scene() -> SceneState<u32> {
        SceneState::new(SceneSettings::default())
    }

    fn inputs(weather: Option<WeatherCondition>) -> SceneInputs {
        SceneInputs {
            weather,
            weather_location: Some(GeoPoint::new(40.7, -74.0)),
            ..SceneInputs::default()
        }
    }

    fn run(scene: &mut SceneState<u32>, seconds: f32) {
        for _ in 0..(seconds / DT) as usize {
            scene.update(DT, NOON);
        }
    }

    #[test]
    fn test_rain_to_snow_never_overlaps() {
        let mut s = scene();
        s.set_inputs(inputs(Some(WeatherCondition::Rain)));
        run(&mut s, 10.0);
        assert!(s.rain().is_some());
        assert!(s.effect_opacity() > 0.99);

        s.set_inputs(inputs(Some(WeatherCondition::Snow)));
        let mut lowest = f32::MAX;
        let mut snow_seen = false;
        for _ in 0..1200 {
            s.update(DT, NOON);
            let rain_visible = s.rain().is_some() && s.rain_opacity() > 0.0;
            let snow_visible = s.snow().is_some() && s.snow_opacity() > 0.0;
            assert!(!(rain_visible && snow_visible), "rain and snow drawn together");
            if !snow_seen {
                lowest = lowest.min(s.effect_opacity());
            }
            snow_seen |= snow_visible;
        }
        assert!(snow_seen);
        assert!(s.rain().is_none(), "rain unmounted after the swap");
        assert!(lowest < 0.01, "opacity dipped to {lowest} before snow mounted");
    }

    #[test]
    fn test_thunderstorm_mounts_storm_systems() {
        let mut s = scene();
        s.set_inputs(inputs(Some(WeatherCondition::Thunderstorm)));
        run(&mut s, 5.0);
        assert_eq!(s.rain().map(|r| r.tier()), Some(IntensityTier::Heavy));
        assert_eq!(s.rain().map(|r| r.capacity()), Some(1200));
        assert!(s.lightning().is_some());
        assert!(s.clouds().is_some(), "clouds need an anchor, which exists");
        assert!((s.lightning().map_or(0.0, |l| l.power()) - s.effect_opacity()).abs() < 1e-6);

        let mut parts = Vec::new();
        s.mesh_instances(&mut parts);
        assert_eq!(parts.len(), crate::PUFF_COUNT);
    }

    #[test]
    fn test_storm_without_location_has_no_clouds() {
        let mut s = scene();
        s.set_inputs(SceneInputs {
            weather: Some(WeatherCondition::Thunderstorm),
            ..SceneInputs::default()
        });
        run(&mut s, 2.0);
        assert!(s.lightning().is_some());
        assert!(s.clouds().is_none());
    }

    #[test]
    fn test_clear_weather_mounts_nothing() {
        let mut s = scene();
        s.set_inputs(inputs(Some(WeatherCondition::Clear)));
        run(&mut s, 3.0);
        assert!(s.rain().is_none() && s.snow().is_none() && s.lightning().is_none());
        assert_eq!(s.displayed_condition(), Some(WeatherCondition::Clear));
    }

    #[test]
    fn test_storm_darkens_lighting() {
        let mut clear = scene();
        clear.set_inputs(inputs(Some(WeatherCondition::Clear)));
        let mut storm = scene();
        storm.set_inputs(inputs(Some(WeatherCondition::Thunderstorm)));
        run(&mut clear, 5.0);
        run(&mut storm, 5.0);
        assert!(storm.lighting().ambient() < clear.lighting().ambient());
        assert!(storm.stars().config().count < clear.stars().config().count);
    }

    #[test]
    fn test_focus_stops_rotation_and_frames_location() {
        let mut s = scene();
        run(&mut s, 2.0);
        let spun = s.globe().rotation();
        assert!(spun > 0.19, "auto-rotation at 0.1 rad/s");

        let location = GeoPoint::new(35.68, 139.69);
        s.set_inputs(SceneInputs { focus: Some(location), ..SceneInputs::default() });
        run(&mut s, 3.0);
        assert_eq!(s.globe().rotation(), spun, "rotation frozen while focused");
        assert_eq!(s.camera().phase(), CameraPhase::Idle);

        let world = s.globe().orientation() * location.to_surface(1.0);
        assert!((s.camera().pose().look_at - world).length() < 1e-4);
        assert!(s.marker().is_some());
        assert_eq!(s.point_lights().len(), 1, "marker glow");
    }

    #[test]
    fn test_completion_callback_fires_once_per_transition() {
        let mut s = scene();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        s.set_on_camera_animation_complete(move |_| counter.set(counter.get() + 1));

        s.set_inputs(SceneInputs { focus: Some(GeoPoint::new(0.0, 0.0)), ..SceneInputs::default() });
        run(&mut s, 3.0);
        assert_eq!(fired.get(), 1);

        s.set_inputs(SceneInputs::default());
        run(&mut s, 3.0);
        assert_eq!(fired.get(), 2, "return transition");
        assert!(s.marker().is_none());
    }

    #[test]
    fn test_night_shows_more_stars() {
        let mut s = scene();
        let sunrise = NOON - 6 * 3_600_000;
        let sunset = NOON + 6 * 3_600_000;
        s.set_inputs(SceneInputs {
            sunrise_ms: Some(sunrise),
            sunset_ms: Some(sunset),
            ..SceneInputs::default()
        });
        s.update(DT, sunset + 3_600_000);
        assert!(s.day_night().is_night);
        assert_eq!(s.stars().config().count, 6000);

        s.update(DT, NOON);
        assert!(!s.day_night().is_night);
        assert!(s.stars().config().count < 6000);
    }

    #[test]
    fn test_resize_updates_orbit_limits() {
        let mut s = scene();
        s.set_dimensions(GlobeDimensions::for_viewport_width(1920.0));
        let controls = s.camera().controls().expect("controls attached");
        assert_eq!(controls.max_distance, 6.2);
        assert_eq!(s.globe().radius(), 1.65);
    }

    #[test]
    fn test_unmount_drops_effects() {
        struct NoGpu;
        impl TextureAllocator for NoGpu {
            type Texture = u32;
            fn capabilities(&self) -> atmos_assets::DeviceCapabilities {
                atmos_assets::DeviceCapabilities::default()
            }
            fn create(&mut self, _: &atmos_assets::DecodedImage) -> Result<u32, atmos_assets::LoadError> {
                Ok(1)
            }
            fn release(&mut self, _: u32) {}
        }

        let mut s = scene();
        s.set_inputs(inputs(Some(WeatherCondition::Thunderstorm)));
        run(&mut s, 2.0);
        s.unmount(&mut NoGpu);
        assert!(s.rain().is_none() && s.lightning().is_none() && s.clouds().is_none());
    }
}
