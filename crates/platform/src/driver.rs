//! Per-frame driver state: camera, its path and the frame counter.
//!
//! The event loop asks for the current transforms, renders, and only then
//! calls [`FrameDriver::finish_frame`], so the camera moves exactly once per
//! frame that actually reached the screen.

use std::time::{Duration, Instant};

use corelib::{
    camera::{CameraPath, CameraState},
    frame::{FrameTransformGenerator, FrameTransforms, Viewport},
};

#[derive(Clone, Copy, Debug)]
pub struct FrameDriver {
    pub camera: CameraState,
    pub path: CameraPath,
    pub generator: FrameTransformGenerator,
    frame: u64,
}

impl FrameDriver {
    pub fn new(camera: CameraState, path: CameraPath, generator: FrameTransformGenerator) -> Self {
        Self {
            camera,
            path,
            generator,
            frame: 0,
        }
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Matrices for the frame about to be drawn. Does not mutate anything.
    pub fn transforms(&self, viewport: Viewport) -> FrameTransforms {
        self.generator.generate(&self.camera, viewport, self.frame)
    }

    /// Advance the camera after a frame was presented.
    pub fn finish_frame(&mut self) {
        self.path.advance(&mut self.camera);
        self.frame += 1;
    }
}

/// Frames-per-second counter reporting once per interval.
#[derive(Debug)]
pub struct FpsCounter {
    interval: Duration,
    since: Instant,
    frames: u32,
}

impl FpsCounter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            since: Instant::now(),
            frames: 0,
        }
    }

    /// Count one frame at `now`; returns the rate when an interval elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.since);
        if elapsed < self.interval {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.since = now;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Vec3, camera::Axis, frame::RotationMode};

    fn driver() -> FrameDriver {
        FrameDriver::new(
            CameraState::new(Vec3::new(0.0, 0.0, 5.0)),
            CameraPath {
                axis: Axis::Z,
                step: 0.25,
            },
            FrameTransformGenerator {
                rotation: RotationMode::Spin { per_frame: 0.1 },
                ..Default::default()
            },
        )
    }

    #[test]
    fn transforms_do_not_advance_state() {
        let d = driver();
        let viewport = Viewport::new(640, 480);
        assert_eq!(d.transforms(viewport), d.transforms(viewport));
        assert_eq!(d.frame(), 0);
        assert_eq!(d.camera.position.z, 5.0);
    }

    #[test]
    fn finish_frame_moves_camera_once() {
        let mut d = driver();
        for _ in 0..4 {
            d.finish_frame();
        }
        assert_eq!(d.frame(), 4);
        assert_eq!(d.camera.position, Vec3::new(0.0, 0.0, 6.0));
        let placement = d.transforms(Viewport::new(1, 1)).placement;
        assert_eq!(placement.w_axis.z, -6.0);
    }

    #[test]
    fn fps_counter_reports_after_interval() {
        let start = Instant::now();
        let mut fps = FpsCounter {
            interval: Duration::from_secs(1),
            since: start,
            frames: 0,
        };
        assert_eq!(fps.tick(start + Duration::from_millis(500)), None);
        let rate = fps.tick(start + Duration::from_secs(1)).expect("interval elapsed");
        assert!((rate - 2.0).abs() < 1e-6);
        assert_eq!(fps.tick(start + Duration::from_millis(1500)), None);
    }
}
