//! Frame-timed animation component.
//!
//! An [`Animation`] is an ordered list of [`Frame`]s plus a playback cursor.
//! Time is fed in milliseconds through [`Animation::advance`], either by the
//! [`animation`](crate::systems::animation::animation) system from
//! [`WorldTime`](crate::resources::worldtime::WorldTime) or, for animations
//! drawn outside the ECS, by the draw methods themselves reading a [`Clock`]
//! (auto-update).
//!
//! # Playback rules
//!
//! Each frame shows for `duration_ms / speed`. When the pending time runs
//! out the cursor moves on, possibly several frames in one call when the
//! delta is large:
//!
//! - the stop frame (see [`Animation::stop_at`]) or, without looping and
//!   ping-pong, the last frame stops playback instead of moving on;
//! - otherwise the cursor wraps around to the first frame;
//! - in ping-pong mode the direction reverses at both ends, but a
//!   non-looping ping-pong only stops when it gets back to frame 0.
//!
//! # Copies
//!
//! `Clone` shares the frame list and duplicates the cursor, so copies of one
//! animation play independently. Editing the frames of a copy (adding a
//! frame, changing a duration) gives that copy its own list; the other
//! copies keep the old one.

use std::sync::Arc;
use std::time::Instant;

use bevy_ecs::prelude::Component;

use crate::error::{EngineError, EngineResult};
use crate::image::Image;
use crate::render::{Color, RenderBackend};
use crate::spritesheet::SpriteSheet;

/// Millisecond time source for auto-updating animations.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock, counting from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::cell::Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: std::cell::Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// What a frame shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameSource {
    Image(Image),
    /// A cell of the animation's sprite sheet.
    Cell { col: usize, row: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub source: FrameSource,
    pub duration_ms: u32,
}

#[derive(Component, Debug, Clone)]
pub struct Animation {
    frames: Arc<Vec<Frame>>,
    sheet: Option<Arc<SpriteSheet>>,
    current: usize,
    /// Milliseconds until the next frame change; negative only inside
    /// [`Animation::advance`]. Kept in f64 so catch-up over long stalls
    /// still moves when a frame duration is added.
    next_change: f64,
    direction: i32,
    stopped: bool,
    speed: f32,
    looping: bool,
    ping_pong: bool,
    stop_at: Option<usize>,
    auto_update: bool,
    first_update: bool,
    last_update_ms: u64,
    time_left: f64,
}

impl Default for Animation {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation {
    /// Empty, looping, auto-updating animation.
    pub fn new() -> Self {
        Self {
            frames: Arc::new(Vec::new()),
            sheet: None,
            current: 0,
            next_change: 0.0,
            direction: 1,
            stopped: false,
            speed: 1.0,
            looping: true,
            ping_pong: false,
            stop_at: None,
            auto_update: true,
            first_update: true,
            last_update_ms: 0,
            time_left: 0.0,
        }
    }

    /// Empty animation whose frames can be cells of `sheet`.
    pub fn with_sheet(sheet: Arc<SpriteSheet>) -> Self {
        Self {
            sheet: Some(sheet),
            ..Self::new()
        }
    }

    /// One frame per image, all with the same duration.
    pub fn from_images(images: &[Image], duration_ms: u32) -> EngineResult<Self> {
        let mut anim = Self::new();
        for image in images {
            anim.add_frame(*image, duration_ms)?;
        }
        Ok(anim)
    }

    pub fn from_images_with_durations(images: &[Image], durations: &[u32]) -> EngineResult<Self> {
        if images.len() != durations.len() {
            return Err(EngineError::Config(format!(
                "{} images but {} durations; need one duration per frame",
                images.len(),
                durations.len()
            )));
        }
        let mut anim = Self::new();
        for (image, &duration) in images.iter().zip(durations) {
            anim.add_frame(*image, duration)?;
        }
        Ok(anim)
    }

    /// Every cell of `sheet`, row by row.
    pub fn from_sheet(sheet: Arc<SpriteSheet>, duration_ms: u32) -> EngineResult<Self> {
        let (cols, rows) = (sheet.horizontal_count(), sheet.vertical_count());
        let mut anim = Self::with_sheet(sheet);
        for row in 0..rows {
            for col in 0..cols {
                anim.add_cell(col, row, duration_ms)?;
            }
        }
        Ok(anim)
    }

    /// The cells of the rectangle `(x1, y1)..=(x2, y2)`, scanned row by row
    /// when `horizontal_scan` is set and column by column otherwise.
    pub fn from_sheet_region(
        sheet: Arc<SpriteSheet>,
        (x1, y1): (usize, usize),
        (x2, y2): (usize, usize),
        horizontal_scan: bool,
        duration_ms: u32,
    ) -> EngineResult<Self> {
        let mut anim = Self::with_sheet(sheet);
        if horizontal_scan {
            for row in y1..=y2 {
                for col in x1..=x2 {
                    anim.add_cell(col, row, duration_ms)?;
                }
            }
        } else {
            for col in x1..=x2 {
                for row in y1..=y2 {
                    anim.add_cell(col, row, duration_ms)?;
                }
            }
        }
        Ok(anim)
    }

    /// Append an image frame. Rewinds the cursor to frame 0.
    pub fn add_frame(&mut self, image: Image, duration_ms: u32) -> EngineResult<()> {
        self.push_frame(Frame {
            source: FrameSource::Image(image),
            duration_ms,
        })
    }

    /// Append a cell of the animation's sheet. Rewinds the cursor to frame 0.
    pub fn add_cell(&mut self, col: usize, row: usize, duration_ms: u32) -> EngineResult<()> {
        let Some(sheet) = &self.sheet else {
            log::error!("add_cell({}, {}) on an animation without a sprite sheet", col, row);
            return Err(EngineError::Config(
                "animation has no sprite sheet to take cells from".to_string(),
            ));
        };
        sheet.cell(col, row)?;
        self.push_frame(Frame {
            source: FrameSource::Cell { col, row },
            duration_ms,
        })
    }

    fn push_frame(&mut self, frame: Frame) -> EngineResult<()> {
        if frame.duration_ms == 0 {
            log::error!("Rejected animation frame with zero duration");
            return Err(EngineError::InvalidDuration);
        }
        if self.frames.is_empty() {
            self.next_change = frame.duration_ms as f64 / self.speed as f64;
        }
        Arc::make_mut(&mut self.frames).push(frame);
        self.current = 0;
        Ok(())
    }

    /// Move playback forward by `delta_ms` milliseconds.
    pub fn advance(&mut self, delta_ms: f32) {
        if self.stopped || self.frames.is_empty() {
            return;
        }
        if !delta_ms.is_finite() {
            log::warn!("Ignoring non-finite animation delta {}", delta_ms);
            return;
        }
        self.next_change -= delta_ms as f64;
        let count = self.frames.len();
        self.skip_whole_cycles();

        while self.next_change < 0.0 && !self.stopped {
            let on_last = self.current == count - 1;
            if self.stop_at == Some(self.current) || (on_last && !self.looping && !self.ping_pong) {
                self.stopped = true;
                break;
            }

            let mut next = (self.current as i64 + self.direction as i64) % count as i64;
            if self.ping_pong {
                if next <= 0 {
                    next = 0;
                    self.direction = 1;
                    if !self.looping {
                        self.current = 0;
                        self.stopped = true;
                        break;
                    }
                } else if next >= count as i64 - 1 {
                    next = count as i64 - 1;
                    self.direction = -1;
                }
            } else if next < 0 {
                next += count as i64;
            }
            self.current = next as usize;
            self.next_change += self.scaled_duration(self.current);
        }
    }

    fn scaled_duration(&self, index: usize) -> f64 {
        self.frames[index].duration_ms as f64 / self.speed as f64
    }

    /// Drop whole playback cycles from a large pending deficit. Only a
    /// looping animation with no stop frame repeats forever; after one cycle
    /// it is back on the same frame, direction and counter offset.
    fn skip_whole_cycles(&mut self) {
        let count = self.frames.len();
        if !self.looping || self.stop_at.is_some_and(|index| index < count) {
            return;
        }
        let cycle: f64 = if self.ping_pong && count > 1 {
            // ends entered once, inner frames once each way
            self.scaled_duration(0)
                + self.scaled_duration(count - 1)
                + 2.0 * (1..count - 1).map(|i| self.scaled_duration(i)).sum::<f64>()
        } else {
            (0..count).map(|i| self.scaled_duration(i)).sum()
        };
        if cycle <= 0.0 || self.next_change >= -2.0 * cycle {
            return;
        }
        // keep one full cycle of deficit so the stepping loop still runs
        let skipped = (-self.next_change / cycle).floor() - 1.0;
        self.next_change += skipped * cycle;
    }

    /// Same as [`Animation::advance`].
    pub fn update(&mut self, delta_ms: f32) {
        self.advance(delta_ms);
    }

    /// Pause, remembering the time left on the current frame.
    pub fn stop(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        self.time_left = self.next_change;
        self.stopped = true;
    }

    /// Resume after [`Animation::stop`].
    pub fn start(&mut self) {
        if !self.stopped || self.frames.is_empty() {
            return;
        }
        self.stopped = false;
        self.next_change = self.time_left;
    }

    /// Back to frame 0 with its full duration, playing. The next auto-update
    /// counts as the first.
    pub fn restart(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        self.stopped = false;
        self.current = 0;
        self.next_change = self.scaled_duration(0);
        self.first_update = true;
        self.last_update_ms = 0;
    }

    /// Change the playback speed multiplier. The time left on the current
    /// frame is rescaled. Non-positive values are ignored.
    pub fn set_speed(&mut self, speed: f32) {
        if speed > 0.0 {
            self.next_change = self.next_change * self.speed as f64 / speed as f64;
            self.speed = speed;
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Jump to `index` without touching the pending time.
    pub fn set_current_frame(&mut self, index: usize) -> EngineResult<()> {
        self.check_index(index)?;
        self.current = index;
        Ok(())
    }

    pub fn set_duration(&mut self, index: usize, duration_ms: u32) -> EngineResult<()> {
        self.check_index(index)?;
        if duration_ms == 0 {
            log::error!("Rejected zero duration for frame {}", index);
            return Err(EngineError::InvalidDuration);
        }
        Arc::make_mut(&mut self.frames)[index].duration_ms = duration_ms;
        Ok(())
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_ping_pong(&mut self, ping_pong: bool) {
        self.ping_pong = ping_pong;
    }

    pub fn is_ping_pong(&self) -> bool {
        self.ping_pong
    }

    /// Stop when frame `index` runs out, whatever the other modes say.
    pub fn stop_at(&mut self, index: usize) {
        self.stop_at = Some(index);
    }

    pub fn clear_stop_at(&mut self) {
        self.stop_at = None;
    }

    pub fn set_auto_update(&mut self, auto_update: bool) {
        self.auto_update = auto_update;
    }

    pub fn is_auto_update(&self) -> bool {
        self.auto_update
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn current_frame_index(&self) -> usize {
        self.current
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Whether `self` and `other` still share one frame list.
    pub fn shares_frames_with(&self, other: &Animation) -> bool {
        Arc::ptr_eq(&self.frames, &other.frames)
    }

    pub fn sheet(&self) -> Option<&Arc<SpriteSheet>> {
        self.sheet.as_ref()
    }

    /// Milliseconds left on the current frame.
    pub fn time_until_next_frame(&self) -> f32 {
        self.next_change as f32
    }

    pub fn duration(&self, index: usize) -> EngineResult<u32> {
        self.check_index(index)?;
        Ok(self.frames[index].duration_ms)
    }

    pub fn durations(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.duration_ms).collect()
    }

    pub fn image(&self, index: usize) -> EngineResult<&Image> {
        self.check_index(index)?;
        match &self.frames[index].source {
            FrameSource::Image(image) => Ok(image),
            FrameSource::Cell { col, row } => match &self.sheet {
                Some(sheet) => sheet.cell(*col, *row),
                None => Err(EngineError::Config(
                    "cell frame without a sprite sheet".to_string(),
                )),
            },
        }
    }

    pub fn current_image(&self) -> EngineResult<&Image> {
        self.image(self.current)
    }

    /// Width of the current frame, 0 without frames.
    pub fn width(&self) -> u32 {
        self.current_image().map_or(0, Image::width)
    }

    pub fn height(&self) -> u32 {
        self.current_image().map_or(0, Image::height)
    }

    fn check_index(&self, index: usize) -> EngineResult<()> {
        if index >= self.frames.len() {
            return Err(EngineError::FrameIndexOutOfRange {
                index,
                count: self.frames.len(),
            });
        }
        Ok(())
    }

    /// Advance from `clock` when auto-update is on. The first call after
    /// creation or [`Animation::restart`] only takes the timestamp.
    pub fn update_no_draw(&mut self, clock: &dyn Clock) {
        if !self.auto_update {
            return;
        }
        let now = clock.now_ms();
        let delta = if self.first_update {
            self.first_update = false;
            0
        } else {
            now.saturating_sub(self.last_update_ms)
        };
        self.last_update_ms = now;
        self.advance(delta as f32);
    }

    /// Auto-update, then draw the current frame at its natural size.
    pub fn draw(
        &mut self,
        renderer: &mut dyn RenderBackend,
        clock: &dyn Clock,
        x: f32,
        y: f32,
        color: Color,
    ) -> EngineResult<()> {
        self.update_no_draw(clock);
        if self.frames.is_empty() {
            return Ok(());
        }
        self.current_image()?.draw(renderer, x, y, color)
    }

    /// Auto-update, then draw the current frame stretched to `width` x `height`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_sized(
        &mut self,
        renderer: &mut dyn RenderBackend,
        clock: &dyn Clock,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    ) -> EngineResult<()> {
        self.update_no_draw(clock);
        if self.frames.is_empty() {
            return Ok(());
        }
        self.current_image()?
            .draw_sized(renderer, x, y, width, height, color)
    }

    /// Auto-update, then emit the current frame into a quad block opened with
    /// [`SpriteSheet::start_use`].
    pub fn render_in_use(
        &mut self,
        renderer: &mut dyn RenderBackend,
        clock: &dyn Clock,
        x: f32,
        y: f32,
    ) -> EngineResult<()> {
        self.update_no_draw(clock);
        if self.frames.is_empty() {
            return Ok(());
        }
        match (&self.frames[self.current].source, &self.sheet) {
            (FrameSource::Cell { col, row }, Some(sheet)) => {
                sheet.render_in_use(renderer, x, y, *col, *row)
            }
            _ => {
                let image = self.current_image()?;
                image.draw_embedded(renderer, x, y, image.width() as f32, image.height() as f32);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Texture;
    use crate::render::{DrawCommand, RecordingBackend};

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn image(id: u32) -> Image {
        Image::new(Texture::exact(id, 16, 16))
    }

    fn anim(durations: &[u32]) -> Animation {
        let images: Vec<Image> = (0..durations.len() as u32).map(image).collect();
        Animation::from_images_with_durations(&images, durations).unwrap()
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut a = Animation::new();
        assert_eq!(a.add_frame(image(1), 0), Err(EngineError::InvalidDuration));
        assert_eq!(a.frame_count(), 0);
    }

    #[test]
    fn test_first_frame_sets_counter() {
        let mut a = Animation::new();
        a.set_speed(2.0);
        a.add_frame(image(1), 100).unwrap();
        assert!(approx_eq(a.time_until_next_frame(), 50.0));
    }

    #[test]
    fn test_multi_frame_catch_up() {
        let mut a = anim(&[100, 200, 150]);
        a.advance(350.0);
        assert_eq!(a.current_frame_index(), 2);
        assert!(approx_eq(a.time_until_next_frame(), 100.0));
    }

    #[test]
    fn test_looping_wraps() {
        let mut a = anim(&[100, 100, 100]);
        a.advance(301.0);
        assert_eq!(a.current_frame_index(), 0);
        assert!(!a.is_stopped());
    }

    #[test]
    fn test_huge_delta_keeps_index_in_range() {
        let mut a = anim(&[10, 20, 30, 40]);
        for delta in [0.0, 5.0, 1_000_000.0, 33.0, 7.5, 99_999.0] {
            a.advance(delta);
            assert!(a.current_frame_index() < a.frame_count());
        }
        a.set_ping_pong(true);
        for _ in 0..100 {
            a.advance(17.0);
            assert!(a.current_frame_index() < a.frame_count());
        }
    }

    #[test]
    fn test_enormous_delta_matches_short_equivalent() {
        // 1e9 is a whole number of 40 ms cycles past 40
        let mut a = anim(&[10, 10, 10, 10]);
        a.advance(1.0e9);
        let mut b = anim(&[10, 10, 10, 10]);
        b.advance(40.0);
        assert_eq!(a.current_frame_index(), b.current_frame_index());
        assert!(approx_eq(a.time_until_next_frame(), b.time_until_next_frame()));
        assert!(!a.is_stopped());

        // ping-pong cycle 0,1,2,3,2,1 lasts 60 ms
        let mut a = anim(&[10, 10, 10, 10]);
        a.set_ping_pong(true);
        a.advance(1.0e9);
        let mut b = anim(&[10, 10, 10, 10]);
        b.set_ping_pong(true);
        b.advance(100.0);
        assert_eq!(a.current_frame_index(), b.current_frame_index());
        assert!(approx_eq(a.time_until_next_frame(), b.time_until_next_frame()));
    }

    #[test]
    fn test_enormous_delta_still_honours_stop_frame() {
        let mut a = anim(&[10, 10, 10, 10]);
        a.stop_at(2);
        a.advance(1.0e9);
        assert!(a.is_stopped());
        assert_eq!(a.current_frame_index(), 2);
    }

    #[test]
    fn test_non_finite_delta_ignored() {
        let mut a = anim(&[100, 100]);
        a.advance(30.0);
        for delta in [f32::INFINITY, f32::NEG_INFINITY, f32::NAN] {
            a.advance(delta);
            assert_eq!(a.current_frame_index(), 0);
            assert!(approx_eq(a.time_until_next_frame(), 70.0));
        }
        a.advance(80.0);
        assert_eq!(a.current_frame_index(), 1);
    }

    #[test]
    fn test_non_looping_stops_on_last_frame() {
        let mut a = anim(&[100, 100, 100]);
        a.set_looping(false);
        a.advance(250.0);
        assert_eq!(a.current_frame_index(), 2);
        assert!(!a.is_stopped());
        // counter is at 50; it has to go negative again
        a.advance(50.0);
        assert!(!a.is_stopped());
        a.advance(1.0);
        assert!(a.is_stopped());
        assert_eq!(a.current_frame_index(), 2);
    }

    #[test]
    fn test_ping_pong_without_loop_stops_only_at_home() {
        let mut a = anim(&[100, 100, 100]);
        a.set_looping(false);
        a.set_ping_pong(true);

        a.advance(100.5);
        assert_eq!(a.current_frame_index(), 1);
        a.advance(100.0);
        assert_eq!(a.current_frame_index(), 2);
        assert!(!a.is_stopped(), "far end must not stop a ping-pong");
        a.advance(100.0);
        assert_eq!(a.current_frame_index(), 1);
        a.advance(100.0);
        assert_eq!(a.current_frame_index(), 0);
        assert!(a.is_stopped());
    }

    #[test]
    fn test_ping_pong_with_loop_bounces() {
        let mut a = anim(&[100, 100, 100]);
        a.set_ping_pong(true);
        a.advance(50.0);
        let mut seen = Vec::new();
        for _ in 0..6 {
            a.advance(100.0);
            seen.push(a.current_frame_index());
        }
        assert_eq!(seen, vec![1, 2, 1, 0, 1, 2]);
        assert!(!a.is_stopped());
    }

    #[test]
    fn test_stop_at_frame() {
        let mut a = anim(&[100, 100, 100, 100]);
        a.stop_at(1);
        a.advance(1000.0);
        assert!(a.is_stopped());
        assert_eq!(a.current_frame_index(), 1);
    }

    #[test]
    fn test_set_speed_twice_is_idempotent() {
        let mut a = anim(&[100, 200]);
        a.advance(30.0);
        a.set_speed(3.0);
        let once = a.time_until_next_frame();
        a.set_speed(3.0);
        assert!(approx_eq(a.time_until_next_frame(), once));
        assert!(approx_eq(once, 70.0 / 3.0));
    }

    #[test]
    fn test_non_positive_speed_ignored() {
        let mut a = anim(&[100]);
        a.set_speed(0.0);
        a.set_speed(-1.0);
        assert!(approx_eq(a.speed(), 1.0));
        assert!(approx_eq(a.time_until_next_frame(), 100.0));
    }

    #[test]
    fn test_stop_and_start_resume_remaining_time() {
        let mut a = anim(&[100, 100]);
        a.advance(40.0);
        a.stop();
        a.advance(500.0);
        assert_eq!(a.current_frame_index(), 0);
        a.start();
        assert!(approx_eq(a.time_until_next_frame(), 60.0));
        a.advance(61.0);
        assert_eq!(a.current_frame_index(), 1);
    }

    #[test]
    fn test_restart() {
        let mut a = anim(&[100, 50]);
        a.set_looping(false);
        a.advance(1000.0);
        assert!(a.is_stopped());
        a.restart();
        assert!(!a.is_stopped());
        assert_eq!(a.current_frame_index(), 0);
        assert!(approx_eq(a.time_until_next_frame(), 100.0));
    }

    #[test]
    fn test_empty_animation_is_inert() {
        let mut a = Animation::new();
        a.advance(100.0);
        a.stop();
        a.start();
        a.restart();
        assert!(!a.is_stopped());
        assert_eq!(a.width(), 0);
    }

    #[test]
    fn test_out_of_range_queries() {
        let a = anim(&[100, 100]);
        assert_eq!(
            a.duration(2),
            Err(EngineError::FrameIndexOutOfRange { index: 2, count: 2 })
        );
        assert!(a.image(5).is_err());
        assert_eq!(a.durations(), vec![100, 100]);
    }

    #[test]
    fn test_copy_shares_frames_with_own_cursor() {
        let mut a = anim(&[100, 100, 100]);
        let mut b = a.clone();
        assert!(a.shares_frames_with(&b));
        a.advance(150.0);
        assert_eq!(a.current_frame_index(), 1);
        assert_eq!(b.current_frame_index(), 0);

        b.add_frame(image(9), 100).unwrap();
        assert!(!a.shares_frames_with(&b));
        assert_eq!(a.frame_count(), 3);
        assert_eq!(b.frame_count(), 4);
    }

    #[test]
    fn test_add_frame_rewinds_cursor() {
        let mut a = anim(&[100, 100]);
        a.advance(150.0);
        assert_eq!(a.current_frame_index(), 1);
        a.add_frame(image(3), 100).unwrap();
        assert_eq!(a.current_frame_index(), 0);
    }

    #[test]
    fn test_sheet_frames() {
        let sheet = Arc::new(SpriteSheet::new(Image::new(Texture::exact(4, 64, 32)), 16, 16).unwrap());
        let a = Animation::from_sheet(sheet.clone(), 100).unwrap();
        assert_eq!(a.frame_count(), 8);
        assert_eq!(a.image(5).unwrap().origin(), (16, 16));

        let region = Animation::from_sheet_region(sheet.clone(), (1, 0), (2, 1), false, 50).unwrap();
        let cells: Vec<(u32, u32)> = (0..4).map(|i| region.image(i).unwrap().origin()).collect();
        assert_eq!(cells, vec![(16, 0), (16, 16), (32, 0), (32, 16)]);

        let mut no_sheet = Animation::new();
        assert!(no_sheet.add_cell(0, 0, 100).is_err());
        let mut bad = Animation::with_sheet(sheet);
        assert!(matches!(
            bad.add_cell(4, 0, 100),
            Err(EngineError::CellOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_auto_update_first_call_is_zero_delta() {
        let clock = ManualClock::new(10_000);
        let mut a = anim(&[100, 100]);
        a.update_no_draw(&clock);
        assert_eq!(a.current_frame_index(), 0);
        assert!(approx_eq(a.time_until_next_frame(), 100.0));

        clock.advance(150);
        a.update_no_draw(&clock);
        assert_eq!(a.current_frame_index(), 1);

        a.restart();
        clock.advance(5_000);
        a.update_no_draw(&clock);
        assert_eq!(a.current_frame_index(), 0);
    }

    #[test]
    fn test_auto_update_off_ignores_clock() {
        let clock = ManualClock::new(0);
        let mut a = anim(&[100, 100]);
        a.set_auto_update(false);
        a.update_no_draw(&clock);
        clock.advance(150);
        a.update_no_draw(&clock);
        assert_eq!(a.current_frame_index(), 0);
    }

    #[test]
    fn test_draw_emits_current_frame() {
        let clock = ManualClock::new(0);
        let mut a = anim(&[100, 100]);
        let mut r = RecordingBackend::new();
        a.draw(&mut r, &clock, 5.0, 6.0, Color::WHITE).unwrap();
        clock.advance(120);
        a.draw(&mut r, &clock, 5.0, 6.0, Color::WHITE).unwrap();
        let bound: Vec<u32> = r
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BindTexture(id) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(bound, vec![0, 1]);
    }
}
