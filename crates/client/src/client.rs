use worldsim_common::{Census, Frame};
use worldsim_render::{RasterRenderer, Renderer, Surface};
use worldsim_stream::PushChannel;

use crate::clock::{FrameClock, FrameHandle, RefreshClock};
use crate::config::ClientConfig;
use crate::controls::Control;
use crate::error::ClientError;

/// Request-loop state. The pending handle exists only while requesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Requesting { next: FrameHandle },
}

impl LoopState {
    pub fn is_running(&self) -> bool {
        matches!(self, LoopState::Requesting { .. })
    }
}

/// Counters for the HUD and the headless CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    pub requests_emitted: u64,
    pub emit_failures: u64,
    pub frames_painted: u64,
    pub invalid_frames: u64,
    pub connection_losses: u64,
}

/// The render client.
///
/// Owns the push channel, the frame clock and the raster surface. All methods
/// run on the host's UI thread.
pub struct RenderClient<C, K> {
    channel: C,
    clock: K,
    renderer: RasterRenderer,
    state: LoopState,
    stats: ClientStats,
    last_date: Option<String>,
    last_census: Census,
    link_down: bool,
    dirty: bool,
}

impl<C: PushChannel, K: FrameClock> RenderClient<C, K> {
    pub fn new(channel: C, clock: K, surface: Surface) -> Self {
        Self {
            channel,
            clock,
            renderer: RasterRenderer::new(surface),
            state: LoopState::Idle,
            stats: ClientStats::default(),
            last_date: None,
            last_census: Census::default(),
            link_down: false,
            dirty: true,
        }
    }

    pub fn from_config(config: &ClientConfig, channel: C, clock: K) -> Result<Self, ClientError> {
        let surface = config.build_surface()?;
        Ok(Self::new(channel, clock, surface))
    }

    /// Begin the request loop. No-op if it is already running.
    ///
    /// The first request is emitted immediately; later ones once per refresh.
    pub fn start(&mut self) {
        if self.state.is_running() {
            tracing::debug!("start ignored: request loop already running");
            return;
        }
        tracing::info!("request loop started");
        self.tick();
    }

    /// Stop the request loop. No-op if it is idle.
    ///
    /// Only the next scheduled tick is cancelled; requests already emitted may
    /// still be answered and painted.
    pub fn pause(&mut self) {
        match self.state {
            LoopState::Requesting { next } => {
                self.clock.cancel_frame(next);
                self.state = LoopState::Idle;
                tracing::info!("request loop paused");
            }
            LoopState::Idle => tracing::debug!("pause ignored: request loop idle"),
        }
    }

    /// Refresh callback. Runs one tick if `handle` is the pending one.
    pub fn on_frame(&mut self, handle: FrameHandle) {
        match self.state {
            LoopState::Requesting { next } if next == handle => self.tick(),
            _ => tracing::trace!(?handle, "stale frame handle ignored"),
        }
    }

    /// Emit one request and schedule the next tick.
    fn tick(&mut self) {
        match self.channel.emit_request() {
            Ok(()) => self.stats.requests_emitted += 1,
            Err(e) => {
                self.stats.emit_failures += 1;
                self.report(e.into());
            }
        }
        let next = self.clock.request_frame();
        self.state = LoopState::Requesting { next };
    }

    /// Repaint the surface from `frame`, regardless of loop state.
    pub fn on_snapshot(&mut self, frame: &Frame) {
        let rendered = self.renderer.render(frame);
        self.stats.frames_painted += 1;
        self.last_date = frame.date.clone();
        self.last_census = frame.census();
        self.dirty = true;
        tracing::trace!(
            painted = rendered.painted,
            skipped = rendered.skipped,
            "frame painted"
        );
    }

    /// Drain every pending delivery. Returns the number of frames painted.
    pub fn pump(&mut self) -> usize {
        let mut painted = 0;
        while let Some(delivery) = self.channel.try_next() {
            match delivery {
                Ok(frame) => {
                    self.link_down = false;
                    self.on_snapshot(&frame);
                    painted += 1;
                }
                Err(e) => self.report(e.into()),
            }
        }
        painted
    }

    pub fn handle_control(&mut self, control: Control) {
        match control {
            Control::Start => self.start(),
            Control::Pause => self.pause(),
        }
    }

    /// Dispatch a click on the element with `id`.
    pub fn click(&mut self, id: &str) {
        match Control::from_element_id(id) {
            Ok(control) => self.handle_control(control),
            Err(e) => self.report(e),
        }
    }

    /// Log a non-fatal condition.
    fn report(&mut self, err: ClientError) {
        match err {
            ClientError::ConnectionLost(_) => {
                if !self.link_down {
                    self.link_down = true;
                    self.stats.connection_losses += 1;
                    tracing::error!("{err}");
                }
            }
            ClientError::InvalidFrame(_) => {
                self.stats.invalid_frames += 1;
                tracing::warn!("{err}; keeping previous frame");
            }
            _ => tracing::warn!("{err}"),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn surface(&self) -> &Surface {
        self.renderer.surface()
    }

    pub fn stats(&self) -> ClientStats {
        self.stats
    }

    /// Simulated date of the last painted frame.
    pub fn last_date(&self) -> Option<&str> {
        self.last_date.as_deref()
    }

    pub fn last_census(&self) -> Census {
        self.last_census
    }

    /// True while the link is known to be down.
    pub fn link_down(&self) -> bool {
        self.link_down
    }

    /// True once after the surface changed. Hosts use it to skip uploads.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }
}

impl<C: PushChannel> RenderClient<C, RefreshClock> {
    /// One display refresh: fire due ticks, then paint whatever arrived.
    ///
    /// Returns the number of frames painted.
    pub fn refresh(&mut self) -> usize {
        for handle in self.clock.advance() {
            self.on_frame(handle);
        }
        self.pump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldsim_common::Entity;
    use worldsim_render::Rgba;
    use worldsim_stream::{MemoryChannel, MemoryPeer, ServerEvent, StreamError, decode_line, memory_pair};

    fn client() -> (RenderClient<MemoryChannel, RefreshClock>, MemoryPeer) {
        let (channel, peer) = memory_pair();
        let surface = Surface::new(100, 100).unwrap();
        (RenderClient::new(channel, RefreshClock::new(), surface), peer)
    }

    #[test]
    fn starts_idle() {
        let (c, peer) = client();
        assert_eq!(c.state(), LoopState::Idle);
        assert_eq!(peer.pending_requests(), 0);
        assert_eq!(c.clock().pending(), 0);
    }

    #[test]
    fn start_emits_and_schedules() {
        let (mut c, peer) = client();
        c.start();
        assert!(c.is_running());
        assert_eq!(peer.take_requests(), 1);
        assert_eq!(c.clock().pending(), 1);
    }

    #[test]
    fn each_refresh_emits_one_request() {
        let (mut c, peer) = client();
        c.start();
        for _ in 0..5 {
            c.refresh();
        }
        assert_eq!(peer.take_requests(), 6);
        assert_eq!(c.stats().requests_emitted, 6);
        assert_eq!(c.clock().pending(), 1);
    }

    #[test]
    fn second_start_keeps_a_single_chain() {
        let (mut c, peer) = client();
        c.start();
        c.start();
        assert_eq!(peer.take_requests(), 1);
        assert_eq!(c.clock().pending(), 1);

        for _ in 0..3 {
            c.refresh();
        }
        assert_eq!(peer.take_requests(), 3);
        assert_eq!(c.clock().pending(), 1);
    }

    #[test]
    fn pause_cancels_next_tick() {
        let (mut c, peer) = client();
        c.start();
        c.pause();
        assert_eq!(c.state(), LoopState::Idle);
        assert_eq!(c.clock().pending(), 0);

        peer.take_requests();
        c.refresh();
        c.refresh();
        assert_eq!(peer.pending_requests(), 0);
    }

    #[test]
    fn pause_when_idle_is_noop() {
        let (mut c, _peer) = client();
        c.pause();
        c.pause();
        assert_eq!(c.state(), LoopState::Idle);
    }

    #[test]
    fn restart_after_pause_resumes_cadence() {
        let (mut c, peer) = client();
        c.start();
        c.pause();
        c.start();
        assert_eq!(peer.take_requests(), 2);
        c.refresh();
        assert_eq!(peer.take_requests(), 1);
        assert_eq!(c.clock().pending(), 1);
    }

    #[test]
    fn stale_handle_is_ignored() {
        let (mut c, peer) = client();
        c.start();
        let LoopState::Requesting { next: first } = c.state() else {
            panic!("expected requesting");
        };
        c.pause();
        c.start();
        peer.take_requests();

        c.on_frame(first);
        assert_eq!(peer.pending_requests(), 0);
        assert_eq!(c.clock().pending(), 1);
    }

    #[test]
    fn loop_flag_follows_first_transition_only() {
        // Every sequence of 8 start/pause calls, encoded as bits.
        for pattern in 0u32..256 {
            let (mut c, _peer) = client();
            let mut expected = false;
            for bit in 0..8 {
                if pattern & (1 << bit) != 0 {
                    c.start();
                    expected = true;
                } else {
                    c.pause();
                    expected = false;
                }
                assert_eq!(c.is_running(), expected, "pattern {pattern:#010b} step {bit}");
                assert_eq!(c.clock().pending(), expected as usize);
            }
        }
    }

    #[test]
    fn snapshot_repaints_surface() {
        let (mut c, peer) = client();
        peer.push_frame(Frame::new(vec![
            Entity::new("human", 1.0, 2.0),
            Entity::new("animal", 1.0, 2.0),
        ]));
        assert_eq!(c.pump(), 1);
        assert!(c.surface().region_is(5, 10, 5, 5, Rgba::GREEN));
    }

    #[test]
    fn snapshot_after_pause_is_painted() {
        let (mut c, peer) = client();
        c.start();
        assert_eq!(peer.take_requests(), 1);
        c.pause();

        // The source answers the request emitted before the pause.
        peer.push_frame(Frame::new(vec![Entity::new("insect", 0.0, 0.0)]));
        c.refresh();
        assert!(c.surface().region_is(0, 0, 5, 5, Rgba::RED));
        assert!(!c.is_running());
    }

    #[test]
    fn on_snapshot_is_independent_of_loop_state() {
        let (mut c, _peer) = client();
        c.on_snapshot(&Frame::new(vec![Entity::new("human", 10.0, 0.0)]));
        assert!(c.surface().region_is(50, 0, 5, 5, Rgba::BLUE));
        assert_eq!(c.state(), LoopState::Idle);
    }

    #[test]
    fn unknown_kind_leaves_gap() {
        let (mut c, _peer) = client();
        c.on_snapshot(&Frame::new(vec![Entity::new("robot", 3.0, 3.0)]));
        assert!(c.surface().region_is(15, 15, 5, 5, Rgba::TRANSPARENT));
    }

    #[test]
    fn out_of_range_position_is_clipped() {
        let (mut c, peer) = client();
        let line = r#"{"event":"update","data":{"characters":[{"type":"human","position":[1e39,0]},{"type":"animal","position":[1,1]}]}}"#;
        let ServerEvent::Update(frame) = decode_line(line).unwrap() else {
            panic!("expected an update");
        };
        peer.push_frame(frame);

        assert_eq!(c.pump(), 1);
        assert!(c.surface().region_is(5, 5, 5, 5, Rgba::GREEN));
        assert!(c.surface().region_is(0, 0, 5, 5, Rgba::TRANSPARENT));
    }

    #[test]
    fn every_delivered_frame_is_painted_in_order() {
        let (mut c, peer) = client();
        peer.push_frame(Frame::new(vec![Entity::new("human", 0.0, 0.0)]));
        peer.push_frame(Frame::new(vec![Entity::new("animal", 1.0, 0.0)]));
        assert_eq!(c.pump(), 2);
        assert_eq!(c.stats().frames_painted, 2);
        assert!(c.surface().region_is(0, 0, 5, 5, Rgba::TRANSPARENT));
        assert!(c.surface().region_is(5, 0, 5, 5, Rgba::GREEN));
    }

    #[test]
    fn invalid_frame_keeps_previous_picture() {
        let (mut c, peer) = client();
        peer.push_frame(Frame::new(vec![Entity::new("human", 0.0, 0.0)]));
        peer.push_error(StreamError::InvalidFrame("truncated".into()));
        c.pump();

        assert!(c.surface().region_is(0, 0, 5, 5, Rgba::BLUE));
        assert_eq!(c.stats().invalid_frames, 1);
    }

    #[test]
    fn connection_loss_is_not_fatal() {
        let (mut c, peer) = client();
        c.start();
        drop(peer);

        c.refresh();
        c.refresh();
        c.refresh();
        assert!(c.is_running());
        assert!(c.link_down());
        assert_eq!(c.stats().connection_losses, 1);
        assert_eq!(c.stats().emit_failures, 3);
    }

    #[test]
    fn link_recovers_on_next_frame() {
        let (mut c, peer) = client();
        peer.push_error(StreamError::ConnectionLost("blip".into()));
        c.pump();
        assert!(c.link_down());

        peer.push_frame(Frame::default());
        c.pump();
        assert!(!c.link_down());
    }

    #[test]
    fn frame_metadata_is_kept() {
        let (mut c, _peer) = client();
        let frame = Frame {
            date: Some("0010-01-01T00:00:00".into()),
            entities: vec![Entity::new("human", 0.0, 0.0), Entity::new("insect", 1.0, 1.0)],
        };
        c.on_snapshot(&frame);
        assert_eq!(c.last_date(), Some("0010-01-01T00:00:00"));
        assert_eq!(c.last_census().humans, 1);
        assert_eq!(c.last_census().insects, 1);
    }

    #[test]
    fn dirty_flag_tracks_repaints() {
        let (mut c, _peer) = client();
        assert!(c.take_dirty());
        assert!(!c.take_dirty());
        c.on_snapshot(&Frame::default());
        assert!(c.take_dirty());
    }

    #[test]
    fn clicks_route_to_controls() {
        let (mut c, _peer) = client();
        c.click("start");
        assert!(c.is_running());
        c.click("resume");
        assert!(c.is_running());
        c.click("pause");
        assert!(!c.is_running());
    }

    #[test]
    fn from_config_builds_surface() {
        let (channel, _peer) = memory_pair();
        let config = ClientConfig {
            surface_width: 40,
            surface_height: 30,
            ..ClientConfig::default()
        };
        let c = RenderClient::from_config(&config, channel, RefreshClock::new()).unwrap();
        assert_eq!((c.surface().width(), c.surface().height()), (40, 30));
    }
}
