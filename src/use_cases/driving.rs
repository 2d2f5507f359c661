// Client-side driving session: local dead reckoning plus the remote display cache.

use super::reporting::{ReportPolicy, ReportThrottle};
use crate::domain::{
    CarCatalog, Control, ControlMode, ControlState, JoinRequest, LocalPhysicsSimulator,
    LocalSimulationState, MotionReport, PlayerId, PlayerSession, RemoteStateCache,
};
use std::time::Instant;

/// Who a `player:joined` message was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinedAs {
    Local,
    Remote,
}

/// Dashboard values derived from the local car.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudReadout {
    pub speed_kmh: u32,
    pub gear: u32,
    pub nitro_percent: u32,
}

impl HudReadout {
    pub fn from_state(state: &LocalSimulationState) -> Self {
        let speed_kmh = (state.speed.abs() * 3.6).round() as u32;
        Self {
            speed_kmh,
            gear: speed_kmh.div_ceil(40).max(1),
            nitro_percent: (state.nitro * 100.0).round() as u32,
        }
    }
}

pub struct DrivingSession {
    local_id: Option<PlayerId>,
    catalog: CarCatalog,
    controls: ControlState,
    mode: ControlMode,
    local: Option<LocalSimulationState>,
    remote: RemoteStateCache,
    simulator: LocalPhysicsSimulator,
    throttle: ReportThrottle,
}

impl DrivingSession {
    pub fn new(simulator: LocalPhysicsSimulator, policy: ReportPolicy) -> Self {
        Self {
            local_id: None,
            catalog: CarCatalog::builtin(),
            controls: ControlState::default(),
            mode: ControlMode::default(),
            local: None,
            remote: RemoteStateCache::new(),
            simulator,
            throttle: ReportThrottle::new(policy),
        }
    }

    pub fn local_id(&self) -> Option<PlayerId> {
        self.local_id
    }

    pub fn local_state(&self) -> Option<&LocalSimulationState> {
        self.local.as_ref()
    }

    pub fn remote(&self) -> &RemoteStateCache {
        &self.remote
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Applies an `init` snapshot. A repeated init (after resync) replaces the remote roster.
    pub fn on_init(&mut self, id: PlayerId, players: &[PlayerSession], catalog: CarCatalog) {
        self.local_id = Some(id);
        self.catalog = catalog;
        self.remote.clear();
        self.remote.set_local_id(id);
        self.remote.on_init(players);
    }

    pub fn on_player_joined(&mut self, session: &PlayerSession) -> JoinedAs {
        if self.local_id == Some(session.id) {
            // Re-joining starts over from the server's spawn state.
            self.local = Some(LocalSimulationState::from_session(
                session,
                self.simulator.tuning().initial_nitro,
            ));
            self.throttle.reset();
            return JoinedAs::Local;
        }
        self.remote.on_join(session);
        JoinedAs::Remote
    }

    pub fn on_state_sync(&mut self, session: &PlayerSession) {
        self.remote
            .on_sync(session.id, session.position, session.rotation);
    }

    pub fn on_player_left(&mut self, id: PlayerId) {
        self.remote.on_leave(id);
    }

    /// Builds a join request; blank fields are left for the server to default.
    pub fn join_request(
        &self,
        name: Option<String>,
        car_id: Option<String>,
        color: Option<String>,
    ) -> JoinRequest {
        JoinRequest {
            name: name.filter(|n| !n.trim().is_empty()),
            car_id: car_id
                .filter(|c| !c.trim().is_empty())
                .or_else(|| Some(self.catalog.default_car().id.clone())),
            color: color.filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn set_control(&mut self, control: Control, held: bool) {
        self.controls.set(control, held);
    }

    pub fn set_mode(&mut self, mode: ControlMode) {
        self.mode = mode;
    }

    /// Trims chat text; empty messages never leave the client.
    pub fn prepare_chat(&self, text: &str) -> Option<String> {
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Runs one frame. Returns a state report when the report policy lets one out.
    pub fn advance(&mut self, now: Instant, dt: f32) -> Option<MotionReport> {
        let state = self.local.as_mut()?;
        let car = self.catalog.resolve(&state.car_id);
        self.simulator
            .advance(state, &self.controls, self.mode, car, dt);

        let report = state.report();
        self.throttle.should_send(now, &report).then_some(report)
    }

    pub fn hud(&self) -> Option<HudReadout> {
        self.local.as_ref().map(HudReadout::from_state)
    }

    /// Drops everything tied to the current connection.
    pub fn disconnect(&mut self) {
        self.local_id = None;
        self.local = None;
        self.remote = RemoteStateCache::new();
        self.controls.release_all();
        self.throttle.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DrivingTuning, ObstacleField, Rotation, Vec3};
    use std::time::Duration;

    fn session() -> DrivingSession {
        DrivingSession::new(
            LocalPhysicsSimulator::new(DrivingTuning::default(), ObstacleField::default()),
            ReportPolicy {
                min_interval: Duration::from_millis(50),
                heartbeat: Duration::from_secs(1),
            },
        )
    }

    fn player(id: u64, car_id: &str) -> PlayerSession {
        PlayerSession::spawn(
            PlayerId(id),
            JoinRequest {
                car_id: Some(car_id.to_string()),
                ..JoinRequest::default()
            },
            "falcon",
        )
    }

    #[test]
    fn nothing_is_simulated_before_own_join() {
        let mut driving = session();
        driving.on_init(PlayerId(1), &[], CarCatalog::builtin());

        assert!(driving.advance(Instant::now(), 0.016).is_none());
        assert!(driving.hud().is_none());
    }

    #[test]
    fn own_join_creates_local_state_with_starting_nitro() {
        let mut driving = session();
        driving.on_init(PlayerId(1), &[player(2, "vortex")], CarCatalog::builtin());

        assert_eq!(driving.on_player_joined(&player(1, "drift")), JoinedAs::Local);
        assert_eq!(driving.on_player_joined(&player(3, "falcon")), JoinedAs::Remote);

        let local = driving.local_state().expect("local state");
        assert_eq!(local.car_id, "drift");
        assert!((local.nitro - 0.6).abs() < 1e-6);
        assert_eq!(driving.remote().len(), 2);
    }

    #[test]
    fn advance_reports_then_throttles() {
        let mut driving = session();
        driving.on_init(PlayerId(1), &[], CarCatalog::builtin());
        driving.on_player_joined(&player(1, "falcon"));
        driving.set_control(Control::Forward, true);

        let t0 = Instant::now();
        let first = driving.advance(t0, 0.5).expect("first report");
        assert!((first.speed - 14.0).abs() < 1e-4);
        assert!(driving.advance(t0 + Duration::from_millis(16), 0.016).is_none());
        assert!(driving.advance(t0 + Duration::from_millis(66), 0.05).is_some());
    }

    #[test]
    fn unknown_car_simulates_with_default_car() {
        let mut driving = session();
        driving.on_init(PlayerId(1), &[], CarCatalog::builtin());
        driving.on_player_joined(&player(1, "spaceship"));
        driving.set_control(Control::Forward, true);

        let report = driving.advance(Instant::now(), 1.0).expect("report");
        assert!((report.speed - 28.0).abs() < 1e-4);
    }

    #[test]
    fn remote_updates_flow_into_cache_and_self_echo_is_ignored() {
        let mut driving = session();
        driving.on_init(PlayerId(1), &[], CarCatalog::builtin());
        driving.on_player_joined(&player(1, "falcon"));
        driving.on_player_joined(&player(2, "vortex"));

        let mut moved = player(2, "vortex");
        moved.position = Vec3::new(30.0, 0.5, 12.0);
        moved.rotation = Rotation { y: 2.0 };
        driving.on_state_sync(&moved);

        let mut echo = player(1, "falcon");
        echo.position = Vec3::new(-500.0, 0.5, 0.0);
        driving.on_state_sync(&echo);

        assert_eq!(driving.remote().len(), 1);
        assert_eq!(
            driving.remote().get(PlayerId(2)).map(|r| r.position),
            Some(Vec3::new(30.0, 0.5, 12.0))
        );
        // The echo never touches local state.
        assert_eq!(driving.local_state().map(|s| s.position.x), Some(0.0));

        driving.on_player_left(PlayerId(2));
        assert!(driving.remote().is_empty());
    }

    #[test]
    fn repeated_init_replaces_remote_roster() {
        let mut driving = session();
        driving.on_init(PlayerId(1), &[player(2, "vortex")], CarCatalog::builtin());
        driving.on_player_joined(&player(1, "falcon"));

        driving.on_init(PlayerId(1), &[player(3, "drift")], CarCatalog::builtin());

        assert!(driving.remote().get(PlayerId(2)).is_none());
        assert!(driving.remote().get(PlayerId(3)).is_some());
        // Local driving state survives a resync.
        assert!(driving.local_state().is_some());
    }

    #[test]
    fn empty_chat_is_dropped_client_side() {
        let driving = session();
        assert_eq!(driving.prepare_chat("   "), None);
        assert_eq!(driving.prepare_chat(" gg "), Some("gg".to_string()));
    }

    #[test]
    fn join_request_defaults_car_to_catalog_head() {
        let driving = session();
        let request = driving.join_request(Some(" ".to_string()), None, Some("#123456".to_string()));

        assert_eq!(request.name, None);
        assert_eq!(request.car_id.as_deref(), Some("falcon"));
        assert_eq!(request.color.as_deref(), Some("#123456"));
    }

    #[test]
    fn hud_derives_kmh_and_gear() {
        let state = LocalSimulationState {
            car_id: "falcon".to_string(),
            position: Vec3::default(),
            rotation: Rotation::default(),
            speed: -25.0,
            nitro: 0.42,
        };

        let hud = HudReadout::from_state(&state);
        assert_eq!(hud.speed_kmh, 90);
        assert_eq!(hud.gear, 3);
        assert_eq!(hud.nitro_percent, 42);

        let idle = HudReadout::from_state(&LocalSimulationState { speed: 0.0, ..state });
        assert_eq!(idle.gear, 1);
    }
}
