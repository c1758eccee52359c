//! Facades owning one session world each. Intents go through the same
//! transition functions and effect appliers as the timer systems.

use bevy_ecs::prelude::{Mut, Res, ResMut, Schedule, World};
use bevy_ecs::system::SystemState;
use tracing::debug;

use crate::advisor::{AdvisorResource, CannedAdvisor, RideAdvisor, SupportChat};
use crate::clock::SimulationClock;
use crate::config::SimConfig;
use crate::driver::{DispatchError, DriverContext, DriverEvent, DriverSession, DriverStatus, RequestGenerator, RideRequest};
use crate::geo::Location;
use crate::notifications::Notifications;
use crate::passenger::{
    PassengerContext, PassengerEvent, PassengerSession, Preference, RideStatus, Shortcut,
};
use crate::position::{resolve_start_location, PositionProvider};
use crate::runner::{driver_schedule, passenger_schedule, run_until};
use crate::telemetry::{DriverLedger, RideHistory};

pub struct PassengerApp {
    world: World,
    schedule: Schedule,
}

impl PassengerApp {
    pub fn new(config: SimConfig, start: Location, advisor: impl RideAdvisor + 'static) -> Self {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(Notifications::with_ttl(config.notification_ttl_ms));
        world.insert_resource(RideHistory::default());
        world.insert_resource(SupportChat::default());
        world.insert_resource(AdvisorResource::new(advisor));
        world.insert_resource(PassengerSession::new(start));
        world.insert_resource(config);
        Self {
            world,
            schedule: passenger_schedule(),
        }
    }

    /// Start where the provider says, or at the configured default location.
    pub fn with_provider(
        config: SimConfig,
        provider: &dyn PositionProvider,
        advisor: impl RideAdvisor + 'static,
    ) -> Self {
        let start = resolve_start_location(provider, &config.default_location);
        Self::new(config, start, advisor)
    }

    pub fn from_config(config: SimConfig) -> Self {
        let start = config.default_location.clone();
        Self::new(config, start, CannedAdvisor)
    }

    fn dispatch(&mut self, event: PassengerEvent) {
        let mut state: SystemState<(
            ResMut<SimulationClock>,
            ResMut<Notifications>,
            ResMut<RideHistory>,
            ResMut<PassengerSession>,
            Res<AdvisorResource>,
            Res<SimConfig>,
        )> = SystemState::new(&mut self.world);
        let (mut clock, mut notifications, mut history, mut session, advisor, config) =
            state.get_mut(&mut self.world);
        let mut ctx = PassengerContext {
            clock: &mut clock,
            notifications: &mut notifications,
            history: &mut history,
            advisor: advisor.0.as_ref(),
            config: &config,
        };
        ctx.dispatch(&mut session, event);
    }

    pub fn select_point(&mut self, point: Location) {
        self.dispatch(PassengerEvent::SelectPoint(point));
    }

    pub fn choose_shortcut(&mut self, shortcut: Shortcut) {
        self.dispatch(PassengerEvent::Shortcut(shortcut));
    }

    pub fn enter_destination_mode(&mut self) {
        self.dispatch(PassengerEvent::EnterDestinationMode);
    }

    pub fn select_option(&mut self, id: &str) {
        self.dispatch(PassengerEvent::SelectOption(id.to_string()));
    }

    pub fn request_ride(&mut self) {
        self.dispatch(PassengerEvent::RequestRide);
    }

    pub fn cancel(&mut self) {
        self.dispatch(PassengerEvent::Cancel);
    }

    pub fn toggle_preference(&mut self, preference: Preference) {
        self.dispatch(PassengerEvent::TogglePreference(preference));
    }

    pub fn set_user_location(&mut self, location: Location) {
        self.dispatch(PassengerEvent::SetUserLocation(location));
    }

    /// Send a support message and return the advisor's reply (or its fallback).
    pub fn ask_support(&mut self, message: &str) -> String {
        let brand = self.world.resource::<SimConfig>().brand.clone();
        self.world
            .resource_scope(|world, mut chat: Mut<SupportChat>| {
                let advisor = world.resource::<AdvisorResource>();
                chat.ask(advisor.0.as_ref(), &brand, message)
            })
    }

    pub fn advance_to(&mut self, timestamp_ms: u64) -> usize {
        run_until(&mut self.world, &mut self.schedule, timestamp_ms)
    }

    pub fn advance_by(&mut self, delay_ms: u64) -> usize {
        let target = self.now().saturating_add(delay_ms);
        self.advance_to(target)
    }

    pub fn now(&self) -> u64 {
        self.world.resource::<SimulationClock>().now()
    }

    pub fn session(&self) -> &PassengerSession {
        self.world.resource::<PassengerSession>()
    }

    pub fn status(&self) -> RideStatus {
        self.session().status()
    }

    pub fn notifications(&self) -> &Notifications {
        self.world.resource::<Notifications>()
    }

    pub fn history(&self) -> &RideHistory {
        self.world.resource::<RideHistory>()
    }

    pub fn support_chat(&self) -> &SupportChat {
        self.world.resource::<SupportChat>()
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    pub fn clock(&self) -> &SimulationClock {
        self.world.resource::<SimulationClock>()
    }
}

impl Default for PassengerApp {
    fn default() -> Self {
        Self::from_config(SimConfig::default())
    }
}

pub struct DriverApp {
    world: World,
    schedule: Schedule,
}

impl DriverApp {
    pub fn new(config: SimConfig, start: Location) -> Self {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(Notifications::with_ttl(config.notification_ttl_ms));
        world.insert_resource(DriverLedger::default());
        world.insert_resource(RequestGenerator::from_config(&config));
        world.insert_resource(DriverSession::new(start, config.driver_opening_earnings));
        world.insert_resource(config);
        Self {
            world,
            schedule: driver_schedule(),
        }
    }

    pub fn with_provider(config: SimConfig, provider: &dyn PositionProvider) -> Self {
        let start = resolve_start_location(provider, &config.default_location);
        Self::new(config, start)
    }

    pub fn from_config(config: SimConfig) -> Self {
        let start = config.default_location.clone();
        Self::new(config, start)
    }

    fn dispatch(&mut self, event: DriverEvent) -> Result<(), DispatchError> {
        let mut state: SystemState<(
            ResMut<SimulationClock>,
            ResMut<Notifications>,
            ResMut<DriverLedger>,
            ResMut<RequestGenerator>,
            ResMut<DriverSession>,
        )> = SystemState::new(&mut self.world);
        let (mut clock, mut notifications, mut ledger, mut generator, mut session) =
            state.get_mut(&mut self.world);
        let mut ctx = DriverContext {
            clock: &mut clock,
            notifications: &mut notifications,
            ledger: &mut ledger,
            generator: &mut generator,
        };
        ctx.dispatch(&mut session, event)
    }

    pub fn toggle_online(&mut self) -> Result<(), DispatchError> {
        self.dispatch(DriverEvent::ToggleOnline)
    }

    pub fn accept(&mut self, request_id: u64) -> Result<(), DispatchError> {
        self.dispatch(DriverEvent::Accept(request_id))
    }

    pub fn reject(&mut self, request_id: u64) -> Result<(), DispatchError> {
        self.dispatch(DriverEvent::Reject(request_id))
    }

    pub fn complete(&mut self) -> Result<(), DispatchError> {
        self.dispatch(DriverEvent::Complete)
    }

    pub fn set_location(&mut self, location: Location) {
        if let Err(err) = self.dispatch(DriverEvent::SetLocation(location)) {
            debug!(%err, "driver location update refused");
        }
    }

    pub fn advance_to(&mut self, timestamp_ms: u64) -> usize {
        run_until(&mut self.world, &mut self.schedule, timestamp_ms)
    }

    pub fn advance_by(&mut self, delay_ms: u64) -> usize {
        let target = self.now().saturating_add(delay_ms);
        self.advance_to(target)
    }

    pub fn now(&self) -> u64 {
        self.world.resource::<SimulationClock>().now()
    }

    pub fn session(&self) -> &DriverSession {
        self.world.resource::<DriverSession>()
    }

    pub fn status(&self) -> DriverStatus {
        self.session().status()
    }

    pub fn pending_request(&self) -> Option<&RideRequest> {
        self.session().pending_request()
    }

    pub fn earnings(&self) -> i64 {
        self.session().earnings()
    }

    pub fn ledger(&self) -> &DriverLedger {
        self.world.resource::<DriverLedger>()
    }

    pub fn notifications(&self) -> &Notifications {
        self.world.resource::<Notifications>()
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    pub fn clock(&self) -> &SimulationClock {
        self.world.resource::<SimulationClock>()
    }
}

impl Default for DriverApp {
    fn default() -> Self {
        Self::from_config(SimConfig::default())
    }
}
