//! The location resolver — drives one picking flow from open to
//! confirmed or cancelled.
//!
//! Open flow:   permission → live fix → cached last-known → default coordinate → initial resolution
//! Pan flow:    region settle → debounce window → reverse geocode → newest-token guard → address update
//!
//! A single task owns the session; commands, the debounce deadline, and
//! geocode completions are the select arms. Geocode calls run as
//! spawned tasks reporting back over a channel, so a slow provider
//! never blocks the session. Provider failures are logged and absorbed;
//! the session keeps its last-good state.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::cache::LastPositionCache;
use crate::providers::{Permission, PositionProvider, ProviderError, RawAddress, ReverseGeocoder};

use super::address::format_address;
use super::debounce::Debounce;
use super::types::{
    ConfirmedLocation, Coordinate, MapRegion, PermissionState, PickerError, Remediation,
    ResolvedAddress, DEFAULT_COORDINATE,
};

/// How long the map must rest before the focal coordinate is geocoded.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Resolver tuning. The defaults are the production values; tests
/// shrink the window.
pub struct PickerConfig {
    pub debounce_window: Duration,
    pub default_coordinate: Coordinate,
    /// Override the last-known-position cache file (None = the default
    /// path under the home directory).
    pub cache_path: Option<PathBuf>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            debounce_window: DEBOUNCE_WINDOW,
            default_coordinate: DEFAULT_COORDINATE,
            cache_path: None,
        }
    }
}

/// Session-driving commands, sent through a [`PickerHandle`].
#[derive(Debug)]
pub enum PickerCommand {
    Open,
    Close,
    RegionSettled(Coordinate),
    Confirm,
    LocateDevice,
    AppForegrounded,
}

/// What the resolver reports back to the surface driving it.
#[derive(Debug, Clone)]
pub enum PickerEvent {
    /// The picker became visible at the given region.
    Opened { region: MapRegion },
    /// Permission is denied; the surface should offer the remediation.
    PermissionDenied { remediation: Remediation },
    /// The address display should show/hide its loading state.
    Fetching(bool),
    /// A fresh address for the focal coordinate.
    AddressResolved(ResolvedAddress),
    /// The map surface should animate to this region; a region-settled
    /// call is expected once the animation stops.
    Recentered { region: MapRegion },
    /// The confirmation hand-off. Emitted at most once per session.
    Confirmed(ConfirmedLocation),
    /// The session ended without (further) effect.
    Closed,
}

/// Caller-side handle: commands in, events out. Dropping it shuts the
/// resolver task down.
pub struct PickerHandle {
    commands: mpsc::Sender<PickerCommand>,
    events: mpsc::Receiver<PickerEvent>,
}

impl PickerHandle {
    pub async fn open(&self) {
        self.send(PickerCommand::Open).await;
    }

    pub async fn close(&self) {
        self.send(PickerCommand::Close).await;
    }

    /// Alias for [`close`](Self::close): discards the session without
    /// confirming.
    pub async fn cancel(&self) {
        self.close().await;
    }

    /// Report that a pan/zoom gesture has fully stopped at `coordinate`.
    pub async fn region_settled(&self, coordinate: Coordinate) {
        self.send(PickerCommand::RegionSettled(coordinate)).await;
    }

    pub async fn confirm(&self) {
        self.send(PickerCommand::Confirm).await;
    }

    /// Recenter on the current device position.
    pub async fn locate_device(&self) {
        self.send(PickerCommand::LocateDevice).await;
    }

    /// Report an app-foreground transition (permission is re-checked).
    pub async fn app_foregrounded(&self) {
        self.send(PickerCommand::AppForegrounded).await;
    }

    /// The next event, or None once the resolver task has stopped.
    pub async fn next_event(&mut self) -> Option<PickerEvent> {
        self.events.recv().await
    }

    async fn send(&self, command: PickerCommand) {
        if self.commands.send(command).await.is_err() {
            debug!("picker task already stopped");
        }
    }
}

/// The ephemeral state of one open picking flow.
struct Session {
    visible: bool,
    coordinate: Coordinate,
    address: ResolvedAddress,
    fetch_in_flight: bool,
}

impl Session {
    fn idle(coordinate: Coordinate) -> Self {
        Self {
            visible: false,
            coordinate,
            address: ResolvedAddress::default(),
            fetch_in_flight: false,
        }
    }
}

/// A finished reverse-geocode call, tagged with the session epoch and
/// request token it was issued under.
struct GeocodeOutcome {
    epoch: u64,
    token: u64,
    result: Result<Vec<RawAddress>, ProviderError>,
}

/// The resolver actor. Construct with [`LocationResolver::spawn`].
pub struct LocationResolver {
    position: Arc<dyn PositionProvider>,
    geocoder: Arc<dyn ReverseGeocoder>,
    cache: LastPositionCache,
    default_coordinate: Coordinate,
    permission: PermissionState,
    session: Session,
    /// Bumped on close; outcomes from an older epoch are dropped.
    epoch: u64,
    /// Tokens issued so far; an outcome applies only when its token is
    /// the newest issued one.
    issued: u64,
    events: mpsc::Sender<PickerEvent>,
    outcomes: mpsc::Sender<GeocodeOutcome>,
}

impl LocationResolver {
    /// Start the resolver task. Must be called from within a Tokio
    /// runtime.
    pub fn spawn(
        position: Arc<dyn PositionProvider>,
        geocoder: Arc<dyn ReverseGeocoder>,
        config: PickerConfig,
    ) -> PickerHandle {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(64);
        let (outcome_tx, outcome_rx) = mpsc::channel(8);

        let cache = match &config.cache_path {
            Some(path) => LastPositionCache::load_from(path.clone()),
            None => LastPositionCache::load(),
        };

        let resolver = Self {
            position,
            geocoder,
            cache,
            default_coordinate: config.default_coordinate,
            permission: PermissionState::Unknown,
            session: Session::idle(config.default_coordinate),
            epoch: 0,
            issued: 0,
            events: event_tx,
            outcomes: outcome_tx,
        };

        tokio::spawn(resolver.run(command_rx, outcome_rx, config.debounce_window));

        PickerHandle {
            commands: command_tx,
            events: event_rx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<PickerCommand>,
        mut outcomes: mpsc::Receiver<GeocodeOutcome>,
        window: Duration,
    ) {
        let mut debounce = Debounce::new(window);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command, &mut debounce).await,
                    None => break, // handle dropped
                },
                coordinate = debounce.settled() => {
                    self.start_geocode(coordinate);
                },
                Some(outcome) = outcomes.recv() => {
                    self.apply_geocode(outcome).await;
                },
            }
        }
    }

    async fn handle(&mut self, command: PickerCommand, debounce: &mut Debounce<Coordinate>) {
        match command {
            PickerCommand::Open => self.open().await,
            PickerCommand::Close => self.close(debounce).await,
            PickerCommand::RegionSettled(coordinate) => {
                self.region_settled(coordinate, debounce).await
            }
            PickerCommand::Confirm => self.confirm(debounce).await,
            PickerCommand::LocateDevice => self.locate_device().await,
            PickerCommand::AppForegrounded => self.recheck_permission().await,
        }
    }

    /// Become visible and begin the initial resolution. Requires
    /// permission; a denial keeps the picker hidden and surfaces the
    /// settings remediation.
    async fn open(&mut self) {
        if self.permission != PermissionState::Granted && !self.acquire_permission().await {
            return;
        }
        if self.session.visible {
            return;
        }

        let coordinate = match self.position.current_position().await {
            Ok(fix) => {
                self.cache.store(fix);
                fix
            }
            Err(e) => {
                let err = PickerError::PositionUnavailable(e.to_string());
                warn!(error = %err, "using fallback position");
                self.cache.last_known().unwrap_or(self.default_coordinate)
            }
        };

        self.session = Session {
            visible: true,
            coordinate,
            address: ResolvedAddress::default(),
            fetch_in_flight: true,
        };
        self.emit(PickerEvent::Opened {
            region: MapRegion::around(coordinate),
        })
        .await;
        self.emit(PickerEvent::Fetching(true)).await;
        self.start_geocode(coordinate);
    }

    /// Discard the session. Idempotent; late geocode responses for the
    /// old epoch are ignored.
    async fn close(&mut self, debounce: &mut Debounce<Coordinate>) {
        if !self.session.visible {
            return;
        }
        self.epoch += 1;
        debounce.cancel();
        self.session = Session::idle(self.default_coordinate);
        self.emit(PickerEvent::Closed).await;
    }

    async fn region_settled(&mut self, coordinate: Coordinate, debounce: &mut Debounce<Coordinate>) {
        if !self.session.visible {
            debug!("region settle ignored, picker not open");
            return;
        }
        self.session.coordinate = coordinate;
        if !self.session.fetch_in_flight {
            self.session.fetch_in_flight = true;
            self.emit(PickerEvent::Fetching(true)).await;
        }
        debounce.schedule(coordinate);
    }

    /// Hand the current coordinate/address pair to the caller and end
    /// the session. No-op while a fetch is in flight, since the
    /// displayed address could be stale.
    async fn confirm(&mut self, debounce: &mut Debounce<Coordinate>) {
        if !self.session.visible {
            return;
        }
        if self.session.fetch_in_flight {
            debug!("confirm ignored while a fetch is in flight");
            return;
        }
        let confirmed = ConfirmedLocation::new(self.session.coordinate, &self.session.address);
        self.emit(PickerEvent::Confirmed(confirmed)).await;
        self.close(debounce).await;
    }

    /// Recenter on the device position. Runs outside the debounce path;
    /// the focal coordinate only changes once the map surface reports
    /// the follow-up settle.
    async fn locate_device(&mut self) {
        if !self.session.visible {
            return;
        }
        match self.position.current_position().await {
            Ok(fix) => {
                self.cache.store(fix);
                self.emit(PickerEvent::Recentered {
                    region: MapRegion::around(fix),
                })
                .await;
            }
            Err(e) => {
                let err = PickerError::PositionUnavailable(e.to_string());
                warn!(error = %err, "keeping previous center");
            }
        }
    }

    async fn recheck_permission(&mut self) {
        self.acquire_permission().await;
    }

    /// Ask the position provider for permission, updating state and
    /// surfacing the remediation prompt on denial.
    async fn acquire_permission(&mut self) -> bool {
        match self.position.request_permission().await {
            Permission::Granted => {
                self.permission = PermissionState::Granted;
                true
            }
            Permission::Denied => {
                self.permission = PermissionState::Denied;
                warn!(error = %PickerError::PermissionDenied, "picker stays hidden");
                self.emit(PickerEvent::PermissionDenied {
                    remediation: Remediation::OpenSettings,
                })
                .await;
                false
            }
        }
    }

    /// Issue a reverse-geocode call for `coordinate`. The call runs as
    /// its own task; an earlier call still in flight is left running
    /// and its response will fail the newest-token check.
    fn start_geocode(&mut self, coordinate: Coordinate) {
        self.issued += 1;

        let token = self.issued;
        let epoch = self.epoch;
        let geocoder = Arc::clone(&self.geocoder);
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            let result = geocoder.reverse_geocode(coordinate).await;
            let _ = outcomes.send(GeocodeOutcome { epoch, token, result }).await;
        });
    }

    async fn apply_geocode(&mut self, outcome: GeocodeOutcome) {
        if outcome.epoch != self.epoch {
            debug!(token = outcome.token, "dropping geocode response from a closed session");
            return;
        }
        if outcome.token != self.issued {
            debug!(
                token = outcome.token,
                newest = self.issued,
                "dropping superseded geocode response"
            );
            return;
        }

        match outcome.result {
            Ok(results) => match format_address(&results) {
                Some(address) => {
                    self.session.address = address.clone();
                    self.emit(PickerEvent::AddressResolved(address)).await;
                }
                None => debug!("empty geocode result, keeping previous address"),
            },
            Err(e) => {
                let err = PickerError::GeocodeFailure(e.to_string());
                warn!(error = %err, "keeping previous address");
            }
        }

        if self.session.fetch_in_flight {
            self.session.fetch_in_flight = false;
            self.emit(PickerEvent::Fetching(false)).await;
        }
    }

    async fn emit(&self, event: PickerEvent) {
        if self.events.send(event).await.is_err() {
            debug!("event receiver dropped");
        }
    }
}
