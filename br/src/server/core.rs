//! CoordinationServer - the single dispatch loop
//!
//! Every event funnels through one bounded inbound queue and is applied here
//! by one thread, one message at a time. A message's effects, including the
//! notifications it pushes to screens, finish before the next message is
//! dequeued.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use eyre::{Context, Result};
use tracing::{debug, error, info, warn};

use super::config::ServerConfig;
use super::error::ServerError;
use super::handle::ServerHandle;
use super::messages::{Flight, Message, MessageKind, Origin, ScreenLink};
use super::picker::{Picker, RandomPicker};
use super::topology::Topology;
use crate::domain::{Balloon, BalloonId, Direction, Screen, ScreenId};
use crate::sync::{BoundedBlockingQueue, SyncError};

/// Authoritative owner of the ring and the balloon table
pub struct CoordinationServer {
    config: ServerConfig,
    inbound: Arc<BoundedBlockingQueue<Message>>,
    topology: Arc<Topology>,
    picker: Box<dyn Picker>,
    next_screen: ScreenId,
    next_balloon: BalloonId,
}

impl CoordinationServer {
    /// Create a server whose random choices come from `picker`
    pub fn new(config: ServerConfig, picker: Box<dyn Picker>) -> Result<Self, ServerError> {
        debug!(?config, "CoordinationServer::new: called");
        if config.outbound_capacity == 0 {
            return Err(SyncError::ZeroCapacity.into());
        }
        let inbound = Arc::new(BoundedBlockingQueue::new(config.queue_capacity)?);
        Ok(Self {
            config,
            inbound,
            topology: Arc::new(Topology::new()),
            picker,
            next_screen: ScreenId(0),
            next_balloon: BalloonId(0),
        })
    }

    /// Create a server with a random picker seeded from the config
    pub fn with_config(config: ServerConfig) -> Result<Self, ServerError> {
        let picker = RandomPicker::new(config.seed);
        Self::new(config, Box::new(picker))
    }

    /// Handle for producers and status readers
    pub fn handle(&self) -> ServerHandle {
        ServerHandle::new(self.inbound.clone(), self.topology.clone())
    }

    /// Run the dispatch loop on a dedicated thread
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("dispatch".to_string())
            .spawn(move || self.run())
            .context("Failed to spawn dispatch thread")
    }

    /// Dequeue and apply messages until a shutdown message arrives
    pub fn run(mut self) {
        info!("CoordinationServer started");
        loop {
            let message = self.inbound.dequeue();
            if let ControlFlow::Break(reason) = self.dispatch(message) {
                info!(%reason, "CoordinationServer stopping");
                break;
            }
        }
        info!(metrics = ?self.handle().metrics(), "CoordinationServer stopped");
    }

    /// Apply one message to the ring and balloon table
    pub fn dispatch(&mut self, message: Message) -> ControlFlow<String> {
        let Message { sender, kind } = message;
        debug!(kind = kind.name(), ?sender, "dispatch: called");
        self.topology.metrics.lock().messages_received += 1;

        match kind {
            MessageKind::Connected(link) => self.on_connected(link),
            MessageKind::Disconnected(screen) => self.on_disconnected(screen),
            MessageKind::ChangeScreen(flight) => self.on_change_screen(sender, flight),
            MessageKind::NewBalloon(flight) => self.on_new_balloon(flight),
            MessageKind::PopBalloon(balloon) => self.on_pop_balloon(balloon),
            MessageKind::Shutdown { reason } => return ControlFlow::Break(reason),
        }

        self.refresh_metrics();
        ControlFlow::Continue(())
    }

    fn on_connected(&mut self, link: Box<dyn ScreenLink>) {
        let id = self.allocate_screen();
        let peer = link.peer();
        let screen = match Screen::new(id, peer.as_str(), self.config.outbound_capacity) {
            Ok(screen) => screen,
            Err(e) => {
                error!(%id, %peer, error = %e, "Failed to create screen");
                return;
            }
        };

        if let Err(e) = self.topology.ring.lock().insert(screen.clone()) {
            warn!(%id, error = %e, "Screen not added to ring");
            return;
        }
        if let Err(e) = link.attach(&screen, self.handle()) {
            error!(%id, %peer, error = %e, "Failed to attach screen link");
            self.topology.ring.lock().remove(id);
            screen.deliver(Message::shutdown("attach failed").sent_by(Origin::Server));
            return;
        }
        info!(%id, %peer, "Screen joined the ring");

        let count = self.config.balloons_per_screen;
        for index in 0..count {
            let balloon = self.allocate_balloon();
            let direction = if balloon.is_even() { Direction::Left } else { Direction::Right };
            let flight = Flight {
                balloon,
                direction,
                y: ServerConfig::spread_y(index, count),
                velocity: direction.entry_velocity(self.config.balloon_velocity),
            };
            self.topology.balloons.lock().insert(balloon, Balloon::new(balloon, id));
            self.forward(&screen, Message::new_balloon(flight));
        }

        if self.config.adopt_orphans {
            self.adopt_orphans(&screen);
        }
    }

    /// Give every orphaned balloon to `screen`
    fn adopt_orphans(&mut self, screen: &Screen) {
        let orphans: Vec<BalloonId> = {
            let mut balloons = self.topology.balloons.lock();
            balloons
                .values_mut()
                .filter(|b| b.is_orphan())
                .map(|b| {
                    b.owner = Some(screen.id());
                    b.id
                })
                .collect()
        };
        if !orphans.is_empty() {
            info!(screen = %screen.id(), count = orphans.len(), "Adopting orphaned balloons");
        }
        for balloon in orphans {
            let flight = self.reentry(balloon, Direction::Left);
            self.forward(screen, Message::new_balloon(flight));
        }
    }

    fn on_disconnected(&mut self, id: ScreenId) {
        let (screen, neighbors) = {
            let ring = self.topology.ring.lock();
            let Some(screen) = ring.get(id).cloned() else {
                debug!(%id, "on_disconnected: screen already gone");
                return;
            };
            let neighbors = if ring.len() > 1 {
                ring.predecessor(id).cloned().zip(ring.successor(id).cloned())
            } else {
                None
            };
            (screen, neighbors)
        };

        let owned: Vec<BalloonId> = {
            let balloons = self.topology.balloons.lock();
            let mut owned: Vec<_> = balloons.values().filter(|b| b.is_owned_by(id)).map(|b| b.id).collect();
            owned.sort();
            owned
        };

        match neighbors {
            None => {
                let mut balloons = self.topology.balloons.lock();
                for balloon in &owned {
                    if let Some(record) = balloons.get_mut(balloon) {
                        record.owner = None;
                    }
                }
                info!(%id, count = owned.len(), "Last screen left, balloons orphaned");
            }
            Some((predecessor, successor)) => {
                for balloon in owned {
                    // toward the successor the balloon enters from its left edge
                    let (target, entry) = if self.picker.pick(2) == 1 {
                        (&successor, Direction::Left)
                    } else {
                        (&predecessor, Direction::Right)
                    };
                    if let Some(record) = self.topology.balloons.lock().get_mut(&balloon) {
                        record.owner = Some(target.id());
                    }
                    let flight = self.reentry(balloon, entry);
                    debug!(%balloon, from = %id, to = %target.id(), "on_disconnected: redistributing");
                    self.forward(target, Message::new_balloon(flight));
                }
            }
        }

        screen.deliver(Message::shutdown("screen disconnected").sent_by(Origin::Server));
        self.topology.ring.lock().remove(id);
        info!(%id, "Screen left the ring");
    }

    fn on_change_screen(&mut self, sender: Origin, flight: Flight) {
        let origin = sender.screen().or_else(|| {
            self.topology
                .balloons
                .lock()
                .get(&flight.balloon)
                .and_then(|b| b.owner)
        });
        let Some(origin) = origin else {
            debug!(balloon = %flight.balloon, "on_change_screen: no origin screen");
            self.drop_message();
            return;
        };

        let target = {
            let ring = self.topology.ring.lock();
            match flight.direction {
                Direction::Left => ring.predecessor(origin).cloned(),
                Direction::Right => ring.successor(origin).cloned(),
                Direction::Unspecified => None,
            }
        };
        let Some(target) = target else {
            debug!(balloon = %flight.balloon, %origin, direction = %flight.direction, "on_change_screen: no target");
            self.drop_message();
            return;
        };

        let previous = self
            .topology
            .balloons
            .lock()
            .insert(flight.balloon, Balloon::new(flight.balloon, target.id()));
        if previous.is_none() {
            warn!(balloon = %flight.balloon, %origin, "Untracked balloon changed screen, adopting");
            self.reserve_balloon(flight.balloon);
        }

        let forwarded = Flight {
            direction: flight.direction.flipped(),
            ..flight
        };
        debug!(balloon = %flight.balloon, from = %origin, to = %target.id(), "on_change_screen: handing off");
        self.forward(&target, Message::new_balloon(forwarded));
    }

    fn on_new_balloon(&mut self, flight: Flight) {
        let orphan = match self.topology.balloons.lock().get(&flight.balloon) {
            Some(balloon) if !balloon.is_orphan() => {
                debug!(balloon = %flight.balloon, "on_new_balloon: already owned");
                return;
            }
            Some(_) => true,
            None => false,
        };

        let target = {
            let ring = self.topology.ring.lock();
            if ring.is_empty() {
                None
            } else {
                let index = self.picker.pick(ring.len());
                ring.at(index).cloned()
            }
        };
        let Some(target) = target else {
            debug!(balloon = %flight.balloon, "on_new_balloon: no screens, dropping");
            self.drop_message();
            return;
        };

        if orphan {
            info!(balloon = %flight.balloon, screen = %target.id(), "Orphaned balloon reassigned");
        }
        self.reserve_balloon(flight.balloon);
        self.topology
            .balloons
            .lock()
            .insert(flight.balloon, Balloon::new(flight.balloon, target.id()));
        self.forward(&target, Message::new_balloon(flight));
    }

    fn on_pop_balloon(&mut self, balloon: BalloonId) {
        let Some(removed) = self.topology.balloons.lock().remove(&balloon) else {
            debug!(%balloon, "on_pop_balloon: not tracked");
            return;
        };
        let owner = removed
            .owner
            .and_then(|owner| self.topology.ring.lock().get(owner).cloned());
        if let Some(owner) = owner {
            self.forward(&owner, Message::pop_balloon(balloon));
        }
    }

    /// Flight for a balloon re-entering through `entry` after losing its screen
    fn reentry(&self, balloon: BalloonId, entry: Direction) -> Flight {
        Flight {
            balloon,
            direction: entry,
            y: self.config.reset_y,
            velocity: entry.entry_velocity(self.config.balloon_velocity),
        }
    }

    /// Push a server-originated message to a screen; blocks while its queue is full
    fn forward(&self, screen: &Screen, message: Message) {
        screen.deliver(message.sent_by(Origin::Server));
        self.topology.metrics.lock().messages_forwarded += 1;
    }

    fn drop_message(&self) {
        self.topology.metrics.lock().messages_dropped += 1;
    }

    fn allocate_screen(&mut self) -> ScreenId {
        let id = self.next_screen;
        self.next_screen = id.next();
        id
    }

    fn allocate_balloon(&mut self) -> BalloonId {
        let id = self.next_balloon;
        self.next_balloon = id.next();
        id
    }

    /// Keep server-allocated ids clear of ids chosen by peers
    fn reserve_balloon(&mut self, id: BalloonId) {
        if id >= self.next_balloon {
            self.next_balloon = id.next();
        }
    }

    fn refresh_metrics(&self) {
        let screens = self.topology.ring.lock().len();
        let (balloons, orphans) = {
            let table = self.topology.balloons.lock();
            (table.len(), table.values().filter(|b| b.is_orphan()).count())
        };
        let mut metrics = self.topology.metrics.lock();
        metrics.screens = screens;
        metrics.balloons = balloons;
        metrics.orphans = orphans;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::picker::SequencePicker;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Link that records the screens it was attached to
    #[derive(Clone, Default)]
    struct RecordingLink {
        attached: Arc<Mutex<Vec<Screen>>>,
    }

    impl ScreenLink for RecordingLink {
        fn peer(&self) -> String {
            "recording".to_string()
        }

        fn attach(self: Box<Self>, screen: &Screen, _server: ServerHandle) -> Result<()> {
            self.attached.lock().push(screen.clone());
            Ok(())
        }
    }

    struct FailingLink;

    impl ScreenLink for FailingLink {
        fn peer(&self) -> String {
            "failing".to_string()
        }

        fn attach(self: Box<Self>, _screen: &Screen, _server: ServerHandle) -> Result<()> {
            Err(eyre::eyre!("socket gone"))
        }
    }

    fn server_with(config: ServerConfig, choices: Vec<usize>) -> CoordinationServer {
        CoordinationServer::new(config, Box::new(SequencePicker::new(choices))).unwrap()
    }

    /// Connect `n` screens, discarding their initial notifications
    fn connect_screens(server: &mut CoordinationServer, n: usize) -> Vec<Screen> {
        let link = RecordingLink::default();
        for _ in 0..n {
            assert!(server.dispatch(Message::connected(link.clone())).is_continue());
        }
        let screens = link.attached.lock().clone();
        for screen in &screens {
            while screen.outbound().try_dequeue().is_some() {}
        }
        screens
    }

    fn drain(screen: &Screen) -> Vec<Message> {
        let mut out = Vec::new();
        while let Some(message) = screen.outbound().try_dequeue() {
            out.push(message);
        }
        out
    }

    fn new_balloons(messages: &[Message]) -> Vec<Flight> {
        messages
            .iter()
            .filter_map(|m| match &m.kind {
                MessageKind::NewBalloon(flight) => Some(*flight),
                _ => None,
            })
            .collect()
    }

    fn flight(balloon: u64, direction: Direction) -> Flight {
        Flight {
            balloon: BalloonId(balloon),
            direction,
            y: 0.3,
            velocity: 0.25,
        }
    }

    #[test]
    fn test_connected_populates_new_screen() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let link = RecordingLink::default();
        server.dispatch(Message::connected(link.clone()));

        let screens = link.attached.lock().clone();
        assert_eq!(screens.len(), 1);
        let screen = &screens[0];

        let messages = drain(screen);
        let flights = new_balloons(&messages);
        assert_eq!(flights.len(), ServerConfig::default().balloons_per_screen);
        assert!(messages.iter().all(|m| m.sender == Origin::Server));
        for f in &flights {
            let expected = if f.balloon.is_even() { Direction::Left } else { Direction::Right };
            assert_eq!(f.direction, expected);
            assert_eq!(f.velocity > 0.0, f.balloon.is_even());
        }

        let handle = server.handle();
        assert_eq!(handle.ring(), vec![screen.id()]);
        for f in &flights {
            assert_eq!(handle.balloon(f.balloon).unwrap().owner, Some(screen.id()));
        }
    }

    #[test]
    fn test_failed_attach_leaves_ring_unchanged() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        assert!(server.dispatch(Message::connected(FailingLink)).is_continue());
        assert!(server.handle().ring().is_empty());
        assert!(server.handle().balloons().is_empty());
    }

    #[test]
    fn test_balloon_ids_are_monotonic_across_screens() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let link = RecordingLink::default();
        server.dispatch(Message::connected(link.clone()));
        server.dispatch(Message::connected(link.clone()));

        let screens = link.attached.lock().clone();
        let first: Vec<_> = new_balloons(&drain(&screens[0])).iter().map(|f| f.balloon).collect();
        let second: Vec<_> = new_balloons(&drain(&screens[1])).iter().map(|f| f.balloon).collect();
        assert!(first.iter().max() < second.iter().min());
        assert_ne!(screens[0].id(), screens[1].id());
    }

    #[test]
    fn test_disconnect_last_screen_orphans_balloons() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let screens = connect_screens(&mut server, 1);
        let id = screens[0].id();

        server.dispatch(Message::disconnected(id));

        let handle = server.handle();
        assert!(handle.ring().is_empty());
        let balloons = handle.balloons();
        assert_eq!(balloons.len(), 4);
        assert!(balloons.values().all(Balloon::is_orphan));
        assert_eq!(handle.metrics().orphans, 4);

        // only the writer stop notice went out
        let messages = drain(&screens[0]);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_shutdown());
    }

    #[test]
    fn test_disconnect_redistributes_to_adjacent_screens() {
        let config = ServerConfig {
            balloons_per_screen: 6,
            ..Default::default()
        };
        let mut server = server_with(config, vec![0, 1, 1, 0, 1, 0]);
        let screens = connect_screens(&mut server, 4);
        // ring: 0 1 2 3; screen 2's neighbors are 1 and 3
        let leaving = screens[2].id();

        server.dispatch(Message::disconnected(leaving));

        let handle = server.handle();
        assert_eq!(handle.ring().len(), 3);
        assert!(!handle.ring().contains(&leaving));

        let to_predecessor = new_balloons(&drain(&screens[1]));
        let to_successor = new_balloons(&drain(&screens[3]));
        assert!(drain(&screens[0]).is_empty());
        assert_eq!(to_predecessor.len() + to_successor.len(), 6);
        assert_eq!(to_predecessor.len(), 3);

        for f in &to_predecessor {
            assert_eq!(f.direction, Direction::Right);
            assert!(f.velocity < 0.0);
            assert_eq!(f.y, ServerConfig::default().reset_y);
            assert_eq!(handle.balloon(f.balloon).unwrap().owner, Some(screens[1].id()));
        }
        for f in &to_successor {
            assert_eq!(f.direction, Direction::Left);
            assert!(f.velocity > 0.0);
            assert_eq!(handle.balloon(f.balloon).unwrap().owner, Some(screens[3].id()));
        }
        assert!(handle.balloons().values().all(|b| b.owner != Some(leaving)));
    }

    #[test]
    fn test_disconnect_unknown_screen_is_noop() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        connect_screens(&mut server, 2);
        let before = server.handle().balloons();

        assert!(server.dispatch(Message::disconnected(ScreenId(99))).is_continue());
        assert_eq!(server.handle().balloons(), before);
        assert_eq!(server.handle().ring().len(), 2);
    }

    #[test]
    fn test_change_screen_right_hands_off_to_successor() {
        let config = ServerConfig {
            balloons_per_screen: 6,
            ..Default::default()
        };
        let mut server = server_with(config, vec![0]);
        let screens = connect_screens(&mut server, 3);
        // balloon 5 was created for the first screen
        let origin = screens[0].id();
        assert_eq!(server.handle().balloon(BalloonId(5)).unwrap().owner, Some(origin));

        server.dispatch(Message::change_screen(flight(5, Direction::Right)).sent_by(Origin::Screen(origin)));

        let handle = server.handle();
        assert_eq!(handle.balloon(BalloonId(5)).unwrap().owner, Some(screens[1].id()));
        let messages = drain(&screens[1]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Origin::Server);
        let forwarded = new_balloons(&messages);
        assert_eq!(forwarded, vec![Flight {
            direction: Direction::Left,
            ..flight(5, Direction::Right)
        }]);
    }

    #[test]
    fn test_change_screen_left_wraps_to_last_screen() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let screens = connect_screens(&mut server, 3);

        server.dispatch(Message::change_screen(flight(1, Direction::Left)).sent_by(Origin::Screen(screens[0].id())));

        assert_eq!(server.handle().balloon(BalloonId(1)).unwrap().owner, Some(screens[2].id()));
        let forwarded = new_balloons(&drain(&screens[2]));
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0].direction, Direction::Right);
    }

    #[test]
    fn test_change_screen_without_sender_uses_owner() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let screens = connect_screens(&mut server, 2);

        server.dispatch(Message::change_screen(flight(0, Direction::Right)));

        assert_eq!(server.handle().balloon(BalloonId(0)).unwrap().owner, Some(screens[1].id()));
    }

    #[test]
    fn test_change_screen_unspecified_direction_is_noop() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let screens = connect_screens(&mut server, 2);
        let before = server.handle().balloons();

        server.dispatch(
            Message::change_screen(flight(0, Direction::Unspecified)).sent_by(Origin::Screen(screens[0].id())),
        );

        assert_eq!(server.handle().balloons(), before);
        assert!(drain(&screens[0]).is_empty());
        assert!(drain(&screens[1]).is_empty());
        assert_eq!(server.handle().metrics().messages_dropped, 1);
    }

    #[test]
    fn test_change_screen_from_removed_screen_is_noop() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let screens = connect_screens(&mut server, 2);
        let before = server.handle().balloons();

        server.dispatch(Message::change_screen(flight(0, Direction::Right)).sent_by(Origin::Screen(ScreenId(42))));

        assert_eq!(server.handle().balloons(), before);
        assert!(drain(&screens[1]).is_empty());
    }

    #[test]
    fn test_new_balloon_assigns_picked_screen() {
        let mut server = server_with(ServerConfig::default(), vec![1]);
        let screens = connect_screens(&mut server, 3);

        server.dispatch(Message::new_balloon(flight(100, Direction::Left)));

        let handle = server.handle();
        assert_eq!(handle.balloon(BalloonId(100)).unwrap().owner, Some(screens[1].id()));
        assert_eq!(new_balloons(&drain(&screens[1])), vec![flight(100, Direction::Left)]);
    }

    #[test]
    fn test_new_balloon_duplicate_is_noop() {
        let mut server = server_with(ServerConfig::default(), vec![2]);
        let screens = connect_screens(&mut server, 3);
        let before = server.handle().balloons();

        server.dispatch(Message::new_balloon(flight(0, Direction::Left)));

        assert_eq!(server.handle().balloons(), before);
        for screen in &screens {
            assert!(drain(screen).is_empty());
        }
    }

    #[test]
    fn test_new_balloon_without_screens_is_dropped() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        server.dispatch(Message::new_balloon(flight(3, Direction::Left)));
        assert!(server.handle().balloons().is_empty());
        assert!(matches!(
            server.handle().balloon(BalloonId(3)),
            Err(ServerError::BalloonNotFound(BalloonId(3)))
        ));
    }

    #[test]
    fn test_peer_balloon_id_reserves_allocator() {
        let config = ServerConfig {
            balloons_per_screen: 2,
            ..Default::default()
        };
        let mut server = server_with(config, vec![0]);
        connect_screens(&mut server, 1);
        server.dispatch(Message::new_balloon(flight(50, Direction::Left)));

        let link = RecordingLink::default();
        server.dispatch(Message::connected(link.clone()));
        let screen = link.attached.lock()[0].clone();
        let ids: Vec<_> = new_balloons(&drain(&screen)).iter().map(|f| f.balloon).collect();
        assert_eq!(ids, vec![BalloonId(51), BalloonId(52)]);
    }

    #[test]
    fn test_pop_balloon_notifies_owner_once() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let screens = connect_screens(&mut server, 2);
        let owner = server.handle().balloon(BalloonId(4)).unwrap().owner;
        assert_eq!(owner, Some(screens[1].id()));

        server.dispatch(Message::pop_balloon(BalloonId(4)));

        assert!(server.handle().balloon(BalloonId(4)).is_err());
        let messages = drain(&screens[1]);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0].kind, MessageKind::PopBalloon(BalloonId(4))));
        assert!(drain(&screens[0]).is_empty());
    }

    #[test]
    fn test_pop_missing_balloon_changes_nothing() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let screens = connect_screens(&mut server, 1);
        let before: HashMap<_, _> = server.handle().balloons();

        server.dispatch(Message::pop_balloon(BalloonId(77)));

        assert_eq!(server.handle().balloons(), before);
        assert!(drain(&screens[0]).is_empty());
    }

    #[test]
    fn test_pop_orphan_sends_nothing() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let screens = connect_screens(&mut server, 1);
        server.dispatch(Message::disconnected(screens[0].id()));
        drain(&screens[0]);

        server.dispatch(Message::pop_balloon(BalloonId(0)));
        assert!(server.handle().balloon(BalloonId(0)).is_err());
        assert!(drain(&screens[0]).is_empty());
    }

    #[test]
    fn test_orphans_adopted_by_next_screen() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let first = connect_screens(&mut server, 1);
        server.dispatch(Message::disconnected(first[0].id()));

        let link = RecordingLink::default();
        server.dispatch(Message::connected(link.clone()));
        let screen = link.attached.lock()[0].clone();

        let flights = new_balloons(&drain(&screen));
        assert_eq!(flights.len(), 8);
        let handle = server.handle();
        assert_eq!(handle.metrics().orphans, 0);
        assert!(handle.balloons().values().all(|b| b.owner == Some(screen.id())));
    }

    #[test]
    fn test_orphans_stay_when_adoption_disabled() {
        let config = ServerConfig {
            adopt_orphans: false,
            ..Default::default()
        };
        let mut server = server_with(config, vec![0]);
        let first = connect_screens(&mut server, 1);
        server.dispatch(Message::disconnected(first[0].id()));
        connect_screens(&mut server, 1);

        assert_eq!(server.handle().metrics().orphans, 4);
    }

    #[test]
    fn test_new_balloon_reassigns_orphan() {
        let config = ServerConfig {
            adopt_orphans: false,
            ..Default::default()
        };
        let mut server = server_with(config, vec![0]);
        let first = connect_screens(&mut server, 1);
        server.dispatch(Message::disconnected(first[0].id()));
        let second = connect_screens(&mut server, 1);

        server.dispatch(Message::new_balloon(flight(0, Direction::Left)));

        let handle = server.handle();
        assert_eq!(handle.balloon(BalloonId(0)).unwrap().owner, Some(second[0].id()));
        assert_eq!(handle.metrics().orphans, 3);
        let flights = new_balloons(&drain(&second[0]));
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].balloon, BalloonId(0));
    }

    #[test]
    fn test_new_balloon_for_orphan_without_screens_stays_orphaned() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let first = connect_screens(&mut server, 1);
        server.dispatch(Message::disconnected(first[0].id()));

        server.dispatch(Message::new_balloon(flight(0, Direction::Left)));

        let handle = server.handle();
        assert!(handle.balloon(BalloonId(0)).unwrap().is_orphan());
        assert_eq!(handle.metrics().messages_dropped, 1);
    }

    #[test]
    fn test_shutdown_breaks_dispatch() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        let flow = server.dispatch(Message::shutdown("test"));
        assert_eq!(flow, ControlFlow::Break("test".to_string()));
    }

    #[test]
    fn test_run_stops_on_shutdown_after_draining_earlier_messages() {
        let server = server_with(ServerConfig::default(), vec![0]);
        let handle = server.handle();
        let link = RecordingLink::default();
        handle.connect(link.clone());
        handle.shutdown("done");
        handle.pop_balloon(BalloonId(0));

        let thread = server.spawn().unwrap();
        thread.join().unwrap();

        assert_eq!(handle.ring().len(), 1);
        // the pop after shutdown was never applied
        assert!(handle.balloon(BalloonId(0)).is_ok());
        assert_eq!(handle.pending(), 1);
    }

    #[test]
    fn test_metrics_track_dispatch() {
        let mut server = server_with(ServerConfig::default(), vec![0]);
        connect_screens(&mut server, 2);
        let metrics = server.handle().metrics();
        assert_eq!(metrics.messages_received, 2);
        assert_eq!(metrics.messages_forwarded, 8);
        assert_eq!(metrics.screens, 2);
        assert_eq!(metrics.balloons, 8);
    }
}
