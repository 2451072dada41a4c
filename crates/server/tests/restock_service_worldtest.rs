//! Service-level worldtests: commands, strikes and settings against an
//! in-memory world backed by a scratch data directory.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use restock_core::{ItemStack, LocationKey};
use restock_server::config::CONFIG_FILE_NAME;
use restock_server::{CommandSender, RestockService, StrikeOutcome};
use restock_world::{ActorId, Container, ContainerKind, MemoryWorld, STATE_FILE_NAME};

const ALEX: ActorId = ActorId(1);
const SAM: ActorId = ActorId(2);

fn temp_dir(name: &str) -> PathBuf {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("restock_service_{name}_{timestamp}"))
}

fn chest_key() -> LocationKey {
    LocationKey::new("world", 10, 64, 10)
}

fn stocked_world() -> MemoryWorld {
    let mut world = MemoryWorld::new();
    let chest = world.place_container(chest_key(), ContainerKind::Chest);
    chest.set_item(0, Some(ItemStack::new("bread", 5)));
    chest.set_item(4, Some(ItemStack::new("arrow", 16)));
    world.place_solid(LocationKey::new("world", 11, 64, 10), "stone");
    world.spawn_actor(ALEX, "alex", "world", [10.0, 64.0, 12.0]);
    world.spawn_actor(SAM, "sam", "world", [500.0, 64.0, 500.0]);
    world
}

fn open(dir: &PathBuf) -> RestockService<MemoryWorld> {
    RestockService::open(dir, Arc::new(Mutex::new(stocked_world())))
}

fn inbox(service: &RestockService<MemoryWorld>, actor: ActorId) -> Vec<String> {
    service.world().lock().unwrap().take_inbox(actor)
}

#[test]
fn create_then_strike_registers_with_default_interval() {
    let dir = temp_dir("register");
    let service = open(&dir);
    let alex = CommandSender::Actor(ALEX);

    let out = service.handle_command(alex, "/restock create");
    assert_eq!(out.lines, ["Punch a container to register it for restocking."]);
    let again = service.handle_command(alex, "/restock create");
    assert!(again.lines[0].starts_with("You are already in container registration mode"));

    // Non-containers do not consume the pending mode.
    let stone = LocationKey::new("world", 11, 64, 10);
    assert_eq!(service.strike(ALEX, &stone, false), StrikeOutcome::Ignored);

    assert_eq!(
        service.strike(ALEX, &chest_key(), false),
        StrikeOutcome::Registered { captured: 2 }
    );
    assert_eq!(
        inbox(&service, ALEX),
        ["Container registered for restocking! Punch without sneaking to restock."]
    );

    let record = service.registry().get(&chest_key()).unwrap();
    assert_eq!((record.timer, record.restock_interval), (300, 300));
    assert!(dir.join(STATE_FILE_NAME).exists());

    let list = service.handle_command(CommandSender::Console, "restock list");
    assert_eq!(
        list.lines,
        ["Registered containers: 1", "world:10:64:10 (restocks in 300s)"]
    );
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn idle_strike_restocks_registered_container_only() {
    let dir = temp_dir("manual");
    let service = open(&dir);

    assert_eq!(service.strike(ALEX, &chest_key(), false), StrikeOutcome::Ignored);
    assert!(inbox(&service, ALEX).is_empty());

    service.handle_command(CommandSender::Actor(ALEX), "/restock create");
    service.strike(ALEX, &chest_key(), false);
    inbox(&service, ALEX);

    service
        .world()
        .lock()
        .unwrap()
        .container_at_mut(&chest_key())
        .unwrap()
        .clear();

    assert_eq!(
        service.strike(SAM, &chest_key(), false),
        StrikeOutcome::Restocked { filled: 2 }
    );
    assert_eq!(inbox(&service, SAM), ["Container restocked!"]);
    let world = service.world().lock().unwrap();
    let chest = world.container(&chest_key()).unwrap();
    assert_eq!(chest.get_item(4).map(|s| s.count), Some(16));
    drop(world);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn ctime_sets_interval_on_next_strike() {
    let dir = temp_dir("ctime");
    let service = open(&dir);
    let alex = CommandSender::Actor(ALEX);

    service.handle_command(alex, "/restock create");
    service.strike(ALEX, &chest_key(), false);

    let out = service.handle_command(alex, "/restock ctime 3");
    assert_eq!(
        out.lines,
        ["Punch a registered container to set its restock time to 3 seconds."]
    );
    assert_eq!(
        service.strike(ALEX, &chest_key(), false),
        StrikeOutcome::IntervalSet { seconds: 3 }
    );
    let record = service.registry().get(&chest_key()).unwrap();
    assert_eq!((record.timer, record.restock_interval), (3, 3));

    // Mode is consumed; the next strike restocks.
    assert!(matches!(
        service.strike(ALEX, &chest_key(), false),
        StrikeOutcome::Restocked { .. }
    ));

    // Arming ctime against an unregistered container reports and consumes.
    let other = LocationKey::new("world", 0, 64, 0);
    service
        .world()
        .lock()
        .unwrap()
        .place_container(other.clone(), ContainerKind::Dispenser);
    inbox(&service, ALEX);
    service.handle_command(alex, "/restock ctime 9");
    assert_eq!(service.strike(ALEX, &other, false), StrikeOutcome::Failed);
    assert_eq!(
        inbox(&service, ALEX),
        ["This container is not registered for restocking."]
    );
    assert_eq!(service.strike(ALEX, &other, false), StrikeOutcome::Ignored);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn console_cannot_use_strike_commands() {
    let dir = temp_dir("console");
    let service = open(&dir);
    for line in ["/restock create", "/restock ctime 5"] {
        let out = service.handle_command(CommandSender::Console, line);
        assert_eq!(out.lines, ["Only players can use this command."]);
    }
    let help = service.handle_command(CommandSender::Console, "/restock");
    assert_eq!(help.lines.len(), 7);
    let bad = service.handle_command(CommandSender::Console, "/restock time 0");
    assert_eq!(bad.lines, ["Time must be at least 1 second!"]);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn time_and_reload_update_settings() {
    let dir = temp_dir("settings");
    let service = open(&dir);

    let out = service.handle_command(CommandSender::Console, "/restock time 45");
    assert_eq!(out.lines, ["Default restock time set to 45 seconds!"]);
    assert_eq!(service.config().default_restock_seconds, 45);

    fs::write(
        dir.join(CONFIG_FILE_NAME),
        "default-restock-time = 12\nannounce-restock = true\nallow-player-registration = false\n",
    )
    .unwrap();
    let out = service.handle_command(CommandSender::Console, "/restock reload");
    assert_eq!(out.lines, ["Config reloaded!"]);
    let config = service.config();
    assert_eq!(config.default_restock_seconds, 12);
    assert!(config.announce_on_restock);
    assert!(!config.allow_self_registration);

    // Registration is now restricted to privileged actors.
    service.handle_command(CommandSender::Actor(ALEX), "/restock create");
    assert_eq!(service.strike(ALEX, &chest_key(), false), StrikeOutcome::Denied);
    assert_eq!(
        inbox(&service, ALEX),
        ["Container registration is disabled for players."]
    );
    service.handle_command(CommandSender::Actor(ALEX), "/restock create");
    assert_eq!(
        service.strike(ALEX, &chest_key(), true),
        StrikeOutcome::Registered { captured: 2 }
    );
    assert_eq!(service.registry().get(&chest_key()).unwrap().timer, 12);

    // Announcement now reaches the nearby actor but not the distant one.
    service.handle_command(CommandSender::Actor(ALEX), "/restock ctime 1");
    service.strike(ALEX, &chest_key(), false);
    inbox(&service, ALEX);
    let report = service.sweep();
    assert_eq!(report.restocked, [chest_key()]);
    assert_eq!(inbox(&service, ALEX), ["Container auto-restocked nearby."]);
    assert!(inbox(&service, SAM).is_empty());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn clear_and_shutdown_persist_state() {
    let dir = temp_dir("lifecycle");
    {
        let service = open(&dir);
        service.handle_command(CommandSender::Actor(ALEX), "/restock create");
        service.strike(ALEX, &chest_key(), false);
        service.start(Duration::from_millis(5)).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        // Replaces the fast scheduler; shutdown must still return promptly.
        service.start_default().unwrap();
        service.shutdown().unwrap();
    }

    let raw = fs::read_to_string(dir.join(STATE_FILE_NAME)).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(doc.get("world:10:64:10").is_some());

    let service = open(&dir);
    assert_eq!(service.registry().len(), 1);
    let out = service.handle_command(CommandSender::Console, "/restock clear");
    assert_eq!(out.lines, ["All registered containers cleared!"]);
    service.shutdown().unwrap();
    assert!(open(&dir).registry().is_empty());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn broken_container_is_dropped_by_sweep() {
    let dir = temp_dir("broken");
    let service = open(&dir);
    service.handle_command(CommandSender::Actor(ALEX), "/restock create");
    service.strike(ALEX, &chest_key(), false);
    service.handle_command(CommandSender::Actor(ALEX), "/restock ctime 1");
    service.strike(ALEX, &chest_key(), false);

    service.world().lock().unwrap().break_block(&chest_key());
    let report = service.sweep();
    assert_eq!(report.removed, [chest_key()]);
    assert!(service.registry().is_empty());
    fs::remove_dir_all(&dir).ok();
}
