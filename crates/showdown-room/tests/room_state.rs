//! Integration tests for the room layer: a registry fed raw protocol
//! lines the way the session feeds it.

use showdown_room::{PlayerSlot, RoomConfig, RoomRegistry};

// =========================================================================
// Helpers
// =========================================================================

fn feed(registry: &mut RoomRegistry, room_id: &str, lines: &[&str]) {
    for line in lines {
        assert!(registry.route(room_id, line), "room {room_id} should exist");
    }
}

// =========================================================================
// Lifecycle
// =========================================================================

#[test]
fn test_init_and_deinit() {
    let mut reg = RoomRegistry::new(RoomConfig::default());
    assert!(reg.is_empty());

    reg.init("lobby", "chat");
    assert!(reg.contains("lobby"));
    assert_eq!(reg.len(), 1);

    let room = reg.deinit("lobby").expect("room should be returned");
    assert_eq!(room.id(), "lobby");
    assert!(!reg.contains("lobby"));
    assert!(reg.deinit("lobby").is_none());
}

#[test]
fn test_lines_for_unknown_rooms_are_dropped() {
    let mut reg = RoomRegistry::default();
    assert!(!reg.route("nowhere", "|j|Ash"));
    assert!(reg.is_empty());
}

#[test]
fn test_reinit_resets_state() {
    let mut reg = RoomRegistry::default();
    reg.init("lobby", "chat");
    feed(&mut reg, "lobby", &["|j|Ash"]);
    reg.init("lobby", "chat");
    assert!(reg.get("lobby").unwrap().users().is_empty());
}

// =========================================================================
// Chat rooms
// =========================================================================

#[test]
fn test_chat_room_from_join_sequence() {
    let mut reg = RoomRegistry::default();
    reg.init("techcode", "chat");
    feed(
        &mut reg,
        "techcode",
        &[
            "|init|chat",
            "|title|Tech & Code",
            "|users|3,@Kris,+Zarel,Ash",
            "|c:|1700000000|Ash|hi all",
            "|l|Ash",
            "|n|+Zarel2|zarel",
        ],
    );

    let room = reg.get("techcode").unwrap();
    assert_eq!(room.title(), Some("Tech & Code"));
    assert!(!room.is_battle());
    let mut ids: Vec<_> = room.users().keys().cloned().collect();
    ids.sort();
    assert_eq!(ids, vec!["kris", "zarel2"]);
    assert_eq!(room.logs().count(), 6);
    assert_eq!(room.logs().next(), Some("|init|chat"));
}

// =========================================================================
// Battle rooms
// =========================================================================

#[test]
fn test_battle_room_tracks_metadata_and_outcome() {
    let mut reg = RoomRegistry::default();
    let id = "battle-gen7ou-12345";
    reg.init(id, "battle");
    feed(
        &mut reg,
        id,
        &[
            "|init|battle",
            "|title|Ash vs. Gary",
            "|j|Ash",
            "|j|Gary",
            "|player|p1|Ash|1",
            "|player|p2|Gary|2",
            "|tier|[Gen 7] OU",
            "|rated|",
            "|rule|Sleep Clause Mod: Limit one foe put to sleep",
            "|move|p1a: Pikachu|Thunderbolt|p2a: Eevee",
            "|win|Gary",
        ],
    );

    let room = reg.get(id).unwrap();
    let battle = room.battle_state().expect("should be a battle");
    assert_eq!(battle.tier(), Some("gen7ou"));
    assert!(battle.rated());
    assert_eq!(battle.rules().len(), 1);
    assert!(battle.ended());

    let outcome = battle.outcome().unwrap();
    assert_eq!(outcome.winner.name(), "Gary");
    assert_eq!(outcome.winner_slot, PlayerSlot::Second);
    assert_eq!(outcome.loser.as_ref().unwrap().name(), "Ash");
    assert_eq!(outcome.loser_slot, PlayerSlot::First);
}

#[test]
fn test_battle_log_capacity_follows_config() {
    let mut reg = RoomRegistry::new(RoomConfig::with_max_logs(3));
    reg.init("battle-x", "battle");
    feed(&mut reg, "battle-x", &["|a", "|b", "|c", "|d", "|e"]);
    let logs: Vec<_> = reg.get("battle-x").unwrap().logs().collect();
    assert_eq!(logs, vec!["|c", "|d", "|e"]);
}
