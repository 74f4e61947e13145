//! Metatile behaviour codes, from the game's `metatile_behaviors.h`.

use std::borrow::Cow;

pub const MB_NORMAL: u8 = 0x00;
pub const MB_TALL_GRASS: u8 = 0x01;
pub const MB_LONG_GRASS: u8 = 0x02;
pub const MB_DEEP_WATER: u8 = 0x05;
pub const MB_SHORT_GRASS: u8 = 0x06;
pub const MB_CAVE: u8 = 0x07;
pub const MB_SAND_WALL: u8 = 0x0C;
pub const MB_WATERFALL: u8 = 0x11;
pub const MB_SURF: u8 = 0x25;
pub const MB_IMPASSABLE: u8 = 0x33;

static BEHAVIOR_NAMES: [&str; 0x34] = [
    "MB_NORMAL",
    "MB_TALL_GRASS",
    "MB_LONG_GRASS",
    "MB_PUDDLE",
    "MB_SAND",
    "MB_DEEP_WATER",
    "MB_SHORT_GRASS",
    "MB_CAVE",
    "MB_SPIN_RIGHT",
    "MB_SPIN_LEFT",
    "MB_SPIN_UP",
    "MB_SPIN_DOWN",
    "MB_SAND_WALL",
    "MB_CRACKED_FLOOR",
    "MB_SHOAL_CAVE_ENTRANCE",
    "MB_ICE",
    "MB_WALKWAY_OVER_WATER",
    "MB_WATERFALL",
    "MB_NO_RUNNING",
    "MB_BRIDGE_OVER_WATER",
    "MB_BRIDGE_OVER_OCEAN",
    "MB_IMPASSABLE_NORTH",
    "MB_IMPASSABLE_SOUTH",
    "MB_IMPASSABLE_WEST",
    "MB_IMPASSABLE_EAST",
    "MB_IMPASSABLE_NORTHEAST",
    "MB_IMPASSABLE_NORTHWEST",
    "MB_IMPASSABLE_SOUTHEAST",
    "MB_IMPASSABLE_SOUTHWEST",
    "MB_JUMP_NORTH",
    "MB_JUMP_SOUTH",
    "MB_JUMP_WEST",
    "MB_JUMP_EAST",
    "MB_JUMP_NORTHEAST",
    "MB_JUMP_NORTHWEST",
    "MB_JUMP_SOUTHEAST",
    "MB_JUMP_SOUTHWEST",
    "MB_SURF",
    "MB_SLIDE_ICE",
    "MB_DOOR",
    "MB_COUNTER",
    "MB_SECRET_BASE_WALL",
    "MB_SECRET_BASE_PC",
    "MB_SECRET_BASE_REGISTER",
    "MB_SECRET_BASE_DECORATION",
    "MB_SECRET_BASE_GLITTER_MAT",
    "MB_SECRET_BASE_JUMP_MAT",
    "MB_SECRET_BASE_SPIN_MAT",
    "MB_STAIRS_OUTSIDE",
    "MB_STAIRS",
    "MB_SECRET_BASE_BREAKABLE_DOOR",
    "MB_IMPASSABLE",
];

pub fn behavior_name(behavior: u8) -> Cow<'static, str> {
    match BEHAVIOR_NAMES.get(behavior as usize) {
        Some(name) => Cow::Borrowed(*name),
        None => Cow::Owned(format!("MB_UNKNOWN_{:02X}", behavior)),
    }
}

/// Whether the behaviour blocks walking. Water counts as blocking without Surf.
pub fn is_impassable(behavior: u8) -> bool {
    matches!(
        behavior,
        0x15..=0x1C | MB_IMPASSABLE | MB_SAND_WALL | MB_DEEP_WATER | MB_WATERFALL
    )
}

/// Nominal wild encounter rate in percent.
pub fn encounter_rate(behavior: u8) -> u8 {
    match behavior {
        MB_TALL_GRASS => 20,
        MB_LONG_GRASS => 25,
        MB_SHORT_GRASS | MB_CAVE => 10,
        MB_DEEP_WATER | MB_SURF => 5,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_known_and_unknown_codes() {
        assert_eq!(behavior_name(MB_NORMAL), "MB_NORMAL");
        assert_eq!(behavior_name(0x27), "MB_DOOR");
        assert_eq!(behavior_name(0x33), "MB_IMPASSABLE");
        assert_eq!(behavior_name(0x34), "MB_UNKNOWN_34");
        assert_eq!(behavior_name(0xAB), "MB_UNKNOWN_AB");
    }

    #[test]
    fn classifies_blocking_behaviours() {
        assert!(is_impassable(0x15));
        assert!(is_impassable(0x1C));
        assert!(is_impassable(MB_WATERFALL));
        assert!(!is_impassable(0x1D));
        assert!(!is_impassable(MB_TALL_GRASS));
    }

    #[test]
    fn grass_has_encounters() {
        assert_eq!(encounter_rate(MB_TALL_GRASS), 20);
        assert_eq!(encounter_rate(MB_SURF), 5);
        assert_eq!(encounter_rate(MB_NORMAL), 0);
    }
}
