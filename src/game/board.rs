//! Board geometry constants and pure position arithmetic.

use super::model::Color;

pub const TOTAL_PATH_LENGTH: i32 = 52;
pub const HOME_STRETCH_LENGTH: i32 = 6;
pub const FINISH_START: i32 = 100;
/// Final resting position inside the home stretch (`FINISH_START + HOME_STRETCH_LENGTH - 1`).
pub const FINISH_POSITION: i32 = FINISH_START + HOME_STRETCH_LENGTH - 1;

pub const SAFE_CELLS: [i32; 8] = [1, 9, 14, 22, 27, 35, 40, 48];

/// The main-path cell a color's pieces enter the board on when leaving Home.
pub const fn start_cell(color: Color) -> i32 {
    match color {
        Color::Green => 1,
        Color::Red => 14,
        Color::Blue => 27,
        Color::Yellow => 40,
    }
}

/// The main-path cell a color's pieces must pass (or land on) before diverting
/// into their private home stretch on the next forward step.
pub const fn pre_home_cell(color: Color) -> i32 {
    match color {
        Color::Green => 51,
        Color::Red => 12,
        Color::Blue => 25,
        Color::Yellow => 38,
    }
}

pub fn is_safe_cell(position: i32) -> bool {
    SAFE_CELLS.contains(&position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_cells_contains_every_start_cell() {
        for color in [Color::Red, Color::Green, Color::Blue, Color::Yellow] {
            assert!(
                is_safe_cell(start_cell(color)),
                "{color:?} start cell must be safe"
            );
        }
    }

    #[test]
    fn finish_position_matches_spec_constant() {
        assert_eq!(FINISH_POSITION, 105);
    }
}
