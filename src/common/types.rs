//! Common types used throughout grid_coverage

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::Deserialize;

use crate::common::error::{CoverageError, CoverageResult};

/// Heading of the vehicle on the grid.
///
/// The discriminant order is the clockwise quarter-turn count from `Up`,
/// which the sensor footprint relies on for its rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Right,
        Orientation::Down,
        Orientation::Left,
    ];

    /// Clockwise quarter turns from `Up`
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// UP -> LEFT -> DOWN -> RIGHT -> UP
    pub fn rotated_left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// UP -> RIGHT -> DOWN -> LEFT -> UP
    pub fn rotated_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Unit step (d_row, d_col) of a forward move
    pub fn delta(self) -> (i32, i32) {
        match self {
            Orientation::Up => (-1, 0),
            Orientation::Right => (0, 1),
            Orientation::Down => (1, 0),
            Orientation::Left => (0, -1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Up => "UP",
            Orientation::Right => "RIGHT",
            Orientation::Down => "DOWN",
            Orientation::Left => "LEFT",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Ok(Orientation::Up),
            "RIGHT" => Ok(Orientation::Right),
            "DOWN" => Ok(Orientation::Down),
            "LEFT" => Ok(Orientation::Left),
            other => Err(CoverageError::InvalidParameter(format!(
                "unknown orientation '{}'",
                other
            ))),
        }
    }
}

/// Discrete vehicle command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    RotateLeft,
    RotateRight,
}

impl Action {
    /// Evaluation order used by every planner
    pub const ALL: [Action; 3] = [Action::Forward, Action::RotateLeft, Action::RotateRight];

    pub fn as_char(self) -> char {
        match self {
            Action::Forward => 'F',
            Action::RotateLeft => 'L',
            Action::RotateRight => 'R',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'F' => Some(Action::Forward),
            'L' => Some(Action::RotateLeft),
            'R' => Some(Action::RotateRight),
            _ => None,
        }
    }

    /// Parse an action string such as `"FFLRF"`. Whitespace is ignored.
    pub fn parse_sequence(s: &str) -> CoverageResult<Vec<Action>> {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| {
                Action::from_char(c).ok_or_else(|| {
                    CoverageError::InvalidParameter(format!("unknown action '{}'", c))
                })
            })
            .collect()
    }

    pub fn format_sequence(actions: &[Action]) -> String {
        actions.iter().map(|a| a.as_char()).join("")
    }

    pub fn is_rotation(self) -> bool {
        !matches!(self, Action::Forward)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Grid coordinate (row, col). Signed so that offsets past the border can be
/// represented before bounds filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub row: i32,
    pub col: i32,
}

impl GridCell {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(&self, d_row: i32, d_col: i32) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }

    /// 4-connected neighbours, in orientation order
    pub fn neighbors(&self) -> [(Orientation, GridCell); 4] {
        Orientation::ALL.map(|o| {
            let (dr, dc) = o.delta();
            (o, self.offset(dr, dc))
        })
    }
}

impl From<(i32, i32)> for GridCell {
    fn from(tuple: (i32, i32)) -> Self {
        Self::new(tuple.0, tuple.1)
    }
}

/// Vehicle pose on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pose {
    pub row: i32,
    pub col: i32,
    pub orientation: Orientation,
}

impl Pose {
    pub fn new(row: i32, col: i32, orientation: Orientation) -> Self {
        Self { row, col, orientation }
    }

    pub fn at(cell: GridCell, orientation: Orientation) -> Self {
        Self::new(cell.row, cell.col, orientation)
    }

    pub fn cell(&self) -> GridCell {
        GridCell::new(self.row, self.col)
    }

    /// Cell directly ahead
    pub fn ahead(&self) -> GridCell {
        let (dr, dc) = self.orientation.delta();
        self.cell().offset(dr, dc)
    }

    /// Kinematic result of an action, ignoring the grid
    pub fn after(&self, action: Action) -> Pose {
        match action {
            Action::Forward => Pose::at(self.ahead(), self.orientation),
            Action::RotateLeft => Pose::at(self.cell(), self.orientation.rotated_left()),
            Action::RotateRight => Pose::at(self.cell(), self.orientation.rotated_right()),
        }
    }

    pub fn with_orientation(&self, orientation: Orientation) -> Pose {
        Pose::at(self.cell(), orientation)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}", self.row, self.col, self.orientation)
    }
}

/// Status record reported by the vehicle service.
///
/// `pos_x` is the column and `pos_y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct VehicleStatus {
    pub pos_x: i32,
    pub pos_y: i32,
    pub rotation: Orientation,
}

impl From<VehicleStatus> for Pose {
    fn from(status: VehicleStatus) -> Self {
        Pose::new(status.pos_y, status.pos_x, status.rotation)
    }
}

impl From<Pose> for VehicleStatus {
    fn from(pose: Pose) -> Self {
        VehicleStatus {
            pos_x: pose.col,
            pos_y: pose.row,
            rotation: pose.orientation,
        }
    }
}

/// Answer of a forward move against the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Move accepted, with the pose reported afterwards
    Moved(Pose),
    /// Destination blocked or outside the world; pose unchanged
    Rejected,
}

/// Why a planner stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    /// Coverage target reached
    TargetReached,
    /// Iteration, frontier or step cap hit; the best plan found is returned
    BudgetExhausted,
    /// Online run made no progress for too long
    Stalled,
    /// Nothing left to expand
    SearchExhausted,
}

/// Result of a planning run
#[derive(Debug, Clone)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub final_pose: Pose,
    /// Fraction of free cells sensed by the end of the plan
    pub coverage: f64,
    /// Accumulated cost under the cost model
    pub cost: f64,
    pub status: PlanStatus,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn action_string(&self) -> String {
        Action::format_sequence(&self.actions)
    }

    pub fn reached_target(&self) -> bool {
        self.status == PlanStatus::TargetReached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_cycle() {
        assert_eq!(Orientation::Up.rotated_left(), Orientation::Left);
        assert_eq!(Orientation::Left.rotated_left(), Orientation::Down);
        assert_eq!(Orientation::Down.rotated_left(), Orientation::Right);
        assert_eq!(Orientation::Right.rotated_left(), Orientation::Up);
        for o in Orientation::ALL {
            assert_eq!(o.rotated_left().rotated_right(), o);
            assert_eq!(o.opposite().opposite(), o);
        }
    }

    #[test]
    fn test_pose_after_forward() {
        let pose = Pose::new(2, 2, Orientation::Right);
        assert_eq!(pose.after(Action::Forward), Pose::new(2, 3, Orientation::Right));
        assert_eq!(
            pose.after(Action::RotateRight),
            Pose::new(2, 2, Orientation::Down)
        );
    }

    #[test]
    fn test_action_string() {
        let actions = Action::parse_sequence("FL R f").unwrap();
        assert_eq!(
            actions,
            vec![
                Action::Forward,
                Action::RotateLeft,
                Action::RotateRight,
                Action::Forward
            ]
        );
        assert_eq!(Action::format_sequence(&actions), "FLRF");
        assert!(Action::parse_sequence("FX").is_err());
    }

    #[test]
    fn test_orientation_from_str() {
        assert_eq!("left".parse::<Orientation>().unwrap(), Orientation::Left);
        assert!("north".parse::<Orientation>().is_err());
    }

    #[test]
    fn test_status_axes() {
        let status = VehicleStatus {
            pos_x: 7,
            pos_y: 3,
            rotation: Orientation::Down,
        };
        let pose: Pose = status.into();
        assert_eq!(pose, Pose::new(3, 7, Orientation::Down));
        assert_eq!(VehicleStatus::from(pose), status);
    }

    #[test]
    fn test_status_from_toml() {
        let status: VehicleStatus = toml::from_str("pos_x = 3\npos_y = 1\nrotation = \"LEFT\"").unwrap();
        assert_eq!(Pose::from(status), Pose::new(1, 3, Orientation::Left));
        assert_eq!(Orientation::default(), Orientation::Up);
        assert!(toml::from_str::<VehicleStatus>("pos_x = 3\npos_y = 1\nrotation = \"NORTH\"").is_err());
    }
}
