//! Gym check-in extension: roster, fuzzy name resolution and the
//! `check_in_mat` tool that pauses for human confirmation.

pub mod check_in_tool;
pub mod fuzzy;
pub mod roster;

pub use check_in_tool::{CheckInDetails, CheckInMatTool, CHECK_IN_MAT_TOOL_ID};
pub use roster::{
    Belt, CheckInError, CheckInReceipt, ClassTag, GymClass, Instructor, Member, Roster, RosterData,
};
