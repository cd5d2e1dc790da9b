//! Student roster interface.
//!
//! The roster is owned by another part of the application; this context only
//! reads names from it for display.

use serde::{Deserialize, Serialize};

use super::ids::StudentId;

/// A student as known to the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Student identifier.
    pub id: StudentId,
    /// First name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Class (e.g. `CM2`).
    pub class: String,
}

/// Read access to the student roster.
pub trait StudentDirectory {
    /// Looks up a student by id.
    fn find_student(&self, student_id: &StudentId) -> Option<StudentRecord>;
}

impl StudentDirectory for [StudentRecord] {
    fn find_student(&self, student_id: &StudentId) -> Option<StudentRecord> {
        self.iter().find(|s| &s.id == student_id).cloned()
    }
}

impl StudentDirectory for Vec<StudentRecord> {
    fn find_student(&self, student_id: &StudentId) -> Option<StudentRecord> {
        self.as_slice().find_student(student_id)
    }
}
