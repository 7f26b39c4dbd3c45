use crate::global_variables::*;

/// A named scalar monitored during the run and appended to a `.dat` column.
pub struct PostResult {
    pub name: &'static str,
    pub label: &'static str,
    pub value: Float,
}

impl PostResult {
    pub fn new(name: &'static str, label: &'static str, value: Float) -> Self {
        Self { name, label, value }
    }
}
