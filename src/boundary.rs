/// Describes the assumed state of every cell outside the field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryPolicy {
    /// Cells beyond the bounds are always dead.
    #[default]
    Dead,
    /// Cells beyond the bounds are always alive.
    Alive,
}

impl BoundaryPolicy {
    pub fn is_alive(self) -> bool {
        self == BoundaryPolicy::Alive
    }
}
