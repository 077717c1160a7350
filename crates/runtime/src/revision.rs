/// Count of state mutations applied so far.
///
/// Observers record the revision they last synced to, which makes "did the
/// presenter see event N" checkable without timestamps.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

impl Revision {
    pub const ZERO: Revision = Revision(0);

    pub fn next(self) -> Self {
        Revision(self.0 + 1)
    }
}
