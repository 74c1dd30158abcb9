/// Sequence number of a datagram, as generated by the send loop.
///
/// These are 64-bit and never wrap in practice, so plain integer ordering is used.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default, Hash)]
pub struct SeqNr(pub u64);

impl std::fmt::Display for SeqNr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for SeqNr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::ops::Add<u64> for SeqNr {
    type Output = SeqNr;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl std::ops::AddAssign<u64> for SeqNr {
    fn add_assign(&mut self, rhs: u64) {
        *self = *self + rhs;
    }
}

impl SeqNr {
    /// True if `self` is exactly the sequence number after `highest`.
    pub fn follows(&self, highest: SeqNr) -> bool {
        highest.0.checked_add(1) == Some(self.0)
    }
}
