use yui_core::Category;
use crate::Rejection;

/// Keeps one category from dominating consecutive topics.
#[derive(Debug, Clone, Copy)]
pub struct RotationGuard {
    k: usize,
}

impl RotationGuard {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    /// `recent` is in insertion order; only its last `k` entries count.
    pub fn check(&self, category: Category, recent: &[Category]) -> Result<(), Rejection> {
        let window = &recent[recent.len().saturating_sub(self.k)..];
        if window.contains(&category) {
            return Err(Rejection::Rotation(category));
        }
        Ok(())
    }
}
