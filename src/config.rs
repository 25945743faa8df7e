//! Per-instance settings

use crate::mask::Mask;


/// Settings for one [`Inotify`] instance
///
/// [`Inotify`]: crate::Inotify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Mask used when [`Inotify::add_watch`] is called without one.
    ///
    /// [`Inotify::add_watch`]: crate::Inotify::add_watch
    pub default_mask: Mask,
    /// Whether recursive watches descend into symlinked directories.
    pub follow_symlinks: bool,
}

impl Config {
    /// Sets the mask used when none is given
    pub fn default_mask(mut self, mask: Mask) -> Self {
        self.default_mask = mask;
        self
    }

    /// Sets whether recursive watches follow symlinks
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_mask: Mask::ALL_EVENTS,
            follow_symlinks: false,
        }
    }
}
