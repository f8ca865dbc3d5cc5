/// Inclusive range of heights to scan. Empty when `from > to`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScanWindow {
    pub from: u64,
    pub to: u64,
}

impl ScanWindow {
    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }
}

/// Tracks what the ingestion loop has scanned and reported so far.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScanCursor {
    last_scanned: u64,
    last_height: Option<u64>,
}

impl ScanCursor {
    /// Starts a cursor treating everything up to `last_scanned` as done.
    pub fn new(last_scanned: u64) -> Self {
        Self {
            last_scanned,
            last_height: None,
        }
    }

    pub fn last_scanned(&self) -> u64 {
        self.last_scanned
    }

    pub fn last_height(&self) -> Option<u64> {
        self.last_height
    }

    /// Records `height`, returning whether it differs from the last recorded one.
    pub fn observe_height(&mut self, height: u64) -> bool {
        if self.last_height == Some(height) {
            return false;
        }
        self.last_height = Some(height);
        true
    }

    /// The window between the last scanned height and `current`.
    pub fn window(&self, current: u64) -> ScanWindow {
        ScanWindow {
            from: self.last_scanned.saturating_add(1),
            to: current,
        }
    }

    /// Marks `window` as scanned. Empty windows leave the cursor where it is.
    pub fn advance(&mut self, window: ScanWindow) {
        if !window.is_empty() {
            self.last_scanned = window.to;
        }
    }
}
