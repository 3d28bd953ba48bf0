use crate::domain::{MemoryWindow, ResetKind};
use crate::ports::outbound::ExecutiveServices;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Status returned for an app the executive does not know.
pub const APP_NOT_FOUND: i32 = -5;

#[derive(Debug, Clone, Copy)]
enum AppSegment {
    Valid(MemoryWindow),
    /// Loaded, but the platform cannot report its addresses
    NoAddress,
}

/// Executive services backed by a fixed description of the platform.
#[derive(Debug)]
pub struct StaticExecutive {
    reset: ResetKind,
    cfe_segment: MemoryWindow,
    kernel_segment: Option<MemoryWindow>,
    apps: RwLock<HashMap<String, AppSegment>>,
}

impl StaticExecutive {
    pub fn new(reset: ResetKind, cfe_segment: MemoryWindow) -> Self {
        Self {
            reset,
            cfe_segment,
            kernel_segment: None,
            apps: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_kernel_segment(mut self, segment: MemoryWindow) -> Self {
        self.kernel_segment = Some(segment);
        self
    }

    pub fn with_app(self, name: &str, segment: MemoryWindow) -> Self {
        self.add_app(name, segment);
        self
    }

    /// Register or move an app's code segment.
    pub fn add_app(&self, name: &str, segment: MemoryWindow) {
        self.apps
            .write()
            .insert(name.to_string(), AppSegment::Valid(segment));
    }

    /// Register an app whose addresses the platform cannot report.
    pub fn add_app_without_address(&self, name: &str) {
        self.apps.write().insert(name.to_string(), AppSegment::NoAddress);
    }

    pub fn remove_app(&self, name: &str) {
        self.apps.write().remove(name);
    }
}

impl ExecutiveServices for StaticExecutive {
    fn reset_kind(&self) -> ResetKind {
        self.reset
    }

    fn cfe_text_segment(&self) -> MemoryWindow {
        self.cfe_segment
    }

    fn kernel_text_segment(&self) -> Option<MemoryWindow> {
        self.kernel_segment
    }

    fn app_code_segment(&self, app_name: &str) -> Result<Option<MemoryWindow>, i32> {
        match self.apps.read().get(app_name) {
            Some(AppSegment::Valid(window)) => Ok(Some(*window)),
            Some(AppSegment::NoAddress) => Ok(None),
            None => Err(APP_NOT_FOUND),
        }
    }
}
