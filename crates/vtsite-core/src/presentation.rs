//! # Presentation State
//!
//! The visitor-side behaviours, modelled as small state machines so the
//! server can render the right initial state and the page script only has
//! to follow along:
//! - theme (`Light ⇄ Dark`)
//! - loading screen (progress steps, minimum display, one bounded timeout)
//! - sidebar (`Closed ⇄ Open`, focus returns to the trigger on close)

use serde::Serialize;

// =============================================================================
// THEME
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    /// Persisted choice first, then the OS preference, then light.
    #[must_use]
    pub fn resolve(persisted: Option<&str>, prefers_dark: Option<bool>) -> Self {
        persisted
            .and_then(Self::parse)
            .or_else(|| prefers_dark.map(|dark| if dark { Self::Dark } else { Self::Light }))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

// =============================================================================
// LOADING SCREEN
// =============================================================================

/// One progress step, reached `at_ms` after the screen appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadingStep {
    pub label: &'static str,
    pub percent: u8,
    pub at_ms: u64,
}

const STANDARD_STEPS: [LoadingStep; 4] = [
    LoadingStep { label: "Connecting", percent: 10, at_ms: 0 },
    LoadingStep { label: "Loading assets", percent: 40, at_ms: 300 },
    LoadingStep { label: "Warming up the mic", percent: 75, at_ms: 700 },
    LoadingStep { label: "Ready", percent: 100, at_ms: 1100 },
];

/// Loading screen schedule.
///
/// The screen completes once the page has loaded AND `min_display_ms` has
/// passed, or unconditionally at `timeout_ms`. There is exactly one timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadingScreen {
    pub steps: &'static [LoadingStep],
    pub min_display_ms: u64,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LoadingState {
    Showing { step: usize, percent: u8 },
    Done,
}

impl Default for LoadingScreen {
    fn default() -> Self {
        Self {
            steps: &STANDARD_STEPS,
            min_display_ms: 1200,
            timeout_ms: 5000,
        }
    }
}

impl LoadingScreen {
    /// State `elapsed_ms` after the screen appeared.
    #[must_use]
    pub fn state_at(&self, elapsed_ms: u64, loaded: bool) -> LoadingState {
        if elapsed_ms >= self.timeout_ms || (loaded && elapsed_ms >= self.min_display_ms) {
            return LoadingState::Done;
        }
        let step = self
            .steps
            .iter()
            .rposition(|s| s.at_ms <= elapsed_ms)
            .unwrap_or(0);
        LoadingState::Showing {
            step,
            percent: self.steps.get(step).map(|s| s.percent).unwrap_or(0),
        }
    }
}

// =============================================================================
// SIDEBAR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Sidebar {
    #[default]
    Closed,
    /// Open; focus goes back to `return_focus` (an element id) on close.
    Open { return_focus: String },
}

impl Sidebar {
    #[must_use]
    pub fn open(self, trigger: &str) -> Self {
        match self {
            Self::Closed => Self::Open {
                return_focus: trigger.to_string(),
            },
            open @ Self::Open { .. } => open,
        }
    }

    /// Close, returning the element that should get focus back.
    #[must_use]
    pub fn close(self) -> (Self, Option<String>) {
        match self {
            Self::Closed => (Self::Closed, None),
            Self::Open { return_focus } => (Self::Closed, Some(return_focus)),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}
