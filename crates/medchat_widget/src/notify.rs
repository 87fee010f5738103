//! Floating, auto-dismissing notification banners.
//!
//! A banner enters, stays for [`NOTIFICATION_LIFETIME`], leaves, and is then
//! dropped by [`NotificationCenter::sweep`]. Banners stack independently.
//! There is no dismissal, deduplication or cap.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::format::escape_html;

/// Time a banner stays on screen before its exit animation starts.
pub const NOTIFICATION_LIFETIME: Duration = Duration::from_millis(5000);
pub const ENTER_DURATION: Duration = Duration::from_millis(300);
pub const EXIT_DURATION: Duration = Duration::from_millis(300);
/// Shade applied to the second gradient stop.
pub const GRADIENT_SHADE_PERCENT: i32 = 20;

/// Severity of a notification; selects the banner color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    /// Parse a kind name. Unknown names fall back to `Info`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "success" => NotificationKind::Success,
            "error" => NotificationKind::Error,
            "warning" => NotificationKind::Warning,
            _ => NotificationKind::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        }
    }

    pub fn color(&self) -> Rgb {
        match self {
            NotificationKind::Success => Rgb::from_hex(0x2ecc71),
            NotificationKind::Error => Rgb::from_hex(0xe74c3c),
            NotificationKind::Warning => Rgb::from_hex(0xf39c12),
            NotificationKind::Info => Rgb::from_hex(0x3498db),
        }
    }
}

impl From<&str> for NotificationKind {
    fn from(name: &str) -> Self {
        NotificationKind::from_name(name)
    }
}

/// 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xrrggbb`; bits above the low 24 are ignored.
    pub const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Shift every channel by `round(2.55 * percent)`, clamped to 0..=255.
///
/// Rounding is half-up, so `-25.5` becomes `-25`.
pub fn darken(color: Rgb, percent: i32) -> Rgb {
    let amount = (2.55 * f64::from(percent) + 0.5).floor() as i32;
    let shift = |c: u8| i32::from(c).saturating_add(amount).clamp(0, 255) as u8;
    Rgb::new(shift(color.r), shift(color.g), shift(color.b))
}

/// CSS background for a banner of `kind`.
pub fn banner_background(kind: NotificationKind) -> String {
    let base = kind.color();
    format!(
        "linear-gradient(135deg, {}, {})",
        base,
        darken(base, GRADIENT_SHADE_PERCENT)
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

/// Where a banner is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Visible,
    Leaving,
    Gone,
}

/// A notification that has been shown.
#[derive(Debug, Clone)]
pub struct Banner {
    pub id: u64,
    pub notification: Notification,
    pub shown_at: Instant,
}

impl Banner {
    pub fn phase_at(&self, now: Instant) -> Phase {
        let elapsed = now.saturating_duration_since(self.shown_at);
        if elapsed < ENTER_DURATION {
            Phase::Entering
        } else if elapsed < NOTIFICATION_LIFETIME {
            Phase::Visible
        } else if elapsed < NOTIFICATION_LIFETIME + EXIT_DURATION {
            Phase::Leaving
        } else {
            Phase::Gone
        }
    }

    /// HTML for this banner in `phase`.
    pub fn render(&self, phase: Phase) -> String {
        let kind = self.notification.kind;
        let state = match phase {
            Phase::Entering => " notification-entering",
            Phase::Leaving => " notification-leaving",
            Phase::Visible | Phase::Gone => "",
        };
        format!(
            "<div class=\"notification notification-{}{}\" style=\"background: {}\">{}</div>",
            kind.as_str(),
            state,
            banner_background(kind),
            escape_html(&self.notification.message)
        )
    }
}

/// Owns every banner currently on screen.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    banners: Vec<Banner>,
    next_id: u64,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a banner now. Returns its id.
    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        self.show_at(message, kind, Instant::now())
    }

    /// Banners that finished leaving by `now` are swept first.
    pub fn show_at(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        now: Instant,
    ) -> u64 {
        self.sweep(now);
        let id = self.next_id;
        self.next_id += 1;
        let message = message.into();
        log::debug!("notification #{} ({}): {}", id, kind.as_str(), message);
        self.banners.push(Banner {
            id,
            notification: Notification { message, kind },
            shown_at: now,
        });
        id
    }

    /// All banners not yet swept, oldest first.
    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    /// Banners still on screen at `now`.
    pub fn active_at(&self, now: Instant) -> impl Iterator<Item = &Banner> {
        self.banners
            .iter()
            .filter(move |b| b.phase_at(now) != Phase::Gone)
    }

    /// Drop banners whose exit animation has finished. Returns how many were removed.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.banners.len();
        self.banners.retain(|b| b.phase_at(now) != Phase::Gone);
        before - self.banners.len()
    }

    pub fn render_at(&self, now: Instant) -> String {
        self.active_at(now)
            .map(|b| b.render(b.phase_at(now)))
            .collect()
    }
}
