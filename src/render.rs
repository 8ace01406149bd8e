//! The layout engine: turns a snapshot of bar state plus a terminal width into
//! a single rendered line.
//!
//! Rendering is a pure function of its inputs. The caller samples the terminal
//! width and takes the state snapshot; nothing in this module touches the
//! terminal or the clock, which is what makes the width and padding properties
//! directly testable.

use crate::bar::ProgressBar;
use lipgloss::blending::blend_1d;
use lipgloss::{Color, Style};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// A point-in-time copy of one bar's mutable state.
///
/// Fields are read independently from the live instance, so a snapshot may
/// combine a title and a count stored microseconds apart. That is accepted:
/// the result is display-only and superseded by the next render.
pub(crate) struct Snapshot {
    pub title: String,
    pub current: u64,
    pub total: u64,
    pub elapsed: Duration,
}

/// Display width of `s` after stripping ANSI style sequences.
///
/// Style codes must not count toward layout, otherwise a styled title would
/// shrink the drawable bar by the length of its escape sequences.
pub(crate) fn visible_width(s: &str) -> usize {
    strip_ansi_escapes::strip_str(s).as_str().width()
}

/// Renders one progress line.
///
/// Returns an empty string when `total` is zero (the bar is a no-op). The
/// result's visible width never exceeds the effective width, even on terminals
/// too narrow to fit the decorations.
pub(crate) fn render_line(cfg: &ProgressBar, snap: &Snapshot, terminal_width: usize) -> String {
    if snap.total == 0 {
        return String::new();
    }

    let width = if cfg.max_width > 0 {
        terminal_width.min(cfg.max_width)
    } else {
        terminal_width
    };

    // Defensive clamp: `add` clamps total on completion, but a torn read
    // during that window must still never render past 100%.
    let current = snap.current.min(snap.total);

    let mut before = String::new();
    if cfg.show_title {
        before.push_str(&cfg.title_style.render(&snap.title));
        before.push(' ');
    }
    if cfg.show_count {
        let pad = (snap.total.ilog10() + 1) as usize;
        let subtle = Style::new().foreground(Color::from("245"));
        let bright = Style::new().foreground(Color::from("15"));
        before.push_str(&subtle.render("["));
        before.push_str(&bright.render(&format!("{current:0pad$}")));
        before.push_str(&subtle.render("/"));
        before.push_str(&bright.render(&snap.total.to_string()));
        before.push_str(&subtle.render("]"));
        before.push(' ');
    }

    let mut after = String::from(" ");
    if cfg.show_percentage {
        let fraction = current as f64 / snap.total as f64;
        let percent = (fraction * 100.0).round() as u64;
        let style = Style::new().foreground(fade(fraction));
        after.push_str(&style.render(&format!("{percent:3}%")));
        after.push(' ');
    }
    if cfg.show_elapsed_time {
        after.push_str("| ");
        after.push_str(&format_duration(round_duration(
            snap.elapsed,
            cfg.elapsed_rounding,
        )));
    }

    let bar_max = width.saturating_sub(visible_width(&before) + visible_width(&after) + 1);
    // u128 keeps the multiply from overflowing for very large totals.
    let filled = ((current as u128 * bar_max as u128) / snap.total as u128) as usize;
    let filled = filled.min(bar_max);

    let mut bar = String::new();
    if filled > 0 {
        let mut run = cfg.bar_character.repeat(filled);
        run.push_str(&cfg.last_character);
        bar.push_str(&cfg.bar_style.render(&run));
    }
    if bar_max > filled {
        bar.push_str(&cfg.bar_filler.repeat(bar_max - filled));
    }

    format!("{before}{bar}{after}")
}

/// Color for the percentage text, linearly interpolated from red at 0% to
/// green at 100%.
fn fade(fraction: f64) -> Color {
    let ramp = blend_1d(101, vec![Color::from("#FF0000"), Color::from("#00FF00")]);
    let idx = (fraction.clamp(0.0, 1.0) * 100.0).round() as usize;
    ramp[idx.min(ramp.len() - 1)].clone()
}

/// Rounds `d` to the nearest multiple of `granularity`. Zero granularity
/// leaves the duration untouched.
pub(crate) fn round_duration(d: Duration, granularity: Duration) -> Duration {
    if granularity.is_zero() {
        return d;
    }
    let g = granularity.as_nanos();
    let n = d.as_nanos();
    let rounded = ((n + g / 2) / g) * g;
    Duration::new(
        (rounded / 1_000_000_000) as u64,
        (rounded % 1_000_000_000) as u32,
    )
}

/// Formats a duration as `MM:SS`, growing to `HH:MM:SS` past an hour.
pub(crate) fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(current: u64, total: u64) -> Snapshot {
        Snapshot {
            title: "Testing".to_string(),
            current,
            total,
            elapsed: Duration::from_secs(63),
        }
    }

    #[test]
    fn zero_total_renders_nothing() {
        let cfg = ProgressBar::new();
        assert_eq!(render_line(&cfg, &snap(0, 0), 80), "");
    }

    #[test]
    fn visible_width_never_exceeds_effective_width() {
        let cfg = ProgressBar::new().with_max_width(60);
        for total in [1, 7, 100, 12345] {
            for step in 0..=10 {
                let current = total * step / 10;
                let line = render_line(&cfg, &snap(current, total), 80);
                assert!(
                    visible_width(&line) <= 60,
                    "width {} exceeded 60 at {}/{}",
                    visible_width(&line),
                    current,
                    total
                );
            }
        }
    }

    #[test]
    fn narrow_terminal_does_not_panic() {
        let cfg = ProgressBar::new();
        for width in 0..20 {
            // The decorations alone may not fit; rendering must still succeed.
            let line = render_line(&cfg, &snap(5, 10), width);
            assert!(!line.is_empty());
        }
    }

    #[test]
    fn count_padding_is_stable_for_total_100() {
        let cfg = ProgressBar::new()
            .with_show_title(false)
            .with_show_percentage(false)
            .with_show_elapsed_time(false);
        for current in [1, 10, 100] {
            let line = render_line(&cfg, &snap(current, 100), 80);
            let plain = strip_ansi_escapes::strip_str(&line);
            let open = plain.find('[').unwrap();
            let slash = plain.find('/').unwrap();
            assert_eq!(slash - open - 1, 3, "count block not 3 digits: {plain}");
        }
    }

    #[test]
    fn filled_length_is_monotonic() {
        let cfg = ProgressBar::new().with_show_elapsed_time(false);
        let mut previous = 0;
        for current in 0..=50 {
            let line = render_line(&cfg, &snap(current, 50), 80);
            let plain = strip_ansi_escapes::strip_str(&line);
            let filled = plain.matches('█').count();
            assert!(filled >= previous, "filled shrank at {current}/50");
            previous = filled;
        }
    }

    #[test]
    fn overshoot_is_clamped_to_full_bar() {
        let cfg = ProgressBar::new().with_show_elapsed_time(false);
        let line = render_line(&cfg, &snap(120, 100), 80);
        let plain = strip_ansi_escapes::strip_str(&line);
        assert!(!plain.contains('░'), "overshoot left filler cells: {plain}");
        assert!(plain.contains("100%"));
    }

    #[test]
    fn full_bar_has_no_filler() {
        let cfg = ProgressBar::new().with_show_elapsed_time(false);
        let line = render_line(&cfg, &snap(10, 10), 80);
        let plain = strip_ansi_escapes::strip_str(&line);
        assert!(!plain.contains('░'));
        assert!(plain.contains("100%"));
    }

    #[test]
    fn empty_bar_is_all_filler() {
        let cfg = ProgressBar::new().with_show_elapsed_time(false);
        let line = render_line(&cfg, &snap(0, 10), 80);
        let plain = strip_ansi_escapes::strip_str(&line);
        assert!(!plain.contains('█'));
        assert!(plain.contains("0%"));
    }

    #[test]
    fn title_appears_when_shown() {
        let cfg = ProgressBar::new();
        let line = render_line(&cfg, &snap(3, 10), 80);
        assert!(strip_ansi_escapes::strip_str(&line).contains("Testing"));

        let cfg = cfg.with_show_title(false);
        let line = render_line(&cfg, &snap(3, 10), 80);
        assert!(!strip_ansi_escapes::strip_str(&line).contains("Testing"));
    }

    #[test]
    fn elapsed_time_is_rounded_and_formatted() {
        let cfg = ProgressBar::new();
        let line = render_line(&cfg, &snap(3, 10), 80);
        assert!(strip_ansi_escapes::strip_str(&line).contains("| 01:03"));
    }

    #[test]
    fn round_duration_rounds_to_granularity() {
        let second = Duration::from_secs(1);
        assert_eq!(
            round_duration(Duration::from_millis(1499), second),
            Duration::from_secs(1)
        );
        assert_eq!(
            round_duration(Duration::from_millis(1500), second),
            Duration::from_secs(2)
        );
        let d = Duration::from_millis(1234);
        assert_eq!(round_duration(d, Duration::ZERO), d);
    }

    #[test]
    fn format_duration_grows_past_an_hour() {
        assert_eq!(format_duration(Duration::from_secs(5)), "00:05");
        assert_eq!(format_duration(Duration::from_secs(65)), "01:05");
        assert_eq!(format_duration(Duration::from_secs(3725)), "01:02:05");
    }
}
