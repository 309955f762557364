use chrono::{SubsecRound, Utc};

use crate::{PinError, Result, Rgba, Timestamp};

/// Current UTC time truncated to whole seconds, the precision notes are stored at.
pub fn utc_now() -> Timestamp {
    Utc::now().trunc_subsecs(0)
}

// Helper method for parsing a float argument of an interactive command
pub fn parse_number(value: &str, name: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| PinError::InvalidFormat {
            message: format!("{} must be a number, got '{}'", name, value),
        })
}

// Helper method for parsing `r g b [a]` channel arguments
pub fn parse_color(channels: &[String]) -> Result<Rgba> {
    if channels.len() != 3 && channels.len() != 4 {
        return Err(PinError::InvalidFormat {
            message: format!("expected 3 or 4 color channels, got {}", channels.len()),
        });
    }

    let mut rgba = [255u8; 4];
    for (slot, value) in rgba.iter_mut().zip(channels) {
        *slot = value.trim().parse::<u8>().map_err(|_| PinError::InvalidFormat {
            message: format!("color channel must be 0-255, got '{}'", value),
        })?;
    }
    Ok(Rgba(rgba))
}

/// First line of a note's text, shortened to `max_len` characters.
pub fn text_preview(text: &str, max_len: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() > max_len {
        let cut: String = first_line.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else if text.lines().count() > 1 {
        format!("{}...", first_line)
    } else {
        first_line.to_string()
    }
}
