/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Open visits are shown in yellow, closed ones in the default colour.
pub fn color_for_open(open: bool) -> &'static str {
    if open { YELLOW } else { RESET }
}
