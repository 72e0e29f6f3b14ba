// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anstyle::{Color, RgbColor, Style};
use clap::builder::Styles;

const YELLOW: RgbColor = RgbColor(245, 207, 101);
const GREEN: RgbColor = RgbColor(72, 213, 151);
const RED: RgbColor = RgbColor(232, 104, 134);

fn bold(c: RgbColor) -> Style {
    Style::new().bold().fg_color(Some(Color::Rgb(c)))
}

/// Styling shared by the harness daemon and admin CLI.
pub fn cli_style() -> Styles {
    Styles::styled()
        .header(bold(YELLOW).underline())
        .literal(bold(GREEN))
        .invalid(bold(GREEN))
        .valid(bold(GREEN))
        .usage(bold(YELLOW))
        .error(bold(RED))
}
